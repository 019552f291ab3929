#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rulemaster::{ClientConfig, CompletionConfig};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ListRules,
    CreateRule,
    ApplyRule,
    Completion,
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub endpoint: Endpoint,
    pub query: HashMap<String, String>,
    pub body: Value,
    pub authorization: Option<String>,
}

#[derive(Default)]
struct Inner {
    requests: Vec<Recorded>,
    replies: HashMap<Endpoint, (u16, Value)>,
    delay: Option<Duration>,
}

/// 内存中的规则服务和补全服务
#[derive(Clone, Default)]
pub struct MockState {
    inner: Arc<Mutex<Inner>>,
}

impl MockState {
    pub fn new() -> Self {
        let state = Self::default();
        state.reply(Endpoint::ListRules, 200, json!([]));
        state.reply(Endpoint::CreateRule, 201, json!({}));
        state.reply(Endpoint::ApplyRule, 200, json!({"finalResponse": {}}));
        state.reply(Endpoint::Completion, 200, completion_body("{}"));
        state
    }

    pub fn reply(&self, endpoint: Endpoint, status: u16, body: Value) {
        self.inner
            .lock()
            .unwrap()
            .replies
            .insert(endpoint, (status, body));
    }

    pub fn delay(&self, delay: Duration) {
        self.inner.lock().unwrap().delay = Some(delay);
    }

    pub fn requests(&self, endpoint: Endpoint) -> Vec<Recorded> {
        self.inner
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.endpoint == endpoint)
            .cloned()
            .collect()
    }

    pub fn total_requests(&self) -> usize {
        self.inner.lock().unwrap().requests.len()
    }

    async fn handle(
        &self,
        endpoint: Endpoint,
        query: HashMap<String, String>,
        body: Value,
        authorization: Option<String>,
    ) -> (StatusCode, Json<Value>) {
        let (status, reply, delay) = {
            let mut inner = self.inner.lock().unwrap();
            inner.requests.push(Recorded {
                endpoint,
                query,
                body,
                authorization,
            });
            let (status, reply) = inner
                .replies
                .get(&endpoint)
                .cloned()
                .unwrap_or((404, json!({"message": "not found"})));
            (status, reply, inner.delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        (StatusCode::from_u16(status).unwrap(), Json(reply))
    }
}

pub fn completion_body(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

async fn list_rules(State(state): State<MockState>) -> (StatusCode, Json<Value>) {
    state
        .handle(Endpoint::ListRules, HashMap::new(), Value::Null, None)
        .await
}

async fn create_rule(
    State(state): State<MockState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state
        .handle(Endpoint::CreateRule, HashMap::new(), body, None)
        .await
}

async fn apply_rule(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.handle(Endpoint::ApplyRule, query, body, None).await
}

async fn completion(
    State(state): State<MockState>,
    headers: axum::http::HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let authorization = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state
        .handle(Endpoint::Completion, HashMap::new(), body, authorization)
        .await
}

pub async fn spawn(state: MockState) -> String {
    let app = Router::new()
        .route("/api/rules", get(list_rules).post(create_rule))
        .route("/api/rules/apply", post(apply_rule))
        .route("/v1/chat/completions", post(completion))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// 一个没有服务监听的地址
pub async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn config(base_url: &str) -> ClientConfig {
    ClientConfig {
        api_base: base_url.to_string(),
        timeout_ms: Some(2000),
        completion: CompletionConfig {
            base_url: format!("{}/v1", base_url),
            model: "test-model".to_string(),
            api_key: Some("sk-test".to_string()),
            timeout_ms: Some(2000),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub async fn start() -> (MockState, ClientConfig) {
    let state = MockState::new();
    let base = spawn(state.clone()).await;
    (state, config(&base))
}
