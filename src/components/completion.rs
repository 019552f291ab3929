use crate::types::{CompletionConfig, RuleError};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, error};

pub type DynCompletionBackend = Arc<dyn CompletionBackend>;

/// 文本补全服务
#[async_trait]
pub trait CompletionBackend: Debug + Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, RuleError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI 兼容的 chat/completions 客户端
#[derive(Debug, Clone)]
pub struct HttpCompletionBackend {
    config: CompletionConfig,
    client: Client,
}

impl HttpCompletionBackend {
    pub fn new(config: CompletionConfig) -> Result<Self, RuleError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| RuleError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl CompletionBackend for HttpCompletionBackend {
    async fn complete(&self, system: &str, user: &str) -> Result<String, RuleError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.config.temperature,
        };

        debug!("Sending completion request to {} ({})", self.endpoint(), self.config.model);
        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RuleError::Completion(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("Completion API error - status: {}, body: {}", status, text);
            return Err(RuleError::Completion(format!("HTTP {}: {}", status, text)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| RuleError::Completion(format!("invalid completion reply: {}", e)))?;

        match parsed.choices.into_iter().next().and_then(|c| c.message.content) {
            Some(text) if !text.trim().is_empty() => Ok(text),
            Some(_) => Err(RuleError::Completion("model returned empty text".to_string())),
            None => Err(RuleError::Completion("model returned no choices".to_string())),
        }
    }
}

/// 从模型输出中提取 JSON 对象并反序列化
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<T, RuleError> {
    let json = extract_json_object(raw)
        .ok_or_else(|| RuleError::Completion("model output contained no JSON object".to_string()))?;
    let value: Value = serde_json::from_str(json)
        .map_err(|e| RuleError::Completion(format!("model output is not valid JSON: {}", e)))?;
    serde_json::from_value(value)
        .map_err(|e| RuleError::Completion(format!("model output has unexpected shape: {}", e)))
}

fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}
