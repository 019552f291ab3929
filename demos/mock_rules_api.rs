use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use rulemaster::engine::FormAction;
use rulemaster::{
    ApplyRequest, ClientConfig, ExecuteRequest, NewRuleRequest, RuleDesk, RuleRecord,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower_http::trace::TraceLayer;
use tracing::info;

// 内存规则库
#[derive(Clone, Default)]
struct AppState {
    rules: Arc<Mutex<Vec<RuleRecord>>>,
}

#[derive(Debug, Deserialize)]
struct TenantQuery {
    tenant_id: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let state = AppState::default();
    let app = Router::new()
        .route("/api/rules", get(list_rules).post(create_rule))
        .route("/api/rules/apply", post(apply_rule))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    info!("Mock rules API listening on {}", addr);
    tokio::spawn(async move { axum::serve(listener, app).await });

    let config = ClientConfig {
        api_base: format!("http://{}", addr),
        ..ClientConfig::default()
    };
    let desk = RuleDesk::from_config(&config)?;

    desk.update_form(FormAction::SetName("VIP Customer Discount".into()))
        .await;
    desk.update_form(FormAction::SetDescription(Some(
        "Give a 15% discount to gold customers.".into(),
    )))
    .await;
    desk.update_form(FormAction::SetDefinition(
        "if customer tier is gold then apply a 15% discount".into(),
    ))
    .await;
    let created = desk.submit_rule().await?;
    info!("Created rule {} ({})", created.name, created.id);

    let outcome = desk.load_rules(Vec::new()).await;
    for rule in &outcome.rules {
        info!("{} [{}] {}", rule.id, rule.status, rule.name);
    }

    for scenario in ["apply rule gold customer orders $120", "weather is sunny"] {
        match desk.execute(ExecuteRequest::Scenario(scenario.into())).await {
            Ok(result) => info!("{:?} -> {}", scenario, result.message()),
            Err(_) => {
                let view = desk.execute_state().await;
                info!(
                    "{:?} -> {} (retry: {})",
                    scenario,
                    view.error.unwrap_or_default(),
                    view.can_retry
                );
            }
        }
    }

    Ok(())
}

async fn list_rules(State(state): State<AppState>) -> Json<Vec<RuleRecord>> {
    Json(state.rules.lock().unwrap().clone())
}

async fn create_rule(
    State(state): State<AppState>,
    Json(req): Json<NewRuleRequest>,
) -> (StatusCode, Json<Value>) {
    let mut rules = state.rules.lock().unwrap();
    if rules.iter().any(|r| r.rule_name == req.rule_name) {
        return (
            StatusCode::CONFLICT,
            Json(json!({"message": "A rule with this name already exists"})),
        );
    }

    let now = chrono::Utc::now().to_rfc3339();
    let record = RuleRecord {
        rule_id: (rules.len() + 1).to_string(),
        rule_name: req.rule_name,
        rule: Some(json!({"definition": req.prompt})),
        rule_description: req.rule_description,
        created_on: now.clone(),
        updated_on: Some(now),
        tenant_id: Some(req.tenant_id.to_string()),
        status: Some("active".to_string()),
    };
    rules.push(record.clone());
    (StatusCode::CREATED, Json(json!(record)))
}

// 按关键字粗略匹配规则描述
async fn apply_rule(
    State(state): State<AppState>,
    Query(query): Query<TenantQuery>,
    Json(req): Json<ApplyRequest>,
) -> (StatusCode, Json<Value>) {
    info!("apply for tenant {:?}: {}", query.tenant_id, req.prompt);
    let rules = state.rules.lock().unwrap();
    let prompt = req.prompt.to_lowercase();
    let matched = rules.iter().find(|r| {
        r.rule_description
            .as_deref()
            .unwrap_or(&r.rule_name)
            .to_lowercase()
            .split_whitespace()
            .filter(|w| w.len() > 3)
            .any(|w| prompt.contains(w))
    });

    match matched {
        Some(rule) => (
            StatusCode::OK,
            Json(json!({
                "finalResponse": {
                    "message": format!("{} applied", rule.rule_name),
                    "applied_rule": {
                        "rule_id": rule.rule_id,
                        "rule_name": rule.rule_name,
                        "rule": {},
                        "rule_description": rule.rule_description,
                        "created_on": rule.created_on,
                        "status": rule.status,
                    }
                }
            })),
        ),
        None => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"message": "No rule matches this scenario"})),
        ),
    }
}
