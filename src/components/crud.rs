use super::rules_api::DynRulesApi;
use super::validation::RuleSchema;
use crate::types::{
    parse_timestamp, NewRuleRequest, RecentPrompt, Rule, RuleDefinitionDraft, RuleError,
    RuleRecord, RuleStatus, CREATE_FAILED_MESSAGE,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const LIST_FAILED_WARNING: &str = "Could not load rules from the server. Showing fallback rules.";
pub const PROMPTS_FAILED_MESSAGE: &str = "Failed to fetch prompts.";

/// 列表结果, warning 非空表示使用了后备数据
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListOutcome {
    pub rules: Vec<Rule>,
    pub warning: Option<String>,
}

impl ListOutcome {
    pub fn from_result(result: Result<Vec<Rule>, RuleError>, fallback: Vec<Rule>) -> Self {
        match result {
            Ok(rules) => ListOutcome {
                rules,
                warning: None,
            },
            Err(e) => {
                warn!("Listing rules failed, using {} fallback rules: {}", fallback.len(), e);
                ListOutcome {
                    rules: fallback,
                    warning: Some(LIST_FAILED_WARNING.to_string()),
                }
            }
        }
    }
}

/// 创建失败时展示的消息
pub fn create_error_message(e: &RuleError) -> String {
    match e {
        RuleError::Remote {
            message: Some(message),
            ..
        } => message.clone(),
        RuleError::Validation(_) | RuleError::Transport(_) => e.user_message(),
        _ => CREATE_FAILED_MESSAGE.to_string(),
    }
}

/// 最近提示词加载失败时展示的消息
pub fn prompts_error_message(e: &RuleError) -> String {
    match e {
        RuleError::Remote {
            message: Some(message),
            ..
        } => message.clone(),
        _ => PROMPTS_FAILED_MESSAGE.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct RuleCrudClient {
    api: DynRulesApi,
    tenant_id: Uuid,
    schema: RuleSchema,
}

impl RuleCrudClient {
    pub fn new(api: DynRulesApi, tenant_id: Uuid, schema: RuleSchema) -> Self {
        Self {
            api,
            tenant_id,
            schema,
        }
    }

    pub async fn list(&self) -> Result<Vec<Rule>, RuleError> {
        let records = self.api.list_rules().await?;
        debug!("Fetched {} rule records", records.len());
        records.into_iter().map(Rule::try_from).collect()
    }

    /// 获取失败时使用调用方提供的后备规则, 并返回非致命警告
    pub async fn list_or_fallback(&self, fallback: Vec<Rule>) -> ListOutcome {
        ListOutcome::from_result(self.list().await, fallback)
    }

    pub async fn recent_prompts(&self) -> Result<Vec<RecentPrompt>, RuleError> {
        let records = self
            .api
            .list_rules()
            .await
            .inspect_err(|e| warn!("Fetching recent prompts failed: {}", e))?;
        Ok(records
            .into_iter()
            .map(|r| RecentPrompt {
                rule_description: r.rule_description,
                created_on: Some(r.created_on),
            })
            .collect())
    }

    /// 校验草稿后提交; 校验失败时不发请求
    pub async fn create(&self, draft: &RuleDefinitionDraft) -> Result<Rule, RuleError> {
        self.schema.validate(draft)?;

        let request = NewRuleRequest::from_draft(draft, self.tenant_id);
        let created = self
            .api
            .create_rule(&request)
            .await
            .inspect_err(|e| warn!("Creating rule {:?} failed: {}", request.rule_name, e))?;

        let rule = created_rule(created, &request);
        info!("Rule created: {} ({})", rule.name, rule.id);
        Ok(rule)
    }
}

// 服务端返回的记录可能不完整, 缺失字段用本地值补齐
fn created_rule(body: Value, request: &NewRuleRequest) -> Rule {
    if let Ok(record) = serde_json::from_value::<RuleRecord>(body.clone()) {
        if let Ok(rule) = Rule::try_from(record) {
            return rule;
        }
    }

    let field = |key: &str| body.get(key).and_then(Value::as_str);
    Rule {
        id: body
            .get("rule_id")
            .map(|id| match id {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        name: field("rule_name")
            .map(str::to_string)
            .unwrap_or_else(|| request.rule_name.clone()),
        description: request.rule_description.clone(),
        status: RuleStatus::from_wire(field("status")),
        created_at: field("created_on")
            .and_then(|ts| parse_timestamp(ts).ok())
            .unwrap_or_else(Utc::now),
    }
}
