use super::completion::{parse_structured, DynCompletionBackend};
use super::prompt::{execute_user_message, EXECUTE_SYSTEM_PROMPT};
use super::rules_api::DynRulesApi;
use crate::types::{
    ApplyOutcome, ApplyRequest, ExecutionOutcome, RuleError, ValidationIssue, APPLY_RETRY_MESSAGE,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

const APPLY_PREFIX: &str = "apply rule";

/// 执行请求: 自然语言场景, 或规则名加 JSON 输入
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum ExecuteRequest {
    Scenario(String),
    RuleWithInput { rule_name: String, input_json: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecuteResult {
    Applied(ApplyOutcome),
    Evaluated(ExecutionOutcome),
}

impl ExecuteResult {
    pub fn message(&self) -> &str {
        match self {
            ExecuteResult::Applied(outcome) => &outcome.message,
            ExecuteResult::Evaluated(outcome) => &outcome.outcome,
        }
    }
}

/// 去掉首尾空白和开头的 "apply rule" 前缀 (不区分大小写)
pub fn clean_scenario(prompt: &str) -> String {
    let trimmed = prompt.trim();
    match trimmed.get(..APPLY_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(APPLY_PREFIX) => {
            trimmed[APPLY_PREFIX.len()..].trim_start().to_string()
        }
        _ => trimmed.to_string(),
    }
}

/// 调用规则服务的 apply 接口
#[derive(Debug, Clone)]
pub struct ApplyRuleClient {
    api: DynRulesApi,
    tenant_id: Uuid,
}

impl ApplyRuleClient {
    pub fn new(api: DynRulesApi, tenant_id: Uuid) -> Self {
        Self { api, tenant_id }
    }

    pub async fn apply(&self, scenario: &str) -> Result<ApplyOutcome, RuleError> {
        let prompt = clean_scenario(scenario);
        if prompt.is_empty() {
            return Err(RuleError::PromptRequired);
        }

        let response = self
            .api
            .apply_rule(self.tenant_id, &ApplyRequest { prompt })
            .await
            .inspect_err(|e| warn!("Apply rule request failed: {}", e))?;

        match response.final_response {
            Some(final_response) => {
                let outcome = ApplyOutcome::from(final_response);
                info!("Rule applied: {}", outcome.message);
                Ok(outcome)
            }
            None => Err(RuleError::Remote {
                status: 200,
                message: response.message.filter(|m| !m.trim().is_empty()),
            }),
        }
    }
}

/// apply 失败时展示的消息: 服务端消息优先, 否则提示补充后重试
pub fn apply_error_message(e: &RuleError) -> String {
    match e {
        RuleError::Remote {
            message: Some(message),
            ..
        } => message.clone(),
        RuleError::Remote { .. } | RuleError::Transport(_) | RuleError::MalformedResponse(_) => {
            APPLY_RETRY_MESSAGE.to_string()
        }
        other => other.user_message(),
    }
}

/// 通过补全服务按规则名评估 JSON 输入
#[derive(Debug, Clone)]
pub struct RuleExecutor {
    backend: DynCompletionBackend,
}

impl RuleExecutor {
    pub fn new(backend: DynCompletionBackend) -> Self {
        Self { backend }
    }

    pub async fn execute(
        &self,
        rule_name: &str,
        input_json: &str,
    ) -> Result<ExecutionOutcome, RuleError> {
        validate_execute_input(rule_name, input_json)?;

        let user = execute_user_message(rule_name, input_json);
        let raw = self.backend.complete(EXECUTE_SYSTEM_PROMPT, &user).await?;
        let outcome: ExecutionOutcome = parse_structured(&raw)?;
        info!("Rule {:?} evaluated: {}", rule_name.trim(), outcome.outcome);
        Ok(outcome)
    }
}

/// 本地检查: 规则名非空, 输入必须是合法 JSON
pub fn validate_execute_input(rule_name: &str, input_json: &str) -> Result<(), RuleError> {
    if rule_name.trim().is_empty() {
        return Err(RuleError::Validation(vec![ValidationIssue::new(
            "ruleName",
            "Rule name is required.",
        )]));
    }
    serde_json::from_str::<Value>(input_json)
        .map(|_| ())
        .map_err(|e| RuleError::InvalidJson(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scenario_prefix_is_stripped() {
        assert_eq!(clean_scenario("  Apply Rule   gold customer orders $120 "), "gold customer orders $120");
        assert_eq!(clean_scenario("APPLY RULE"), "");
        assert_eq!(clean_scenario("gold customer orders $120"), "gold customer orders $120");
        assert_eq!(clean_scenario("apply"), "apply");
        assert_eq!(clean_scenario("ça apply rule"), "ça apply rule");
    }

    #[test]
    fn malformed_json_is_rejected_locally() {
        for bad in ["", "{", "{orderTotal: 60}", "[1, 2,]", "'x'"] {
            let err = validate_execute_input("Free Shipping", bad).unwrap_err();
            assert!(matches!(err, RuleError::InvalidJson(_)), "{:?}", bad);
            assert!(err.is_local());
        }
    }

    #[test]
    fn well_formed_json_passes() {
        for good in ["{\"orderTotal\": 60}", "[]", "42", "\"text\"", "null"] {
            assert!(validate_execute_input("Free Shipping", good).is_ok());
        }
    }

    #[test]
    fn apply_errors_fall_back_to_retry_hint() {
        let no_body = RuleError::Remote { status: 502, message: None };
        assert_eq!(apply_error_message(&no_body), APPLY_RETRY_MESSAGE);
        let refused = RuleError::Transport("connection refused".into());
        assert_eq!(apply_error_message(&refused), APPLY_RETRY_MESSAGE);
        let server = RuleError::Remote { status: 422, message: Some("No matching rule".into()) };
        assert_eq!(apply_error_message(&server), "No matching rule");
        assert_eq!(apply_error_message(&RuleError::PromptRequired), "Please enter a scenario to apply the rule.");
    }

    #[test]
    fn blank_rule_name_is_a_validation_issue() {
        let err = validate_execute_input("  ", "{}").unwrap_err();
        assert_eq!(err.issues()[0].field, "ruleName");
    }
}
