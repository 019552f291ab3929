use super::completion::{parse_structured, DynCompletionBackend};
use super::prompt::{clarify_user_message, CLARIFY_SYSTEM_PROMPT};
use super::validation::validate_clarify_input;
use crate::types::RuleError;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClarifyOutput {
    clarified_rule: String,
}

/// 规则澄清客户端
#[derive(Debug, Clone)]
pub struct ClarificationClient {
    backend: DynCompletionBackend,
}

impl ClarificationClient {
    pub fn new(backend: DynCompletionBackend) -> Self {
        Self { backend }
    }

    /// 输入过短时直接返回校验错误, 不发请求
    pub async fn clarify(&self, rule_definition: &str) -> Result<String, RuleError> {
        validate_clarify_input(rule_definition)?;

        let user = clarify_user_message(rule_definition);
        let clarified = self
            .backend
            .complete(CLARIFY_SYSTEM_PROMPT, &user)
            .await
            .and_then(|raw| parse_structured::<ClarifyOutput>(&raw))
            .map(|out| out.clarified_rule.trim().to_string())
            .map_err(|e| {
                warn!("Rule clarification failed: {}", e);
                RuleError::Clarification(failure_reason(e))
            })?;

        if clarified.is_empty() {
            return Err(RuleError::Clarification(
                "model returned an empty clarification".to_string(),
            ));
        }

        info!("Clarified rule definition ({} chars)", clarified.chars().count());
        Ok(clarified)
    }
}

fn failure_reason(e: RuleError) -> String {
    match e {
        RuleError::Completion(reason) => reason,
        other => other.to_string(),
    }
}
