use super::{AppliedRule, RuleDefinitionDraft};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_APPLY_MESSAGE: &str = "Rule applied successfully.";

// 创建规则请求体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRuleRequest {
    pub rule_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_description: Option<String>,
    pub prompt: String,
    pub tenant_id: Uuid,
}

impl NewRuleRequest {
    /// 规则定义原文作为 prompt 提交
    pub fn from_draft(draft: &RuleDefinitionDraft, tenant_id: Uuid) -> Self {
        Self {
            rule_name: draft.name.trim().to_string(),
            rule_description: draft.description_text().map(str::to_string),
            prompt: draft.rule_definition.trim().to_string(),
            tenant_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalResponse {
    #[serde(default)]
    pub applied_rule: Option<AppliedRule>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyResponse {
    #[serde(default, rename = "finalResponse")]
    pub final_response: Option<FinalResponse>,
    #[serde(default)]
    pub message: Option<String>,
}

/// apply 调用的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplyOutcome {
    pub message: String,
    pub applied_rule: Option<AppliedRule>,
}

impl From<FinalResponse> for ApplyOutcome {
    fn from(resp: FinalResponse) -> Self {
        Self {
            message: resp
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_APPLY_MESSAGE.to_string()),
            applied_rule: resp.applied_rule,
        }
    }
}

/// 规则名 + JSON 输入的执行结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub outcome: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentPrompt {
    #[serde(default)]
    pub rule_description: Option<String>,
    #[serde(default)]
    pub created_on: Option<String>,
}
