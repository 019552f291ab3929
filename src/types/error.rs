use serde::Serialize;
use thiserror::Error;

pub const CONNECT_FAILED_MESSAGE: &str = "Could not connect to the rules service.";
pub const APPLY_RETRY_MESSAGE: &str = "Please add more in your prompt and retry.";
pub const CREATE_FAILED_MESSAGE: &str = "Failed to create rule.";
pub const PROMPT_REQUIRED_MESSAGE: &str = "Please enter a scenario to apply the rule.";

/// 表单校验问题, 以字段名粗略定位
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error("validation failed: {}", join_messages(.0))]
    Validation(Vec<ValidationIssue>),

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("{}", PROMPT_REQUIRED_MESSAGE)]
    PromptRequired,

    #[error("a request is already in flight")]
    Busy,

    #[error("there is no failed request to retry")]
    NothingToRetry,

    #[error("rule not found: {0}")]
    RuleNotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Remote {
        status: u16,
        message: Option<String>,
    },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("completion failed: {0}")]
    Completion(String),

    #[error("Failed to clarify rule: {0}")]
    Clarification(String),

    #[error("request task failed: {0}")]
    Task(String),
}

fn join_messages(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl RuleError {
    /// 本地错误: 未发出任何网络请求
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            RuleError::Validation(_)
                | RuleError::InvalidJson(_)
                | RuleError::PromptRequired
                | RuleError::Busy
                | RuleError::NothingToRetry
                | RuleError::RuleNotFound(_)
                | RuleError::Config(_)
        )
    }

    /// 用户可以原样重试的错误: 请求已发出但失败, 不论状态码
    pub fn is_retryable(&self) -> bool {
        !self.is_local()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            RuleError::Validation(issues) => issues,
            _ => &[],
        }
    }

    /// 转换为界面可展示的消息
    pub fn user_message(&self) -> String {
        match self {
            RuleError::Validation(issues) => join_messages(issues),
            RuleError::Transport(_) => CONNECT_FAILED_MESSAGE.to_string(),
            RuleError::Remote {
                message: Some(message),
                ..
            } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for RuleError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RuleError::MalformedResponse(e.to_string())
        } else {
            RuleError::Transport(e.to_string())
        }
    }
}

impl From<tokio::task::JoinError> for RuleError {
    fn from(e: tokio::task::JoinError) -> Self {
        RuleError::Task(e.to_string())
    }
}

impl From<serde_json::Error> for RuleError {
    fn from(e: serde_json::Error) -> Self {
        RuleError::MalformedResponse(e.to_string())
    }
}
