use super::Reducer;
use crate::components::{ExecuteRequest, ExecuteResult};

/// 执行页状态, in_flight 期间禁止再次提交
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecuteViewState {
    pub in_flight: bool,
    pub last_request: Option<ExecuteRequest>,
    pub result: Option<ExecuteResult>,
    pub error: Option<String>,
    pub can_retry: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteAction {
    Submitted(ExecuteRequest),
    Succeeded(ExecuteResult),
    Failed { message: String, retryable: bool },
    Rejected(String),
    Clear,
}

impl ExecuteViewState {
    pub fn retry_request(&self) -> Option<&ExecuteRequest> {
        if self.can_retry && !self.in_flight {
            self.last_request.as_ref()
        } else {
            None
        }
    }
}

impl Reducer for ExecuteViewState {
    type Action = ExecuteAction;

    fn reduce(mut self, action: ExecuteAction) -> Self {
        match action {
            ExecuteAction::Submitted(request) => {
                self.in_flight = true;
                self.last_request = Some(request);
                self.result = None;
                self.error = None;
                self.can_retry = false;
            }
            ExecuteAction::Succeeded(result) => {
                self.in_flight = false;
                self.result = Some(result);
                self.error = None;
            }
            ExecuteAction::Failed { message, retryable } => {
                self.in_flight = false;
                self.result = None;
                self.error = Some(message);
                self.can_retry = retryable;
            }
            // 本地校验失败, 未发请求
            ExecuteAction::Rejected(message) => {
                self.result = None;
                self.error = Some(message);
                self.can_retry = false;
            }
            ExecuteAction::Clear => return ExecuteViewState::default(),
        }
        self
    }
}
