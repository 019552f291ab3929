use super::board::{BoardAction, RuleBoardState};
use super::execute::{ExecuteAction, ExecuteViewState};
use super::form::{FormAction, RuleFormState};
use super::dispatch;
use crate::aop::{InterceptorManager, LoggingInterceptor, Operation, RequestInterceptor};
use crate::components::{
    apply_error_message, clean_scenario, create_error_message, validate_clarify_input,
    validate_credentials, validate_execute_input, validate_rule_name, ApplyRuleClient,
    ClarificationClient, DynCompletionBackend, DynRulesApi, ExecuteRequest, ExecuteResult,
    HttpCompletionBackend, HttpRulesApi, ListOutcome, RuleCrudClient, RuleExecutor, RuleSchema,
};
use crate::types::{
    ClientConfig, Credentials, RecentPrompt, Rule, RuleError, RuleStatus, CREATE_FAILED_MESSAGE,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::debug;

/// 规则管理面板: 持有各客户端和视图状态, 执行异步动作并把结果派发给 reducer
#[derive(Debug)]
pub struct RuleDesk {
    crud: RuleCrudClient,
    clarifier: ClarificationClient,
    applier: ApplyRuleClient,
    executor: RuleExecutor,
    schema: RuleSchema,
    form: Arc<RwLock<RuleFormState>>,
    board: Arc<RwLock<RuleBoardState>>,
    execute: Arc<RwLock<ExecuteViewState>>,
    interceptors: RwLock<InterceptorManager>,
}

impl RuleDesk {
    pub fn new(config: &ClientConfig, api: DynRulesApi, backend: DynCompletionBackend) -> Self {
        let schema = RuleSchema::new().with_credentials(config.require_credentials);
        let mut interceptors = InterceptorManager::new();
        interceptors.add_interceptor(Arc::new(LoggingInterceptor));

        Self {
            crud: RuleCrudClient::new(api.clone(), config.tenant_id, schema),
            clarifier: ClarificationClient::new(backend.clone()),
            applier: ApplyRuleClient::new(api, config.tenant_id),
            executor: RuleExecutor::new(backend),
            schema,
            form: Arc::default(),
            board: Arc::default(),
            execute: Arc::default(),
            interceptors: RwLock::new(interceptors),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, RuleError> {
        let api: DynRulesApi = Arc::new(HttpRulesApi::from_config(config)?);
        let backend: DynCompletionBackend =
            Arc::new(HttpCompletionBackend::new(config.completion.clone())?);
        Ok(Self::new(config, api, backend))
    }

    pub async fn add_interceptor(&self, interceptor: Arc<dyn RequestInterceptor>) {
        self.interceptors.write().await.add_interceptor(interceptor);
    }

    pub async fn form_state(&self) -> RuleFormState {
        self.form.read().await.clone()
    }

    pub async fn board_state(&self) -> RuleBoardState {
        self.board.read().await.clone()
    }

    pub async fn execute_state(&self) -> ExecuteViewState {
        self.execute.read().await.clone()
    }

    /// 表单字段编辑等同步动作
    pub async fn update_form(&self, action: FormAction) {
        dispatch(&mut *self.form.write().await, action);
    }

    async fn intercepted<T, F>(&self, op: Operation, fut: F) -> Result<T, RuleError>
    where
        F: Future<Output = Result<T, RuleError>>,
    {
        let interceptors = self.interceptors.read().await.clone();
        intercepted(interceptors, op, fut).await
    }

    fn check_gate(&self, credentials: Option<&Credentials>) -> Result<(), RuleError> {
        if !self.schema.requires_credentials() {
            return Ok(());
        }
        match credentials {
            Some(credentials) => validate_credentials(credentials),
            None => validate_credentials(&Credentials::default()),
        }
    }

    /// 澄清当前草稿中的规则定义
    pub async fn clarify(&self) -> Result<String, RuleError> {
        let interceptors = self.interceptors.read().await.clone();
        let definition = {
            let mut form = self.form.write().await;
            if form.busy() {
                return Err(RuleError::Busy);
            }
            let definition = form.draft.rule_definition.clone();
            if let Err(e) = validate_clarify_input(&definition) {
                dispatch(&mut *form, FormAction::ClarifyFailed(e.user_message()));
                return Err(e);
            }
            dispatch(&mut *form, FormAction::ClarifyStarted);
            definition
        };

        // 调用方放弃等待时任务仍会完成并写回表单状态
        let clarifier = self.clarifier.clone();
        let form = self.form.clone();
        let task = tokio::spawn(async move {
            let result =
                intercepted(interceptors, Operation::ClarifyRule, clarifier.clarify(&definition))
                    .await;
            let mut form = form.write().await;
            match &result {
                Ok(clarified) => {
                    dispatch(&mut *form, FormAction::ClarifySucceeded(clarified.clone()))
                }
                Err(e) => dispatch(&mut *form, FormAction::ClarifyFailed(e.user_message())),
            }
            result
        });
        task.await?
    }

    /// 校验并提交当前草稿, 成功后加入列表
    pub async fn submit_rule(&self) -> Result<Rule, RuleError> {
        let interceptors = self.interceptors.read().await.clone();
        let draft = {
            let mut form = self.form.write().await;
            if form.busy() {
                return Err(RuleError::Busy);
            }
            let draft = form.draft.clone();
            if let Err(e) = self.schema.validate(&draft) {
                dispatch(
                    &mut *form,
                    FormAction::SubmitFailed {
                        message: CREATE_FAILED_MESSAGE.to_string(),
                        issues: e.issues().to_vec(),
                    },
                );
                return Err(e);
            }
            dispatch(&mut *form, FormAction::SubmitStarted);
            draft
        };

        let crud = self.crud.clone();
        let form = self.form.clone();
        let board = self.board.clone();
        let task = tokio::spawn(async move {
            let result = intercepted(interceptors, Operation::CreateRule, crud.create(&draft)).await;
            match &result {
                Ok(rule) => {
                    dispatch(&mut *form.write().await, FormAction::SubmitSucceeded(rule.clone()));
                    dispatch(&mut *board.write().await, BoardAction::RuleAdded(rule.clone()));
                }
                Err(e) => dispatch(
                    &mut *form.write().await,
                    FormAction::SubmitFailed {
                        message: create_error_message(e),
                        issues: e.issues().to_vec(),
                    },
                ),
            }
            result
        });
        task.await?
    }

    /// 加载规则列表, 失败时使用后备数据并记录警告
    pub async fn load_rules(&self, fallback: Vec<Rule>) -> ListOutcome {
        dispatch(&mut *self.board.write().await, BoardAction::LoadStarted);
        let result = self.intercepted(Operation::ListRules, self.crud.list()).await;
        let outcome = ListOutcome::from_result(result, fallback);
        dispatch(&mut *self.board.write().await, BoardAction::Loaded(outcome.clone()));
        outcome
    }

    pub async fn recent_prompts(&self) -> Result<Vec<RecentPrompt>, RuleError> {
        self.intercepted(Operation::RecentPrompts, self.crud.recent_prompts())
            .await
    }

    pub async fn toggle_status(
        &self,
        id: &str,
        credentials: Option<&Credentials>,
    ) -> Result<RuleStatus, RuleError> {
        self.check_gate(credentials)?;
        let mut board = self.board.write().await;
        if !board.contains(id) {
            return Err(RuleError::RuleNotFound(id.to_string()));
        }
        dispatch(&mut *board, BoardAction::ToggleStatus(id.to_string()));
        let status = board
            .get(id)
            .map(|r| r.status)
            .ok_or_else(|| RuleError::RuleNotFound(id.to_string()))?;
        debug!("Rule {} is now {}", id, status);
        Ok(status)
    }

    pub async fn delete_rule(
        &self,
        id: &str,
        credentials: Option<&Credentials>,
    ) -> Result<Rule, RuleError> {
        self.check_gate(credentials)?;
        let mut board = self.board.write().await;
        let removed = board
            .get(id)
            .cloned()
            .ok_or_else(|| RuleError::RuleNotFound(id.to_string()))?;
        dispatch(&mut *board, BoardAction::Delete(id.to_string()));
        Ok(removed)
    }

    pub async fn edit_rule(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
        credentials: Option<&Credentials>,
    ) -> Result<Rule, RuleError> {
        self.check_gate(credentials)?;
        validate_rule_name(name)?;
        let mut board = self.board.write().await;
        if !board.contains(id) {
            return Err(RuleError::RuleNotFound(id.to_string()));
        }
        dispatch(
            &mut *board,
            BoardAction::Edit {
                id: id.to_string(),
                name: name.trim().to_string(),
                description: description
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string),
            },
        );
        board
            .get(id)
            .cloned()
            .ok_or_else(|| RuleError::RuleNotFound(id.to_string()))
    }

    /// 提交执行请求; 已有请求在途时返回 Busy
    pub async fn execute(&self, request: ExecuteRequest) -> Result<ExecuteResult, RuleError> {
        let interceptors = self.interceptors.read().await.clone();
        {
            let mut view = self.execute.write().await;
            if view.in_flight {
                return Err(RuleError::Busy);
            }
            if let Err(e) = precheck(&request) {
                dispatch(&mut *view, ExecuteAction::Rejected(e.user_message()));
                return Err(e);
            }
            dispatch(&mut *view, ExecuteAction::Submitted(request.clone()));
        }

        let applier = self.applier.clone();
        let executor = self.executor.clone();
        let view = self.execute.clone();
        let task = tokio::spawn(async move {
            let result = match &request {
                ExecuteRequest::Scenario(scenario) => {
                    intercepted(interceptors, Operation::ApplyRule, applier.apply(scenario))
                        .await
                        .map(ExecuteResult::Applied)
                }
                ExecuteRequest::RuleWithInput {
                    rule_name,
                    input_json,
                } => intercepted(
                    interceptors,
                    Operation::ExecuteRule,
                    executor.execute(rule_name, input_json),
                )
                .await
                .map(ExecuteResult::Evaluated),
            };

            let mut view = view.write().await;
            match &result {
                Ok(outcome) => dispatch(&mut *view, ExecuteAction::Succeeded(outcome.clone())),
                Err(e) => dispatch(
                    &mut *view,
                    ExecuteAction::Failed {
                        message: apply_error_message(e),
                        retryable: e.is_retryable(),
                    },
                ),
            }
            result
        });
        task.await?
    }

    /// 原样重发上一次失败的请求
    pub async fn retry(&self) -> Result<ExecuteResult, RuleError> {
        let request = {
            let view = self.execute.read().await;
            if view.in_flight {
                return Err(RuleError::Busy);
            }
            view.retry_request().cloned().ok_or(RuleError::NothingToRetry)?
        };
        self.execute(request).await
    }
}

async fn intercepted<T, F>(
    interceptors: InterceptorManager,
    op: Operation,
    fut: F,
) -> Result<T, RuleError>
where
    F: Future<Output = Result<T, RuleError>>,
{
    interceptors.before_request(op).await?;

    let started = Instant::now();
    let result = fut.await;
    match &result {
        Ok(_) => interceptors.after_request(op, started.elapsed()).await,
        Err(e) => interceptors.request_error(op, e).await,
    }
    result
}

fn precheck(request: &ExecuteRequest) -> Result<(), RuleError> {
    match request {
        ExecuteRequest::Scenario(scenario) => {
            if clean_scenario(scenario).is_empty() {
                Err(RuleError::PromptRequired)
            } else {
                Ok(())
            }
        }
        ExecuteRequest::RuleWithInput {
            rule_name,
            input_json,
        } => validate_execute_input(rule_name, input_json),
    }
}
