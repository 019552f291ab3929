use crate::types::RuleError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// 对外请求的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListRules,
    CreateRule,
    RecentPrompts,
    ClarifyRule,
    ApplyRule,
    ExecuteRule,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::ListRules => "list_rules",
            Operation::CreateRule => "create_rule",
            Operation::RecentPrompts => "recent_prompts",
            Operation::ClarifyRule => "clarify_rule",
            Operation::ApplyRule => "apply_rule",
            Operation::ExecuteRule => "execute_rule",
        };
        f.write_str(name)
    }
}

/// 请求拦截器
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    /// 请求发出前, 返回错误可以阻止请求
    async fn before(&self, op: Operation) -> Result<(), RuleError>;

    /// 请求成功后
    async fn after(&self, op: Operation, elapsed: Duration);

    /// 请求失败时
    async fn error(&self, op: Operation, error: &RuleError);
}

/// 拦截器管理器
#[derive(Clone, Default)]
pub struct InterceptorManager {
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
}

impl InterceptorManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_interceptor(&mut self, interceptor: Arc<dyn RequestInterceptor>) {
        self.interceptors.push(interceptor);
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub async fn before_request(&self, op: Operation) -> Result<(), RuleError> {
        for interceptor in &self.interceptors {
            interceptor.before(op).await?;
        }
        Ok(())
    }

    pub async fn after_request(&self, op: Operation, elapsed: Duration) {
        for interceptor in &self.interceptors {
            interceptor.after(op, elapsed).await;
        }
    }

    pub async fn request_error(&self, op: Operation, error: &RuleError) {
        for interceptor in &self.interceptors {
            interceptor.error(op, error).await;
        }
    }
}

impl fmt::Debug for InterceptorManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorManager")
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

pub struct LoggingInterceptor;

#[async_trait]
impl RequestInterceptor for LoggingInterceptor {
    async fn before(&self, op: Operation) -> Result<(), RuleError> {
        info!("Starting {}", op);
        Ok(())
    }

    async fn after(&self, op: Operation, elapsed: Duration) {
        info!("Finished {} in {:?}", op, elapsed);
    }

    async fn error(&self, op: Operation, error: &RuleError) {
        warn!("{} failed: {}", op, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        before: AtomicUsize,
        errors: AtomicUsize,
        veto: bool,
    }

    #[async_trait]
    impl RequestInterceptor for Counting {
        async fn before(&self, op: Operation) -> Result<(), RuleError> {
            self.before.fetch_add(1, Ordering::SeqCst);
            if self.veto {
                return Err(RuleError::Config(format!("{} blocked", op)));
            }
            Ok(())
        }

        async fn after(&self, _op: Operation, _elapsed: Duration) {}

        async fn error(&self, _op: Operation, _error: &RuleError) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn veto_stops_later_interceptors() {
        let first = Arc::new(Counting {
            veto: true,
            ..Default::default()
        });
        let second = Arc::new(Counting::default());
        let mut manager = InterceptorManager::new();
        manager.add_interceptor(first.clone());
        manager.add_interceptor(second.clone());
        assert_eq!(manager.len(), 2);

        let err = tokio_test::block_on(manager.before_request(Operation::CreateRule)).unwrap_err();
        assert_eq!(err, RuleError::Config("create_rule blocked".into()));
        assert_eq!(first.before.load(Ordering::SeqCst), 1);
        assert_eq!(second.before.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn errors_reach_every_interceptor() {
        let a = Arc::new(Counting::default());
        let b = Arc::new(Counting::default());
        let mut manager = InterceptorManager::new();
        manager.add_interceptor(a.clone());
        manager.add_interceptor(b.clone());
        manager.add_interceptor(Arc::new(LoggingInterceptor));

        tokio_test::block_on(manager.request_error(Operation::ApplyRule, &RuleError::Busy));
        assert_eq!(a.errors.load(Ordering::SeqCst), 1);
        assert_eq!(b.errors.load(Ordering::SeqCst), 1);
    }
}
