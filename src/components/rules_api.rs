use super::RestClient;
use crate::types::{ApplyRequest, ApplyResponse, ClientConfig, NewRuleRequest, RuleError, RuleRecord};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;
use uuid::Uuid;

pub const RULES_PATH: &str = "/api/rules";
pub const APPLY_PATH: &str = "/api/rules/apply";

pub type DynRulesApi = Arc<dyn RulesApi>;

/// 外部规则服务接口
#[async_trait]
pub trait RulesApi: Debug + Send + Sync {
    async fn list_rules(&self) -> Result<Vec<RuleRecord>, RuleError>;
    async fn create_rule(&self, request: &NewRuleRequest) -> Result<Value, RuleError>;
    async fn apply_rule(
        &self,
        tenant_id: Uuid,
        request: &ApplyRequest,
    ) -> Result<ApplyResponse, RuleError>;
}

#[derive(Debug, Clone)]
pub struct HttpRulesApi {
    rest: RestClient,
}

impl HttpRulesApi {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, RuleError> {
        Ok(Self::new(RestClient::from_config(config)?))
    }
}

#[async_trait]
impl RulesApi for HttpRulesApi {
    async fn list_rules(&self) -> Result<Vec<RuleRecord>, RuleError> {
        self.rest.get_json(RULES_PATH).await
    }

    async fn create_rule(&self, request: &NewRuleRequest) -> Result<Value, RuleError> {
        self.rest.post_json(RULES_PATH, &[], request).await
    }

    async fn apply_rule(
        &self,
        tenant_id: Uuid,
        request: &ApplyRequest,
    ) -> Result<ApplyResponse, RuleError> {
        self.rest
            .post_json(APPLY_PATH, &[("tenant_id", tenant_id.to_string())], request)
            .await
    }
}
