use super::RuleError;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

pub const DEFAULT_API_BASE: &str = "http://localhost:4000";
pub const DEFAULT_COMPLETION_URL: &str = "http://localhost:11434/v1";
pub const DEFAULT_COMPLETION_MODEL: &str = "llama3.1";
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_COMPLETION_TIMEOUT_MS: u64 = 60_000;

// 开发环境租户
pub const DEFAULT_TENANT_ID: Uuid = Uuid::from_u128(0x02caae70_9c87_4f0f_a393_5b0f92283a42);

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base: String,
    pub tenant_id: Uuid,
    pub timeout_ms: Option<u64>,
    // 切换状态/删除/创建前是否要求输入凭据
    pub require_credentials: bool,
    pub completion: CompletionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            tenant_id: DEFAULT_TENANT_ID,
            timeout_ms: None,
            require_credentials: false,
            completion: CompletionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub timeout_ms: Option<u64>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_COMPLETION_URL.to_string(),
            model: DEFAULT_COMPLETION_MODEL.to_string(),
            api_key: None,
            temperature: 0.2,
            timeout_ms: None,
        }
    }
}

impl CompletionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_COMPLETION_TIMEOUT_MS))
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS))
    }

    pub fn from_json(content: &str) -> Result<Self, RuleError> {
        serde_json::from_str(content).map_err(|e| RuleError::Config(e.to_string()))
    }

    pub fn from_env() -> Result<Self, RuleError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取配置, 未设置的键使用默认值
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RuleError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = ClientConfig::default();

        if let Some(base) = get("RULEMASTER_API_BASE") {
            config.api_base = base;
        }
        if let Some(tenant) = get("RULEMASTER_TENANT_ID") {
            config.tenant_id = Uuid::parse_str(&tenant)
                .map_err(|e| RuleError::Config(format!("RULEMASTER_TENANT_ID: {}", e)))?;
        }
        if let Some(timeout) = get("RULEMASTER_TIMEOUT_MS") {
            config.timeout_ms = Some(parse_millis("RULEMASTER_TIMEOUT_MS", &timeout)?);
        }
        if let Some(flag) = get("RULEMASTER_REQUIRE_CREDENTIALS") {
            config.require_credentials = matches!(flag.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(url) = get("RULEMASTER_COMPLETION_URL") {
            config.completion.base_url = url;
        }
        if let Some(model) = get("RULEMASTER_COMPLETION_MODEL") {
            config.completion.model = model;
        }
        if let Some(key) = get("RULEMASTER_COMPLETION_API_KEY") {
            config.completion.api_key = Some(key);
        }
        if let Some(timeout) = get("RULEMASTER_COMPLETION_TIMEOUT_MS") {
            config.completion.timeout_ms =
                Some(parse_millis("RULEMASTER_COMPLETION_TIMEOUT_MS", &timeout)?);
        }

        Ok(config)
    }
}

fn parse_millis(key: &str, raw: &str) -> Result<u64, RuleError> {
    raw.parse()
        .map_err(|_| RuleError::Config(format!("{}: expected milliseconds, got {:?}", key, raw)))
}
