use crate::types::{ClientConfig, RuleError};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

/// 规则服务的 HTTP 客户端
#[derive(Debug, Clone)]
pub struct RestClient {
    base_url: String,
    client: Client,
}

impl RestClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RuleError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RuleError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, RuleError> {
        Self::new(&config.api_base, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RuleError> {
        let request = self.client.request(Method::GET, self.url(path));
        self.send(request).await
    }

    pub async fn post_json<B, T>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<T, RuleError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .client
            .request(Method::POST, self.url(path))
            .query(query)
            .json(body);
        self.send(request).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RuleError> {
        let response = request.send().await.map_err(|e| {
            error!("HTTP request failed: {}", e);
            RuleError::Transport(e.to_string())
        })?;

        let status = response.status();
        let text = response.text().await?;
        debug!("HTTP {} response body: {}", status, text);

        // 非 2xx: 优先使用服务端 message 字段
        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string));
            return Err(RuleError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            RuleError::MalformedResponse(format!("failed to decode response: {}", e))
        })
    }
}
