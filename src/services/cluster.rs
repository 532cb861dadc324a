use crate::constants::network::TIMEOUT_CLUSTER_REQUEST_MS;
use crate::errors::ControlError;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use url::Url;

fn default_timeout_ms() -> u64 {
    TIMEOUT_CLUSTER_REQUEST_MS
}

/// Access configuration for one downstream cluster API. Supplied once at
/// process start (the base config) or per named cluster as a raw JSON
/// document, and treated as immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub api_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token_file: Option<String>,
    #[serde(default)]
    pub accept_invalid_certs: bool,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl ClusterConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            bearer_token: None,
            bearer_token_file: None,
            accept_invalid_certs: false,
            timeout_ms: TIMEOUT_CLUSTER_REQUEST_MS,
        }
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self, ControlError> {
        if raw.is_empty() {
            return Err(ControlError::empty_config());
        }
        let config: ClusterConfig = serde_json::from_slice(raw).map_err(|err| {
            ControlError::malformed_config(format!("invalid cluster config: {}", err))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ControlError> {
        let api_url = self.api_url.trim();
        if api_url.is_empty() {
            return Err(ControlError::malformed_config("api_url is required"));
        }
        Url::parse(api_url).map_err(|_| {
            ControlError::malformed_config("api_url is not a valid URL")
                .with_details(serde_json::json!({ "api_url": api_url }))
        })?;
        Ok(())
    }

    /// Derives a per-caller config: the explicit token wins, so any token
    /// file reference is cleared.
    pub fn with_bearer_token(&self, token: &str) -> Self {
        let mut config = self.clone();
        config.bearer_token = Some(token.to_string());
        config.bearer_token_file = None;
        config
    }
}

/// Reusable handle on one cluster API, scoped to the credential baked into
/// its config. Construction is local-only; safe to share across callers.
#[derive(Debug)]
pub struct ClusterClient {
    config: ClusterConfig,
    http: Client,
}

impl ClusterClient {
    pub fn new(config: ClusterConfig) -> Result<Self, ControlError> {
        config.validate()?;
        let mut headers = HeaderMap::new();
        if let Some(token) = config.bearer_token.as_deref() {
            let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                ControlError::client_build("bearer token is not a valid header value")
            })?;
            headers.insert(AUTHORIZATION, value);
        }
        let mut builder = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout_ms));
        if config.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build().map_err(|err| {
            ControlError::client_build(format!("failed to build cluster client: {}", err))
        })?;
        Ok(Self { config, http })
    }

    pub fn base_url(&self) -> &str {
        self.config.api_url.trim_end_matches('/')
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }

    pub async fn get_json(&self, path: &str) -> Result<Value, ControlError> {
        let url = self.url_for(path);
        let response = self.http.get(&url).send().await.map_err(|err| {
            if err.is_timeout() {
                ControlError::timeout("cluster request timed out")
            } else {
                ControlError::transport(err.to_string())
            }
        })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| ControlError::response_read(err.to_string()))?;
        if !status.is_success() {
            return Err(ControlError::status_not_ok(status.as_u16())
                .with_details(serde_json::json!({ "url": url, "body": body })));
        }
        serde_json::from_str(&body).map_err(|err| {
            ControlError::internal(format!("cluster API returned invalid JSON: {}", err))
        })
    }
}

/// Authorization-check client for the same credential scope as
/// [`ClusterClient`]; answers "may this caller perform verb on resource".
#[derive(Debug)]
pub struct AuthClient {
    inner: ClusterClient,
}

impl AuthClient {
    pub fn new(config: ClusterConfig) -> Result<Self, ControlError> {
        Ok(Self {
            inner: ClusterClient::new(config)?,
        })
    }

    pub async fn can_access(&self, verb: &str, resource: &str) -> Result<bool, ControlError> {
        let url = self.inner.url_for("apis/authorization/self-access-review");
        let body = serde_json::json!({ "verb": verb, "resource": resource });
        let response = self
            .inner
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ControlError::timeout("access review timed out")
                } else {
                    ControlError::transport(err.to_string())
                }
            })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| ControlError::response_read(err.to_string()))?;
        if !status.is_success() {
            return Err(ControlError::status_not_ok(status.as_u16())
                .with_details(serde_json::json!({ "url": url, "body": body })));
        }
        let review: Value = serde_json::from_str(&body).map_err(|err| {
            ControlError::internal(format!("access review returned invalid JSON: {}", err))
        })?;
        Ok(review
            .get("allowed")
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_rejects_empty_and_malformed() {
        assert_eq!(ClusterConfig::from_bytes(b"").unwrap_err().code, "EMPTY_CONFIG");
        assert_eq!(
            ClusterConfig::from_bytes(b"not json").unwrap_err().code,
            "MALFORMED_CONFIG"
        );
        assert_eq!(
            ClusterConfig::from_bytes(b"{\"api_url\": \"\"}").unwrap_err().code,
            "MALFORMED_CONFIG"
        );
    }

    #[test]
    fn from_bytes_parses_valid_config() {
        let config = ClusterConfig::from_bytes(b"{\"api_url\": \"https://cluster-a.example.com\"}")
            .expect("config");
        assert_eq!(config.api_url, "https://cluster-a.example.com");
        assert_eq!(config.timeout_ms, TIMEOUT_CLUSTER_REQUEST_MS);
        assert!(!config.accept_invalid_certs);
    }

    #[test]
    fn with_bearer_token_clears_token_file() {
        let mut base = ClusterConfig::new("https://cluster.example.com");
        base.bearer_token_file = Some("/var/run/token".to_string());
        let derived = base.with_bearer_token("abc");
        assert_eq!(derived.bearer_token.as_deref(), Some("abc"));
        assert!(derived.bearer_token_file.is_none());
        // base is untouched
        assert!(base.bearer_token.is_none());
        assert!(base.bearer_token_file.is_some());
    }

    #[test]
    fn url_for_joins_without_double_slash() {
        let client =
            ClusterClient::new(ClusterConfig::new("https://cluster.example.com/")).expect("client");
        assert_eq!(
            client.url_for("/apis/experiments"),
            "https://cluster.example.com/apis/experiments"
        );
    }
}
