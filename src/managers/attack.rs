use crate::constants::network::TIMEOUT_ATTACK_REQUEST_MS;
use crate::constants::protocol::{ATTACK_PATH, TAG_HEADER, TAG_HEADER_VALUE};
use crate::errors::ControlError;
use crate::experiment::{ExperimentSpec, Phase, Record};
use crate::services::logger::Logger;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use std::time::Duration;

/// Apply/Recover contract between the reconciler and one chaos backend.
///
/// The returned phase is the injection state the caller must record after
/// the call, error or not: a failed or cancelled apply leaves the target
/// `NotInjected`, a failed or cancelled recover leaves it `Injected`, so
/// retrying either direction is always safe. The executor itself holds no
/// per-target state; the remote agent is the source of truth, keyed by the
/// experiment uid.
#[async_trait]
pub trait ChaosExecutor: Send + Sync {
    async fn apply(
        &self,
        target_index: usize,
        records: &[Record],
        experiment: &ExperimentSpec,
    ) -> (Phase, Option<ControlError>);

    async fn recover(
        &self,
        target_index: usize,
        records: &[Record],
        experiment: &ExperimentSpec,
    ) -> (Phase, Option<ControlError>);
}

/// Executor for physical-machine targets: injects by POSTing the action to
/// the target's agent and recovers by DELETEing the experiment uid.
pub struct PhysicalMachineExecutor {
    logger: Logger,
    http: Client,
    timeout_ms: u64,
}

impl PhysicalMachineExecutor {
    pub fn new(logger: Logger) -> Result<Self, ControlError> {
        Self::with_timeout(logger, TIMEOUT_ATTACK_REQUEST_MS)
    }

    pub fn with_timeout(logger: Logger, timeout_ms: u64) -> Result<Self, ControlError> {
        let http = Client::builder().build().map_err(|err| {
            ControlError::client_build(format!("failed to build attack client: {}", err))
        })?;
        Ok(Self {
            logger: logger.child("physical-machine"),
            http,
            timeout_ms,
        })
    }

    fn resolve_address<'a>(
        &self,
        target_index: usize,
        records: &'a [Record],
    ) -> Result<&'a str, ControlError> {
        let record = records.get(target_index).ok_or_else(|| {
            ControlError::invalid_params(format!(
                "target index {} out of range ({} records)",
                target_index,
                records.len()
            ))
        })?;
        if record.id.trim().is_empty() {
            return Err(ControlError::invalid_params("record id is empty"));
        }
        Ok(&record.id)
    }

    // Record ids are usually bare host:port; agents speak plain HTTP unless
    // the selector already resolved a full URL.
    fn attack_url(address: &str, suffix: &str) -> String {
        let base = if address.contains("://") {
            address.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", address.trim_end_matches('/'))
        };
        format!("{}{}/{}", base, ATTACK_PATH, suffix)
    }

    async fn send(&self, method: Method, url: &str, body: Option<String>) -> Result<(), ControlError> {
        let mut request = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .header(TAG_HEADER, TAG_HEADER_VALUE);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = tokio::time::timeout(Duration::from_millis(self.timeout_ms), request.send())
            .await
            .map_err(|_| ControlError::timeout("attack request timed out"))?
            .map_err(map_reqwest_error)?;

        let status = response.status();
        // Read the body regardless of status so failures stay diagnosable.
        let body = response.text().await.map_err(|err| {
            ControlError::response_read(format!("failed to read agent response: {}", err))
        })?;
        self.logger.debug(
            "agent response",
            Some(&serde_json::json!({ "url": url, "status": status.as_u16(), "body": body })),
        );

        if status != StatusCode::OK {
            return Err(ControlError::status_not_ok(status.as_u16())
                .with_details(serde_json::json!({ "url": url, "body": body })));
        }
        Ok(())
    }
}

#[async_trait]
impl ChaosExecutor for PhysicalMachineExecutor {
    async fn apply(
        &self,
        target_index: usize,
        records: &[Record],
        experiment: &ExperimentSpec,
    ) -> (Phase, Option<ControlError>) {
        self.logger.info(
            "apply physical machine chaos",
            Some(&serde_json::json!({ "action": experiment.action.as_str(), "uid": experiment.uid })),
        );
        let address = match self.resolve_address(target_index, records) {
            Ok(address) => address,
            Err(err) => return (Phase::NotInjected, Some(err)),
        };
        // Merged fresh on every apply: the uid is assigned per experiment
        // instance and must never come from a stale payload.
        let payload = match experiment.attack_payload() {
            Ok(payload) => payload,
            Err(err) => {
                self.logger.error(
                    "failed to build experiment payload",
                    Some(&serde_json::json!({ "error": err.to_string() })),
                );
                return (Phase::NotInjected, Some(err));
            }
        };
        let url = Self::attack_url(address, experiment.action.as_str());
        match self.send(Method::POST, &url, Some(payload)).await {
            Ok(()) => (Phase::Injected, None),
            Err(err) => {
                self.logger.error(
                    "apply attack failed",
                    Some(&serde_json::json!({ "url": url, "error": err.to_string() })),
                );
                (Phase::NotInjected, Some(err))
            }
        }
    }

    async fn recover(
        &self,
        target_index: usize,
        records: &[Record],
        experiment: &ExperimentSpec,
    ) -> (Phase, Option<ControlError>) {
        self.logger.info(
            "recover physical machine chaos",
            Some(&serde_json::json!({ "uid": experiment.uid })),
        );
        let address = match self.resolve_address(target_index, records) {
            Ok(address) => address,
            Err(err) => return (Phase::Injected, Some(err)),
        };
        // Recovery is addressed by uid, not by action name.
        let url = Self::attack_url(address, &experiment.uid);
        match self.send(Method::DELETE, &url, None).await {
            Ok(()) => (Phase::NotInjected, None),
            Err(err) => {
                self.logger.error(
                    "recover attack failed",
                    Some(&serde_json::json!({ "url": url, "error": err.to_string() })),
                );
                (Phase::Injected, Some(err))
            }
        }
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ControlError {
    if err.is_timeout() {
        return ControlError::timeout("attack request timed out");
    }
    if err.is_connect() {
        return ControlError::transport(format!("failed to reach agent: {}", err));
    }
    if err.is_builder() {
        return ControlError::request_build(err.to_string());
    }
    ControlError::transport(err.to_string())
}
