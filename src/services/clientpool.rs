use crate::constants::pool::DEFAULT_MAX_CLIENT_NUM;
use crate::constants::protocol::BEARER_PREFIX;
use crate::errors::ControlError;
use crate::services::cluster::{AuthClient, ClusterClient, ClusterConfig};
use crate::services::logger::Logger;
use crate::utils::lru::LruCache;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub type ClientFactory =
    Arc<dyn Fn(&ClusterConfig) -> Result<Arc<ClusterClient>, ControlError> + Send + Sync>;
pub type AuthClientFactory =
    Arc<dyn Fn(&ClusterConfig) -> Result<Arc<AuthClient>, ControlError> + Send + Sync>;

/// Capability surface of a client pool. The variant (multi-tenant pool or
/// single-tenant local client) is selected once at construction and never
/// switched at runtime.
pub trait Clients: Send + Sync {
    /// Cluster client scoped to the caller's bearer token.
    fn client(&self, token: &str) -> Result<Arc<ClusterClient>, ControlError>;

    /// Authorization-check client scoped to the caller's bearer token.
    fn auth_client(&self, token: &str) -> Result<Arc<AuthClient>, ControlError>;

    /// Client for an explicitly configured, operator-named cluster. The
    /// config bytes are consulted only on the first call per name.
    fn named_client(&self, name: &str, config: &[u8]) -> Result<Arc<ClusterClient>, ControlError>;

    /// Size of the bounded token-client cache.
    fn num(&self) -> usize;

    /// Whether a client is cached for this token. Does not refresh recency.
    fn contains(&self, token: &str) -> bool;
}

struct PoolState {
    clients: LruCache<String, Arc<ClusterClient>>,
    auth_clients: LruCache<String, Arc<AuthClient>>,
    named_clients: HashMap<String, Arc<ClusterClient>>,
}

/// Multi-tenant pool: one lazily built client per bearer token, bounded by
/// LRU eviction because token identities are caller-controlled; named
/// clients are unbounded because names are operator-controlled. One coarse
/// lock guards all three maps so each get-or-create runs exactly once.
pub struct ClientPool {
    logger: Logger,
    base_config: ClusterConfig,
    client_factory: ClientFactory,
    auth_client_factory: AuthClientFactory,
    state: RwLock<PoolState>,
}

impl ClientPool {
    pub fn new(logger: Logger, base_config: ClusterConfig, max_client_num: usize) -> Self {
        Self::with_factories(
            logger,
            base_config,
            max_client_num,
            Arc::new(|config| ClusterClient::new(config.clone()).map(Arc::new)),
            Arc::new(|config| AuthClient::new(config.clone()).map(Arc::new)),
        )
    }

    /// Construction seam for tests: the factories replace the real client
    /// constructors.
    pub fn with_factories(
        logger: Logger,
        base_config: ClusterConfig,
        max_client_num: usize,
        client_factory: ClientFactory,
        auth_client_factory: AuthClientFactory,
    ) -> Self {
        let capacity = if max_client_num == 0 {
            DEFAULT_MAX_CLIENT_NUM
        } else {
            max_client_num
        };
        Self {
            logger: logger.child("clientpool"),
            base_config,
            client_factory,
            auth_client_factory,
            state: RwLock::new(PoolState {
                clients: LruCache::new(capacity),
                auth_clients: LruCache::new(capacity),
                named_clients: HashMap::new(),
            }),
        }
    }
}

impl Clients for ClientPool {
    fn client(&self, token: &str) -> Result<Arc<ClusterClient>, ControlError> {
        if token.is_empty() {
            return Err(ControlError::empty_token());
        }
        let mut state = self
            .state
            .write()
            .map_err(|_| ControlError::internal("client pool lock poisoned"))?;
        if let Some(existing) = state.clients.get(token) {
            return Ok(existing.clone());
        }
        let config = self.base_config.with_bearer_token(token);
        let client = (self.client_factory)(&config)?;
        if state.clients.insert(token.to_string(), client.clone()).is_some() {
            self.logger.debug("evicted least recently used cluster client", None);
        }
        Ok(client)
    }

    fn auth_client(&self, token: &str) -> Result<Arc<AuthClient>, ControlError> {
        if token.is_empty() {
            return Err(ControlError::empty_token());
        }
        let mut state = self
            .state
            .write()
            .map_err(|_| ControlError::internal("client pool lock poisoned"))?;
        if let Some(existing) = state.auth_clients.get(token) {
            return Ok(existing.clone());
        }
        let config = self.base_config.with_bearer_token(token);
        let client = (self.auth_client_factory)(&config)?;
        if state.auth_clients.insert(token.to_string(), client.clone()).is_some() {
            self.logger.debug("evicted least recently used auth client", None);
        }
        Ok(client)
    }

    fn named_client(&self, name: &str, config: &[u8]) -> Result<Arc<ClusterClient>, ControlError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| ControlError::internal("client pool lock poisoned"))?;
        // First writer wins: once a name is bound, later configs are ignored.
        if let Some(existing) = state.named_clients.get(name) {
            return Ok(existing.clone());
        }
        let config = ClusterConfig::from_bytes(config)?;
        let client = (self.client_factory)(&config)?;
        state.named_clients.insert(name.to_string(), client.clone());
        self.logger.debug(
            "created named cluster client",
            Some(&serde_json::json!({ "name": name })),
        );
        Ok(client)
    }

    fn num(&self) -> usize {
        self.state.read().map(|state| state.clients.len()).unwrap_or(0)
    }

    fn contains(&self, token: &str) -> bool {
        self.state
            .read()
            .map(|state| state.clients.contains(token))
            .unwrap_or(false)
    }
}

/// Single-tenant variant used when multi-tenant credential scoping is
/// disabled: every call resolves to one fixed pre-built client pair under
/// the process's ambient identity.
pub struct LocalClient {
    client: Arc<ClusterClient>,
    auth_client: Arc<AuthClient>,
}

impl LocalClient {
    pub fn new(config: ClusterConfig) -> Result<Self, ControlError> {
        Ok(Self {
            client: Arc::new(ClusterClient::new(config.clone())?),
            auth_client: Arc::new(AuthClient::new(config)?),
        })
    }
}

impl Clients for LocalClient {
    fn client(&self, _token: &str) -> Result<Arc<ClusterClient>, ControlError> {
        Ok(self.client.clone())
    }

    fn auth_client(&self, _token: &str) -> Result<Arc<AuthClient>, ControlError> {
        Ok(self.auth_client.clone())
    }

    fn named_client(&self, _name: &str, _config: &[u8]) -> Result<Arc<ClusterClient>, ControlError> {
        Ok(self.client.clone())
    }

    fn num(&self) -> usize {
        1
    }

    fn contains(&self, _token: &str) -> bool {
        false
    }
}

/// Extracts the bearer token from an `Authorization` header value. Anything
/// without the exact `Bearer ` prefix yields an empty token, which the pool
/// rejects downstream.
pub fn extract_token(header_value: Option<&str>) -> String {
    header_value
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::to_string)
        .unwrap_or_default()
}

pub fn extract_token_from_headers(headers: &HeaderMap) -> String {
    extract_token(headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()))
}
