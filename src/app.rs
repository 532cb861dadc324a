use crate::constants::network::TIMEOUT_ATTACK_REQUEST_MS;
use crate::constants::pool::DEFAULT_MAX_CLIENT_NUM;
use crate::errors::ControlError;
use crate::managers::attack::PhysicalMachineExecutor;
use crate::services::clientpool::{ClientPool, Clients, LocalClient};
use crate::services::cluster::ClusterConfig;
use crate::services::logger::Logger;
use std::sync::Arc;

/// Process-level settings, supplied once at startup and immutable afterwards.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_config: ClusterConfig,
    pub max_client_num: usize,
    /// When false the process runs under one ambient identity and the pool
    /// degenerates to a single fixed client pair.
    pub multi_tenant: bool,
    pub attack_timeout_ms: Option<u64>,
}

impl Settings {
    pub fn new(base_config: ClusterConfig) -> Self {
        Self {
            base_config,
            max_client_num: DEFAULT_MAX_CLIENT_NUM,
            multi_tenant: true,
            attack_timeout_ms: None,
        }
    }
}

/// Explicitly wired control plane. There is no process-wide singleton:
/// request handlers receive the pool by reference from here.
pub struct ControlPlane {
    pub logger: Logger,
    pub clients: Arc<dyn Clients>,
    pub executor: Arc<PhysicalMachineExecutor>,
}

impl ControlPlane {
    pub fn initialize(settings: Settings) -> Result<Self, ControlError> {
        let logger = Logger::new("chaosctl");
        settings.base_config.validate()?;

        let clients: Arc<dyn Clients> = if settings.multi_tenant {
            Arc::new(ClientPool::new(
                logger.clone(),
                settings.base_config.clone(),
                settings.max_client_num,
            ))
        } else {
            Arc::new(LocalClient::new(settings.base_config.clone())?)
        };

        let executor = Arc::new(PhysicalMachineExecutor::with_timeout(
            logger.clone(),
            settings.attack_timeout_ms.unwrap_or(TIMEOUT_ATTACK_REQUEST_MS),
        )?);

        Ok(Self {
            logger,
            clients,
            executor,
        })
    }
}
