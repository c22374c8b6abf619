//! Process-wide entry point: owns the loaded configuration, the processor and
//! the polling schedule, and implements enable/disable/reload.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::{load_config, validate_config, Config, ConfigError, SanitizedConfig};
use crate::processor::{CycleReport, DeliveryProcessor};
use crate::scheduler::{PollScheduler, SchedulerError, SchedulerStatus};

/// Errors that can occur while reloading.
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("no configuration file to reload from")]
    NoConfigPath,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Status snapshot for operators.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeStatus {
    pub version: &'static str,
    pub config: SanitizedConfig,
    pub scheduler: SchedulerStatus,
}

/// The delivery bridge.
pub struct DeliveryBridge {
    config_path: Option<PathBuf>,
    config: RwLock<Config>,
    processor: Arc<DeliveryProcessor>,
    scheduler: PollScheduler,
}

impl DeliveryBridge {
    pub fn new(config: Config, processor: Arc<DeliveryProcessor>) -> Self {
        let scheduler = PollScheduler::new(Arc::clone(&processor));
        Self {
            config_path: None,
            config: RwLock::new(config),
            processor,
            scheduler,
        }
    }

    /// File that `reload` reads from.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Override the delay before the first scheduled cycle.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.scheduler = self.scheduler.with_initial_delay(delay);
        self
    }

    /// Start polling if `polling.enabled`.
    pub async fn enable(&self) -> Result<(), SchedulerError> {
        let polling = self.config.read().await.polling.clone();
        if polling.enabled {
            self.scheduler.start(polling.interval_duration()).await
        } else {
            info!("Polling disabled in config");
            Ok(())
        }
    }

    /// Stop polling. In-flight cycles finish on their own.
    pub async fn disable(&self) {
        self.scheduler.stop().await;
    }

    /// Re-read the configuration file, swap command lists and restart the
    /// schedule with the new interval.
    ///
    /// On error the previous configuration stays active. The backend client
    /// keeps the URL and key it was built with.
    pub async fn reload(&self) -> Result<(), ReloadError> {
        let path = self.config_path.as_ref().ok_or(ReloadError::NoConfigPath)?;
        let config = load_config(path)?;
        validate_config(&config)?;
        self.apply(config).await?;
        Ok(())
    }

    /// Install an already loaded configuration.
    pub async fn apply(&self, config: Config) -> Result<(), SchedulerError> {
        self.processor.reload(&config).await;
        let polling = config.polling.clone();
        *self.config.write().await = config;

        self.scheduler.stop().await;
        if polling.enabled {
            self.scheduler.start(polling.interval_duration()).await?;
        }
        info!("Configuration reloaded");
        Ok(())
    }

    /// Run one polling cycle now.
    pub fn poll(&self) -> JoinHandle<CycleReport> {
        self.scheduler.manual_trigger()
    }

    /// Snapshot of the active configuration.
    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }

    pub async fn status(&self) -> BridgeStatus {
        BridgeStatus {
            version: crate::VERSION,
            config: SanitizedConfig::from(&*self.config.read().await),
            scheduler: self.scheduler.status().await,
        }
    }

    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }
}
