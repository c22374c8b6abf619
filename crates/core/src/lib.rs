pub mod backend;
pub mod bridge;
pub mod config;
pub mod console;
pub mod executor;
pub mod processor;
pub mod scheduler;
pub mod testing;

pub use backend::{BackendError, DeliveryBackend, HttpBackendClient, PendingDelivery};
pub use bridge::{BridgeStatus, DeliveryBridge, ReloadError};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use console::{handle_command, CommandSender, OperatorCommand, ADMIN_PERMISSION};
pub use executor::{
    create_dispatch_context, ActionDispatcher, ActionExecutor, DispatchError, DispatchWorker,
    ExecutionError, LoggingExecutor, ProcessExecutor,
};
pub use processor::{CycleReport, DeliveryOutcome, DeliveryProcessor};
pub use scheduler::{PollScheduler, SchedulerError, SchedulerStatus};

/// Crate version, shown in operator help and status output.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
