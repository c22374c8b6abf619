//! Dry-run executor: logs commands instead of running them.

use async_trait::async_trait;
use tracing::info;

use super::{ActionExecutor, ExecutionError};

/// Executor used when no dispatch program is configured.
#[derive(Debug, Default)]
pub struct LoggingExecutor;

impl LoggingExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ActionExecutor for LoggingExecutor {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn execute(&self, command: &str) -> Result<(), ExecutionError> {
        info!(command, "Dry-run: command not sent to server");
        Ok(())
    }
}
