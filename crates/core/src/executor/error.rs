//! Error types for the executor module.

use std::any::Any;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by an `ActionExecutor` for a single command.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The server rejected or failed the command.
    #[error("command failed: {reason}")]
    CommandFailed { reason: String },

    /// Dispatch program not found.
    #[error("dispatch program not found at path: {path}")]
    ProgramNotFound { path: PathBuf },

    /// Command did not finish in time.
    #[error("command timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error while running the command.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExecutionError {
    /// Creates a new command failed error.
    pub fn command_failed(reason: impl Into<String>) -> Self {
        Self::CommandFailed {
            reason: reason.into(),
        }
    }
}

/// Errors from handing an action list to the dispatch context.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A command failed; the remaining commands were not run.
    #[error("Failed to execute command '{command}': {source}")]
    Action {
        command: String,
        #[source]
        source: ExecutionError,
    },

    /// The executor panicked while running the action list.
    #[error("Unexpected error while executing commands: {0}")]
    Panicked(String),

    /// The dispatch context has shut down.
    #[error("Command dispatch context is not running")]
    ContextClosed,
}

/// Text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
