//! Command execution on the game server.
//!
//! The host decides where game state may be mutated. This module models that
//! as a single dispatch context:
//! - `ActionExecutor`: the host's capability to run one console command
//! - `ActionDispatcher`: cheap, cloneable handle used by worker tasks
//! - `DispatchWorker`: the one task that owns the executor and runs every
//!   command, one delivery at a time
//!
//! Worker tasks (fetching, reporting) never touch the executor directly; they
//! hand a whole action list to the dispatcher and wait for the result.

mod dispatcher;
mod error;
mod logging;
mod process;
mod traits;

pub use dispatcher::{create_dispatch_context, ActionDispatcher, DispatchWorker};
pub use error::{DispatchError, ExecutionError};
pub(crate) use error::panic_message;
pub use logging::LoggingExecutor;
pub use process::ProcessExecutor;
pub use traits::ActionExecutor;
