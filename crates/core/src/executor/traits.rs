//! Trait definitions for the executor module.

use async_trait::async_trait;

use super::error::ExecutionError;

/// Runs console commands against the live game server.
///
/// Implementations are only ever driven from the dispatch context, one call at
/// a time, so they may assume exclusive access to game state.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Returns the name of this executor implementation.
    fn name(&self) -> &str;

    /// Execute one fully rendered command.
    async fn execute(&self, command: &str) -> Result<(), ExecutionError>;

    /// Send a message to a player if they are currently reachable.
    ///
    /// Best-effort: returns whether the player was reached. The default
    /// implementation has no way to reach players.
    async fn notify(&self, _username: &str, _lines: &[String]) -> bool {
        false
    }
}
