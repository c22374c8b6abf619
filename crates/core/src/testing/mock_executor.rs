//! Mock command executor for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::executor::{ActionExecutor, ExecutionError};

/// Mock implementation of the `ActionExecutor` trait.
///
/// Cloning shares state, so a test can keep one clone for assertions while
/// the dispatch worker owns another.
#[derive(Debug, Clone, Default)]
pub struct MockExecutor {
    /// Every command received, in order, including ones that failed.
    executed: Arc<RwLock<Vec<String>>>,
    /// Commands that return an error.
    failing: Arc<RwLock<HashSet<String>>>,
    /// Commands that panic.
    panicking: Arc<RwLock<HashSet<String>>>,
    /// Players reachable by `notify`.
    online: Arc<RwLock<HashSet<String>>>,
    /// Messages delivered to online players.
    notifications: Arc<RwLock<Vec<(String, Vec<String>)>>>,
    /// Simulated time per command.
    delay: Arc<RwLock<Option<Duration>>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `command` fail with a "mock failure" error.
    pub async fn fail_on(&self, command: &str) {
        self.failing.write().await.insert(command.to_string());
    }

    /// Make `command` panic.
    pub async fn panic_on(&self, command: &str) {
        self.panicking.write().await.insert(command.to_string());
    }

    /// Set which players are online.
    pub async fn set_online(&self, usernames: &[&str]) {
        *self.online.write().await = usernames.iter().map(|u| u.to_string()).collect();
    }

    /// Sleep this long inside every `execute` call.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    pub async fn executed(&self) -> Vec<String> {
        self.executed.read().await.clone()
    }

    pub async fn execute_count(&self) -> usize {
        self.executed.read().await.len()
    }

    /// `(username, lines)` for every player that was reached.
    pub async fn notifications(&self) -> Vec<(String, Vec<String>)> {
        self.notifications.read().await.clone()
    }
}

#[async_trait]
impl ActionExecutor for MockExecutor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn execute(&self, command: &str) -> Result<(), ExecutionError> {
        self.executed.write().await.push(command.to_string());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.panicking.read().await.contains(command) {
            panic!("mock panic on '{}'", command);
        }
        if self.failing.read().await.contains(command) {
            return Err(ExecutionError::command_failed(format!(
                "mock failure for '{}'",
                command
            )));
        }
        Ok(())
    }

    async fn notify(&self, username: &str, lines: &[String]) -> bool {
        if !self.online.read().await.contains(username) {
            return false;
        }
        self.notifications
            .write()
            .await
            .push((username.to_string(), lines.to_vec()));
        true
    }
}
