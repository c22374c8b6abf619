//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the backend and executor
//! traits plus a recording operator, so the whole bridge can be exercised
//! without a store backend or a game server.
//!
//! # Example
//!
//! ```rust,ignore
//! use rankdelivery_core::testing::{fixtures, MockBackend, MockExecutor};
//!
//! let backend = MockBackend::new();
//! let executor = MockExecutor::new();
//!
//! backend.set_pending(vec![fixtures::delivery("d1", "Alice", "java", "vip")]).await;
//! executor.fail_on("say oops").await;
//! ```

mod mock_backend;
mod mock_executor;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::console::CommandSender;

pub use mock_backend::{MockBackend, RecordedReport};
pub use mock_executor::MockExecutor;

/// Operator that records every message it is sent.
#[derive(Debug)]
pub struct RecordingSender {
    admin: bool,
    messages: Mutex<Vec<String>>,
}

impl RecordingSender {
    /// Operator holding every permission.
    pub fn admin() -> Arc<Self> {
        Arc::new(Self {
            admin: true,
            messages: Mutex::new(Vec::new()),
        })
    }

    /// Operator holding no permissions.
    pub fn without_permissions() -> Arc<Self> {
        Arc::new(Self {
            admin: false,
            messages: Mutex::new(Vec::new()),
        })
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Wait until a message matching `predicate` arrives.
    pub async fn wait_for(
        &self,
        predicate: impl Fn(&str) -> bool,
        timeout: Duration,
    ) -> Option<String> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(found) = self.messages().into_iter().find(|m| predicate(m)) {
                return Some(found);
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl CommandSender for RecordingSender {
    fn has_permission(&self, _permission: &str) -> bool {
        self.admin
    }

    fn send_message(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.to_string());
    }
}

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::backend::PendingDelivery;

    /// Create a pending delivery.
    pub fn delivery(id: &str, username: &str, platform: &str, package: &str) -> PendingDelivery {
        PendingDelivery {
            id: id.to_string(),
            username: username.to_string(),
            platform: platform.to_string(),
            package: package.to_string(),
        }
    }
}
