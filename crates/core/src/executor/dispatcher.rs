use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use super::{panic_message, ActionExecutor, DispatchError};

/// Work handed to the dispatch context.
enum DispatchJob {
    Run {
        commands: Vec<String>,
        reply: oneshot::Sender<Result<(), DispatchError>>,
    },
    Notify {
        username: String,
        lines: Vec<String>,
        reply: oneshot::Sender<bool>,
    },
}

/// Handle for running action lists on the dispatch context.
///
/// This is cheaply cloneable and can be shared across tasks.
#[derive(Clone)]
pub struct ActionDispatcher {
    tx: mpsc::Sender<DispatchJob>,
}

impl ActionDispatcher {
    /// Run commands in order on the dispatch context, stopping at the first
    /// failure.
    ///
    /// The whole list runs as one unit: commands from other deliveries are
    /// never interleaved with it.
    pub async fn run(&self, commands: Vec<String>) -> Result<(), DispatchError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(DispatchJob::Run { commands, reply })
            .await
            .map_err(|_| DispatchError::ContextClosed)?;

        // A dropped reply means the worker went away mid-job.
        rx.await.map_err(|_| DispatchError::ContextClosed)?
    }

    /// Ask the executor to message a player. Returns whether they were reached.
    pub async fn notify(&self, username: &str, lines: Vec<String>) -> bool {
        let (reply, rx) = oneshot::channel();
        let job = DispatchJob::Notify {
            username: username.to_string(),
            lines,
            reply,
        };
        if self.tx.send(job).await.is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Whether the dispatch worker is still accepting work.
    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// The single task that owns the executor and runs every command.
pub struct DispatchWorker {
    rx: mpsc::Receiver<DispatchJob>,
    executor: Box<dyn ActionExecutor>,
}

impl DispatchWorker {
    /// Run the worker, consuming jobs until every dispatcher handle is dropped.
    ///
    /// This should be spawned as a background task (or driven by the host's
    /// main loop).
    pub async fn run(mut self) {
        info!(executor = self.executor.name(), "Dispatch worker started");

        while let Some(job) = self.rx.recv().await {
            match job {
                DispatchJob::Run { commands, reply } => {
                    let result = AssertUnwindSafe(run_commands(self.executor.as_ref(), &commands))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|payload| {
                            let message = panic_message(payload.as_ref());
                            error!("Executor panicked: {}", message);
                            Err(DispatchError::Panicked(message))
                        });
                    let _ = reply.send(result);
                }
                DispatchJob::Notify {
                    username,
                    lines,
                    reply,
                } => {
                    let reached = AssertUnwindSafe(self.executor.notify(&username, &lines))
                        .catch_unwind()
                        .await
                        .unwrap_or(false);
                    let _ = reply.send(reached);
                }
            }
        }

        info!("Dispatch worker shutting down");
    }
}

async fn run_commands(
    executor: &dyn ActionExecutor,
    commands: &[String],
) -> Result<(), DispatchError> {
    for command in commands {
        debug!(command = %command, "Executing command");
        if let Err(source) = executor.execute(command).await {
            error!("Failed to execute command '{}': {}", command, source);
            return Err(DispatchError::Action {
                command: command.clone(),
                source,
            });
        }
    }
    Ok(())
}

/// Create a dispatch context
///
/// Returns:
/// - `ActionDispatcher` - clone this to share across worker tasks
/// - `DispatchWorker` - spawn this with `tokio::spawn(worker.run())`
///
/// # Arguments
/// * `executor` - The host's command executor; only the worker touches it
/// * `buffer_size` - Size of the job queue (senders wait if full)
pub fn create_dispatch_context(
    executor: Box<dyn ActionExecutor>,
    buffer_size: usize,
) -> (ActionDispatcher, DispatchWorker) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (ActionDispatcher { tx }, DispatchWorker { rx, executor })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockExecutor;

    fn spawn_context(executor: &MockExecutor) -> ActionDispatcher {
        let (dispatcher, worker) = create_dispatch_context(Box::new(executor.clone()), 8);
        tokio::spawn(worker.run());
        dispatcher
    }

    fn commands(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_runs_commands_in_order() {
        let executor = MockExecutor::new();
        let dispatcher = spawn_context(&executor);

        dispatcher
            .run(commands(&["say one", "say two", "say three"]))
            .await
            .unwrap();

        assert_eq!(
            executor.executed().await,
            vec!["say one", "say two", "say three"]
        );
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let executor = MockExecutor::new();
        executor.fail_on("say two").await;
        let dispatcher = spawn_context(&executor);

        let err = dispatcher
            .run(commands(&["say one", "say two", "say three"]))
            .await
            .unwrap_err();

        match err {
            DispatchError::Action { command, .. } => assert_eq!(command, "say two"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(executor.executed().await, vec!["say one", "say two"]);
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let executor = MockExecutor::new();
        executor.panic_on("explode").await;
        let dispatcher = spawn_context(&executor);

        let err = dispatcher.run(commands(&["explode"])).await.unwrap_err();
        assert!(matches!(err, DispatchError::Panicked(ref m) if m.contains("explode")));

        // The worker survives and keeps serving jobs.
        dispatcher.run(commands(&["say after"])).await.unwrap();
        assert!(executor.executed().await.contains(&"say after".to_string()));
    }

    #[tokio::test]
    async fn test_closed_context() {
        let executor = MockExecutor::new();
        let (dispatcher, worker) = create_dispatch_context(Box::new(executor), 8);
        drop(worker);

        assert!(!dispatcher.is_running());
        let err = dispatcher.run(commands(&["say hi"])).await.unwrap_err();
        assert!(matches!(err, DispatchError::ContextClosed));
        assert!(!dispatcher.notify("Alice", vec!["hi".to_string()]).await);
    }

    #[tokio::test]
    async fn test_notify_forwards_to_executor() {
        let executor = MockExecutor::new();
        executor.set_online(&["Alice"]).await;
        let dispatcher = spawn_context(&executor);

        assert!(dispatcher.notify("Alice", vec!["hello".to_string()]).await);
        assert!(!dispatcher.notify("Bob", vec!["hello".to_string()]).await);

        let notified = executor.notifications().await;
        assert_eq!(notified.len(), 1);
        assert_eq!(notified[0].0, "Alice");
    }
}
