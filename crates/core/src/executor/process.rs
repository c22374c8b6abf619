//! Executor that runs each command through an external program
//! (an RCON client, `tmux send-keys`, a wrapper script...).

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::DispatchConfig;

use super::{ActionExecutor, ExecutionError};

/// Runs `program [args...] <command>` for every command.
pub struct ProcessExecutor {
    config: DispatchConfig,
}

impl ProcessExecutor {
    pub fn new(config: DispatchConfig) -> Self {
        Self { config }
    }

    async fn run(&self, command: &str) -> Result<(), ExecutionError> {
        let child = Command::new(&self.config.program)
            .args(&self.config.args)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ExecutionError::ProgramNotFound {
                        path: self.config.program.clone(),
                    }
                } else {
                    ExecutionError::Io(e)
                }
            })?;

        let output = timeout(
            Duration::from_secs(self.config.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| ExecutionError::Timeout {
            timeout_secs: self.config.timeout_secs,
        })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            let reason = if stderr.is_empty() {
                format!("dispatch program exited with {}", output.status)
            } else {
                stderr.to_string()
            };
            return Err(ExecutionError::command_failed(reason));
        }

        debug!(
            stdout = %String::from_utf8_lossy(&output.stdout).trim(),
            "Dispatch program finished"
        );
        Ok(())
    }
}

#[async_trait]
impl ActionExecutor for ProcessExecutor {
    fn name(&self) -> &str {
        "process"
    }

    async fn execute(&self, command: &str) -> Result<(), ExecutionError> {
        self.run(command).await
    }

    async fn notify(&self, username: &str, lines: &[String]) -> bool {
        let Some(template) = &self.config.notify_template else {
            return false;
        };

        for line in lines {
            let command = template
                .replace("{username}", username)
                .replace("{message}", line);
            if let Err(e) = self.run(&command).await {
                warn!(username, "Failed to notify player: {}", e);
                return false;
            }
        }
        true
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(program: &str, args: &[&str]) -> DispatchConfig {
        DispatchConfig {
            program: PathBuf::from(program),
            args: args.iter().map(|s| s.to_string()).collect(),
            timeout_secs: 5,
            notify_template: None,
        }
    }

    #[tokio::test]
    async fn test_successful_command() {
        let executor = ProcessExecutor::new(config("true", &[]));
        assert!(executor.execute("say hello").await.is_ok());
    }

    #[tokio::test]
    async fn test_command_is_last_argument() {
        // sh -c 'script' <name> <command>: $1 is the rendered command
        let executor = ProcessExecutor::new(config(
            "sh",
            &["-c", "test \"$1\" = 'give Alice diamond' || exit 3", "sh"],
        ));
        assert!(executor.execute("give Alice diamond").await.is_ok());
        assert!(executor.execute("give Bob diamond").await.is_err());
    }

    #[tokio::test]
    async fn test_failure_carries_stderr() {
        let executor = ProcessExecutor::new(config(
            "sh",
            &["-c", "echo 'Unknown command' >&2; exit 1", "sh"],
        ));
        let err = executor.execute("bogus").await.unwrap_err();
        assert!(matches!(err, ExecutionError::CommandFailed { ref reason } if reason == "Unknown command"));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let executor = ProcessExecutor::new(config("/nonexistent/rcon-client", &[]));
        let err = executor.execute("say hi").await.unwrap_err();
        assert!(matches!(err, ExecutionError::ProgramNotFound { .. }));
    }

    #[tokio::test]
    async fn test_timeout() {
        let mut cfg = config("sleep", &[]);
        cfg.timeout_secs = 1;
        let executor = ProcessExecutor::new(cfg);
        let err = executor.execute("5").await.unwrap_err();
        assert!(matches!(err, ExecutionError::Timeout { timeout_secs: 1 }));
    }

    #[tokio::test]
    async fn test_notify_without_template() {
        let executor = ProcessExecutor::new(config("true", &[]));
        assert!(!executor.notify("Alice", &["hi".to_string()]).await);
    }

    #[tokio::test]
    async fn test_notify_with_template() {
        let mut cfg = config("true", &[]);
        cfg.notify_template = Some("tell {username} {message}".to_string());
        let executor = ProcessExecutor::new(cfg);
        assert!(executor.notify("Alice", &["hi".to_string()]).await);
    }
}
