//! Operator command surface (`/rd`, `/rd reload`, `/rd status`, `/rd poll`).
//!
//! The host owns command registration and message display; it hands each
//! invocation here together with a `CommandSender` for permission checks and
//! replies.

use std::sync::Arc;

use tracing::{error, info};

use crate::bridge::DeliveryBridge;

/// Permission required for every operator command.
pub const ADMIN_PERMISSION: &str = "rankdelivery.admin";

/// Whoever issued an operator command.
pub trait CommandSender: Send + Sync {
    fn has_permission(&self, permission: &str) -> bool;
    fn send_message(&self, message: &str);
}

/// Parsed operator subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    Help,
    Reload,
    Status,
    Poll,
    Unknown(String),
}

impl OperatorCommand {
    /// Parse from the arguments after the command label. Case-insensitive.
    pub fn parse(args: &[&str]) -> Self {
        let Some(first) = args.first() else {
            return Self::Help;
        };
        match first.to_lowercase().as_str() {
            "reload" => Self::Reload,
            "status" => Self::Status,
            "poll" => Self::Poll,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Run an operator command on behalf of `sender`.
///
/// `poll` returns right away; the completion message is sent from the
/// background task once the cycle finishes.
pub async fn handle_command(
    bridge: &Arc<DeliveryBridge>,
    sender: Arc<dyn CommandSender>,
    args: &[&str],
) {
    if !sender.has_permission(ADMIN_PERMISSION) {
        sender.send_message("You don't have permission to use this command.");
        return;
    }

    match OperatorCommand::parse(args) {
        OperatorCommand::Help => {
            for line in help_lines() {
                sender.send_message(&line);
            }
        }
        OperatorCommand::Reload => match bridge.reload().await {
            Ok(()) => sender.send_message("Configuration reloaded!"),
            Err(e) => {
                error!("Failed to reload configuration: {}", e);
                sender.send_message(&format!("Failed to reload configuration: {}", e));
            }
        },
        OperatorCommand::Status => {
            for line in status_lines(bridge).await {
                sender.send_message(&line);
            }
        }
        OperatorCommand::Poll => {
            sender.send_message("Manually polling for pending deliveries...");
            let cycle = bridge.poll();
            tokio::spawn(async move {
                match cycle.await {
                    Ok(report) if report.skipped => {
                        sender.send_message("A polling cycle is already running, try again later.")
                    }
                    Ok(report) => sender.send_message(&format!(
                        "Poll complete! {} fetched, {} completed, {} failed",
                        report.fetched, report.completed, report.failed
                    )),
                    Err(e) => {
                        error!("Manual poll task failed: {}", e);
                        sender.send_message("Poll failed, see server log.");
                    }
                }
            });
            info!("Manual poll requested");
        }
        OperatorCommand::Unknown(sub) => {
            sender.send_message(&format!(
                "Unknown subcommand '{}'. Use /rd for help.",
                sub
            ));
        }
    }
}

fn help_lines() -> Vec<String> {
    vec![
        "Rank Delivery".to_string(),
        format!("Version: {}", crate::VERSION),
        "Status: Running".to_string(),
        "Commands:".to_string(),
        "  /rd reload - Reload configuration".to_string(),
        "  /rd status - Check plugin status".to_string(),
        "  /rd poll - Manually poll for deliveries".to_string(),
    ]
}

async fn status_lines(bridge: &DeliveryBridge) -> Vec<String> {
    let status = bridge.status().await;
    let mut lines = vec![
        "Plugin Status".to_string(),
        format!("API URL: {}", status.config.api_url),
        format!(
            "Polling: {}",
            if status.config.polling.enabled {
                "Enabled"
            } else {
                "Disabled"
            }
        ),
        format!("Interval: {}s", status.config.polling.interval),
    ];

    if let Some(last) = status.scheduler.last_cycle {
        lines.push(format!(
            "Last poll: {} ({} fetched, {} completed, {} failed)",
            last.finished_at.format("%Y-%m-%d %H:%M:%S UTC"),
            last.fetched,
            last.completed,
            last.failed
        ));
    }
    lines
}
