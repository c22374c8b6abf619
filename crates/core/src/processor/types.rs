//! Types for the processor module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::backend::PendingDelivery;
use crate::config::Config;

/// Package name to ordered command templates.
///
/// Swapped wholesale on reload; never edited in place.
#[derive(Debug, Clone, Default)]
pub struct ActionCatalog {
    packages: BTreeMap<String, Vec<String>>,
}

impl ActionCatalog {
    pub fn new(packages: BTreeMap<String, Vec<String>>) -> Self {
        Self { packages }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.commands.clone())
    }

    /// Templates for a package. `None` when missing or empty.
    pub fn actions_for(&self, package: &str) -> Option<&[String]> {
        self.packages
            .get(package)
            .filter(|actions| !actions.is_empty())
            .map(Vec::as_slice)
    }

    /// Number of configured packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Substitute `{username}` and `{platform}` in a command template.
pub fn render_action(template: &str, delivery: &PendingDelivery) -> String {
    template
        .replace("{username}", &delivery.username)
        .replace("{platform}", &delivery.platform)
}

/// Reason reported when a package has nothing to run.
pub fn no_actions_reason(package: &str) -> String {
    format!("No commands configured for package: {}", package)
}

/// Lines sent to the player after a successful delivery.
pub fn delivery_message(package: &str) -> Vec<String> {
    vec![
        "RANK DELIVERY".to_string(),
        format!("You have received: {}", package),
        "Thank you for your purchase!".to_string(),
    ]
}

/// Terminal state of one delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Completed,
    Failed { reason: String },
}

impl DeliveryOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Failure reason, if failed.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Completed => None,
            Self::Failed { reason } => Some(reason),
        }
    }
}

/// What happened to one delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub delivery_id: String,
    pub package: String,
    pub outcome: DeliveryOutcome,
    /// Whether the backend acknowledged the report call.
    pub acknowledged: bool,
}

/// Summary of one polling cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Deliveries returned by the backend.
    pub fetched: usize,
    pub completed: usize,
    pub failed: usize,
    /// Report calls the backend did not acknowledge.
    pub unacknowledged: usize,
    /// True when another cycle was already running and this one did nothing.
    pub skipped: bool,
}

impl CycleReport {
    pub(crate) fn begin() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            fetched: 0,
            completed: 0,
            failed: 0,
            unacknowledged: 0,
            skipped: false,
        }
    }

    pub(crate) fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::begin()
        }
    }

    pub(crate) fn record(&mut self, report: &DeliveryReport) {
        if report.outcome.is_completed() {
            self.completed += 1;
        } else {
            self.failed += 1;
        }
        if !report.acknowledged {
            self.unacknowledged += 1;
        }
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_render_action_substitutes_placeholders() {
        let delivery = fixtures::delivery("d1", "Alice", "store", "vip");
        assert_eq!(
            render_action("give {username} diamond", &delivery),
            "give Alice diamond"
        );
        assert_eq!(
            render_action("broadcast {platform} welcome", &delivery),
            "broadcast store welcome"
        );
    }

    #[test]
    fn test_render_action_repeated_and_absent_placeholders() {
        let delivery = fixtures::delivery("d1", "Bob", "java", "vip");
        assert_eq!(
            render_action("tell {username} hi {username} ({platform})", &delivery),
            "tell Bob hi Bob (java)"
        );
        assert_eq!(render_action("save-all", &delivery), "save-all");
        assert_eq!(
            render_action("say {package}", &delivery),
            "say {package}"
        );
    }

    #[test]
    fn test_catalog_treats_empty_list_as_missing() {
        let mut packages = BTreeMap::new();
        packages.insert("vip".to_string(), vec!["say vip".to_string()]);
        packages.insert("empty".to_string(), vec![]);
        let catalog = ActionCatalog::new(packages);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.actions_for("vip").unwrap(), ["say vip".to_string()]);
        assert!(catalog.actions_for("empty").is_none());
        assert!(catalog.actions_for("unknown").is_none());
    }

    #[test]
    fn test_no_actions_reason() {
        assert_eq!(
            no_actions_reason("vip"),
            "No commands configured for package: vip"
        );
    }

    #[test]
    fn test_cycle_report_counts() {
        let mut report = CycleReport::begin();
        report.record(&DeliveryReport {
            delivery_id: "a".to_string(),
            package: "vip".to_string(),
            outcome: DeliveryOutcome::Completed,
            acknowledged: true,
        });
        report.record(&DeliveryReport {
            delivery_id: "b".to_string(),
            package: "vip".to_string(),
            outcome: DeliveryOutcome::Failed {
                reason: "boom".to_string(),
            },
            acknowledged: false,
        });
        let report = report.finish();

        assert_eq!(report.completed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.unacknowledged, 1);
        assert!(!report.skipped);
        assert!(report.finished_at >= report.started_at);
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(DeliveryOutcome::Failed {
            reason: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"status": "failed", "reason": "boom"}));
    }
}
