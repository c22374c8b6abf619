//! Delivery processing.
//!
//! Per delivery: resolve the package to its command list, render
//! placeholders, run the list on the dispatch context and report the single
//! terminal outcome (completed or failed) to the backend.
//!
//! # Example
//!
//! ```ignore
//! use rankdelivery_core::processor::DeliveryProcessor;
//! use rankdelivery_core::executor::{create_dispatch_context, LoggingExecutor};
//!
//! let (dispatcher, worker) = create_dispatch_context(Box::new(LoggingExecutor::new()), 64);
//! tokio::spawn(worker.run());
//!
//! let processor = DeliveryProcessor::from_config(&config, backend, dispatcher);
//! let report = processor.process_pending().await;
//! println!("completed {} / failed {}", report.completed, report.failed);
//! ```

mod delivery;
mod types;

pub use delivery::DeliveryProcessor;
pub use types::{
    delivery_message, no_actions_reason, render_action, ActionCatalog, CycleReport,
    DeliveryOutcome, DeliveryReport,
};
