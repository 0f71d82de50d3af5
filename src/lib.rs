//! Directory-to-SCIM reconciliation library for Rust.
//!
//! Synchronizes a scoped slice of an identity-provider directory into a
//! SCIM-style provisioning target. Each reconciliation pass reads both
//! sides, diffs them, and applies the minimal set of create, update, and
//! delete operations to converge the target on the source.
//!
//! # Core Components
//!
//! - [`SyncCoordinator`] - Drives a full read/diff/apply pass
//! - [`SourceDirectory`] / [`TargetDirectory`] - Traits for the two sides
//! - [`SyncScheduler`] - Fires passes at a configured interval
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use scim_sync::{SyncCoordinator, SyncScope, SyncSettings, TriggerKind};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = SyncSettings::new("vcenter_name", "vcenter01");
//! let coordinator = SyncCoordinator::new(source, target, settings)?;
//! let summary = coordinator.run_once(SyncScope::Full, TriggerKind::Manual).await?;
//! println!("{:?}: {} operations applied", summary.outcome, summary.counts.total_applied());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod coordinator;
pub mod diff;
pub mod error;
pub mod executor;
pub mod model;
pub mod reader;
pub mod scheduler;

// Re-export commonly used types for convenience
pub use adapter::{Page, SourceDirectory, TargetDirectory};
pub use config::SyncSettings;
pub use coordinator::SyncCoordinator;
pub use diff::{DiffEngine, DiffPlan, DiffPolicy};
pub use error::{SyncError, SyncResult};
pub use model::{
    OpCounts, Operation, PassOutcome, PassSummary, ResolvedSnapshot, ScopeFilter, SkipReason,
    SourceGroup, SourceUser, SyncScope, TargetGroup, TargetUser, TriggerKind,
};
pub use scheduler::{SchedulerStatus, SyncScheduler};
