//! Pass lifecycle records.
//!
//! One [`PassSummary`] is created per read-diff-execute cycle and retained
//! as the coordinator's "last result"; the control surface reports it
//! upward as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which stages of a pass run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncScope {
    /// Users and groups.
    Full,
    /// User operations only.
    UsersOnly,
    /// Group operations only.
    GroupsOnly,
}

/// What initiated a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerKind {
    Manual,
    Scheduled,
}

/// Terminal outcome of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PassOutcome {
    /// Every operation applied cleanly.
    Succeeded,
    /// At least one operation failed; the rest were still applied.
    PartialFailure,
    /// The pass aborted before any write (read phase or snapshot failure).
    Failed,
}

/// Per-entity-type operation counters for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpCounts {
    pub users_created: u32,
    pub users_updated: u32,
    pub users_deleted: u32,
    pub groups_created: u32,
    pub groups_deleted: u32,
    /// Policy-gated or conflict no-ops recorded by the diff engine.
    pub skipped: u32,
}

impl OpCounts {
    /// Total write operations applied.
    pub fn total_applied(&self) -> u32 {
        self.users_created
            + self.users_updated
            + self.users_deleted
            + self.groups_created
            + self.groups_deleted
    }
}

/// One failed operation within a pass, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationError {
    /// What the executor was doing, e.g. `create user 'alice'`.
    pub operation: String,
    pub message: String,
}

/// Record of one complete pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassSummary {
    pub id: Uuid,
    pub trigger: TriggerKind,
    pub scope: SyncScope,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: PassOutcome,
    pub counts: OpCounts,
    /// Ordered per-operation errors; empty on success.
    pub errors: Vec<OperationError>,
}

impl PassSummary {
    /// Begin a pass record. `finished_at` is set to the start time until
    /// the pass finalizes.
    pub fn begin(trigger: TriggerKind, scope: SyncScope) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            trigger,
            scope,
            started_at: now,
            finished_at: now,
            outcome: PassOutcome::Failed,
            counts: OpCounts::default(),
            errors: Vec::new(),
        }
    }

    /// Finalize with execute-phase results: outcome is `Succeeded` when no
    /// operation failed, `PartialFailure` otherwise.
    pub fn finalize(mut self, counts: OpCounts, errors: Vec<OperationError>) -> Self {
        self.finished_at = Utc::now();
        self.counts = counts;
        self.outcome = if errors.is_empty() {
            PassOutcome::Succeeded
        } else {
            PassOutcome::PartialFailure
        };
        self.errors = errors;
        self
    }

    /// Finalize as `Failed` before any write was attempted.
    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.finished_at = Utc::now();
        self.outcome = PassOutcome::Failed;
        self.errors.push(OperationError {
            operation: "read phase".to_string(),
            message: message.into(),
        });
        self
    }
}
