//! Data model for the reconciliation engine.
//!
//! Source-side types describe the authoritative directory snapshot, target
//! types mirror what the provisioning endpoint currently holds, operations
//! are the computed convergence steps, and the pass types record how one
//! read-diff-execute cycle went.

pub mod operation;
pub mod pass;
pub mod source;
pub mod target;

pub use operation::{
    GroupPayload, Operation, SkipReason, SkippedOperation, UserPayload,
};
pub use pass::{OpCounts, OperationError, PassOutcome, PassSummary, SyncScope, TriggerKind};
pub use source::{
    AttributeResolution, ResolvedGroup, ResolvedSnapshot, ScopeFilter, SourceGroup, SourceUser,
};
pub use target::{TargetGroup, TargetUser};
