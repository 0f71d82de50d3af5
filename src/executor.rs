//! Operation executor: applies a diff plan against the target endpoint.
//!
//! Execution is sequential in plan order (the ordering is what makes group
//! referential constraints hold). A failing operation never aborts the
//! pass: it is classified, recorded, and the executor moves on. Only
//! transport-level unavailability is retried, with a small fixed bound, so
//! one flapping call cannot stall the pass indefinitely.

use crate::adapter::TargetDirectory;
use crate::diff::DiffPlan;
use crate::error::SyncResult;
use crate::model::{OpCounts, Operation, OperationError};
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Attempts per operation for retryable failures.
const MAX_ATTEMPTS: u32 = 3;

/// Backoff before the second attempt; doubles per retry.
const INITIAL_BACKOFF: Duration = Duration::from_millis(250);

/// Applies planned operations, isolating per-item failures.
pub struct OperationExecutor<T> {
    target: Arc<T>,
}

impl<T: TargetDirectory> OperationExecutor<T> {
    pub fn new(target: Arc<T>) -> Self {
        Self { target }
    }

    /// Apply every operation in the plan, in order.
    ///
    /// Returns the counts of applied operations (plus the plan's recorded
    /// skips) and the ordered per-operation errors. Never fails as a
    /// whole.
    pub async fn execute(&self, plan: &DiffPlan) -> (OpCounts, Vec<OperationError>) {
        let mut counts = OpCounts {
            skipped: plan.skipped.len() as u32,
            ..OpCounts::default()
        };
        let mut errors = Vec::new();

        for skipped in &plan.skipped {
            info!("Skipped {}: {}", skipped.entity, skipped.reason);
        }

        for operation in &plan.operations {
            match self.apply_with_retry(operation).await {
                Ok(()) => {
                    info!("Applied: {}", operation.describe());
                    match operation {
                        Operation::CreateUser { .. } => counts.users_created += 1,
                        Operation::UpdateUser { .. } => counts.users_updated += 1,
                        Operation::DeleteUser { .. } => counts.users_deleted += 1,
                        Operation::CreateGroup { .. } => counts.groups_created += 1,
                        Operation::DeleteGroup { .. } => counts.groups_deleted += 1,
                    }
                }
                Err(error) => {
                    warn!("Failed to {}: {}", operation.describe(), error);
                    errors.push(OperationError {
                        operation: operation.describe(),
                        message: error.to_string(),
                    });
                }
            }
        }

        (counts, errors)
    }

    async fn apply_with_retry(&self, operation: &Operation) -> SyncResult<()> {
        let mut backoff = INITIAL_BACKOFF;
        let mut attempt = 1;
        loop {
            match self.apply(operation).await {
                Ok(()) => return Ok(()),
                Err(error) if error.is_retryable() && attempt < MAX_ATTEMPTS => {
                    warn!(
                        "Attempt {attempt}/{MAX_ATTEMPTS} to {} failed ({error}), retrying in {backoff:?}",
                        operation.describe()
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn apply(&self, operation: &Operation) -> SyncResult<()> {
        match operation {
            Operation::CreateUser { user } => {
                self.target.create_user(user).await?;
            }
            Operation::UpdateUser { target_id, user } => {
                self.target.update_user(target_id, user).await?;
            }
            Operation::DeleteUser { target_id, .. } => {
                self.target.delete_user(target_id).await?;
            }
            Operation::CreateGroup { group, .. } => {
                self.target.create_group(group).await?;
            }
            Operation::DeleteGroup { target_id, .. } => {
                self.target.delete_group(target_id).await?;
            }
        }
        Ok(())
    }
}
