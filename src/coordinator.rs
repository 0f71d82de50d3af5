//! Reconciliation coordinator: orchestrates one read-diff-execute pass and
//! guards it with the single-flight gate.
//!
//! The timer and every manual trigger all funnel through [`run_once`]; the
//! gate is an atomic compare-and-set, so at most one pass executes
//! process-wide, with no queuing. The pass record and the gate are the
//! only mutable shared state, and the record is always stored before the
//! gate is released.
//!
//! [`run_once`]: SyncCoordinator::run_once

use crate::adapter::{SourceDirectory, TargetDirectory};
use crate::config::SyncSettings;
use crate::diff::{DiffEngine, DiffPlan, DiffPolicy};
use crate::error::{SyncError, SyncResult};
use crate::executor::OperationExecutor;
use crate::model::{PassSummary, ScopeFilter, SyncScope, TriggerKind};
use crate::reader::{DirectoryReader, TargetStateReader};
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Releases the single-flight gate when the pass finishes, normally or
/// otherwise.
struct PassGuard<'a>(&'a AtomicBool);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Orchestrates reconciliation passes against one source/target pair.
pub struct SyncCoordinator<S, T> {
    settings: SyncSettings,
    filter: ScopeFilter,
    policy: DiffPolicy,
    directory_reader: DirectoryReader<S>,
    target_reader: TargetStateReader<T>,
    executor: OperationExecutor<T>,
    running: AtomicBool,
    last_result: RwLock<Option<PassSummary>>,
}

impl<S, T> SyncCoordinator<S, T>
where
    S: SourceDirectory,
    T: TargetDirectory,
{
    /// Build a coordinator over the two directory adapters.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ConfigurationInvalid`] when the settings do not
    /// validate.
    pub fn new(
        source: Arc<S>,
        target: Arc<T>,
        settings: SyncSettings,
    ) -> SyncResult<Self> {
        let settings = settings.validate()?;
        Ok(Self {
            filter: ScopeFilter::new(&settings.scope_attribute, &settings.scope_value),
            policy: DiffPolicy::from(&settings),
            directory_reader: DirectoryReader::new(
                Arc::clone(&source),
                settings.group_name_prefix.clone(),
            ),
            target_reader: TargetStateReader::new(Arc::clone(&target)),
            executor: OperationExecutor::new(target),
            settings,
            running: AtomicBool::new(false),
            last_result: RwLock::new(None),
        })
    }

    /// The validated settings this coordinator runs with.
    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Whether a pass is currently executing.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// The most recent pass record, if any pass has completed.
    pub fn last_result(&self) -> Option<PassSummary> {
        self.last_result
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run one complete reconciliation pass.
    ///
    /// Single-flight: if a pass is already running this returns
    /// [`SyncError::AlreadyInProgress`] immediately without queuing and
    /// without touching the in-flight pass. A read-phase failure produces a
    /// pass with outcome `Failed` and no writes; execute-phase failures are
    /// per-operation and yield `PartialFailure`. The returned summary is
    /// also retained as the last result.
    pub async fn run_once(
        &self,
        scope: SyncScope,
        trigger: TriggerKind,
    ) -> SyncResult<PassSummary> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SyncError::AlreadyInProgress);
        }
        let _guard = PassGuard(&self.running);

        let summary = PassSummary::begin(trigger, scope);
        info!(
            "Pass {} starting ({:?}, {:?} scope, filter {}={})",
            summary.id, trigger, scope, self.filter.attribute, self.filter.value
        );

        let plan = match self.read_and_diff(scope).await {
            Ok(plan) => plan,
            Err(error) => {
                warn!("Pass {} aborted before writes: {error}", summary.id);
                let summary = summary.fail(error.to_string());
                self.store(summary.clone());
                return Ok(summary);
            }
        };

        let (counts, errors) = self.executor.execute(&plan).await;
        let summary = summary.finalize(counts, errors);
        info!(
            "Pass {} finished: {:?}, {} operations applied, {} errors, {} skipped",
            summary.id,
            summary.outcome,
            summary.counts.total_applied(),
            summary.errors.len(),
            summary.counts.skipped
        );
        self.store(summary.clone());
        Ok(summary)
    }

    /// Compute the operation plan without executing it.
    ///
    /// Preview is read-only; it does not take the single-flight gate and
    /// does not alter the last result, so it may run alongside an
    /// in-flight pass.
    pub async fn preview(&self, scope: SyncScope) -> SyncResult<DiffPlan> {
        self.read_and_diff(scope).await
    }

    async fn read_and_diff(&self, scope: SyncScope) -> SyncResult<DiffPlan> {
        let plan = match scope {
            SyncScope::Full => {
                // Independent read-only sources; fetch both sides at once.
                let (snapshot, target_state) = tokio::join!(
                    self.directory_reader.read(&self.filter),
                    self.target_reader.read()
                );
                let snapshot = snapshot?;
                let (target_users, target_groups) = target_state?;
                DiffEngine::diff(&snapshot, &target_users, &target_groups, &self.policy, scope)
            }
            SyncScope::UsersOnly => {
                let (snapshot, target_users) = tokio::join!(
                    self.directory_reader.read(&self.filter),
                    self.target_reader.read_users()
                );
                DiffEngine::diff(&snapshot?, &target_users?, &[], &self.policy, scope)
            }
            SyncScope::GroupsOnly => {
                let (snapshot, target_groups) = tokio::join!(
                    self.directory_reader.read(&self.filter),
                    self.target_reader.read_groups()
                );
                DiffEngine::diff(&snapshot?, &[], &target_groups?, &self.policy, scope)
            }
        };
        Ok(plan)
    }

    fn store(&self, summary: PassSummary) {
        *self
            .last_result
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(summary);
    }
}
