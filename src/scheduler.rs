//! Interval scheduler for reconciliation passes.
//!
//! The scheduler owns only the timer: each tick fires
//! `SyncCoordinator::run_once` as a detached task and relies on the
//! coordinator's single-flight gate for overlap. A tick landing while a
//! pass is still running is absorbed as a no-op; stopping the scheduler
//! aborts the timer but never an in-flight pass.

use crate::adapter::{SourceDirectory, TargetDirectory};
use crate::coordinator::SyncCoordinator;
use crate::error::SyncError;
use crate::model::{SyncScope, TriggerKind};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Snapshot of the scheduler's state for the control surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    /// Whether the timer task is currently active.
    pub enabled: bool,
    pub interval_minutes: u64,
    pub last_run_time: Option<DateTime<Utc>>,
    pub next_run_time: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct SchedulerState {
    handle: Option<JoinHandle<()>>,
    last_run: Option<DateTime<Utc>>,
    next_run: Option<DateTime<Utc>>,
}

/// Fires full-scope passes at the configured interval.
pub struct SyncScheduler<S, T> {
    coordinator: Arc<SyncCoordinator<S, T>>,
    state: Arc<Mutex<SchedulerState>>,
}

impl<S, T> SyncScheduler<S, T>
where
    S: SourceDirectory + 'static,
    T: TargetDirectory + 'static,
{
    pub fn new(coordinator: Arc<SyncCoordinator<S, T>>) -> Self {
        Self {
            coordinator,
            state: Arc::new(Mutex::new(SchedulerState::default())),
        }
    }

    /// Start the interval timer. The first pass fires one full interval
    /// after start, not immediately.
    ///
    /// A no-op when the settings disable the scheduler or when it is
    /// already started.
    pub fn start(&self) {
        let settings = self.coordinator.settings();
        if !settings.scheduler_enabled {
            info!("Scheduler disabled by configuration");
            return;
        }
        let mut state = lock(&self.state);
        if state.handle.is_some() {
            debug!("Scheduler already started");
            return;
        }

        let interval_minutes = settings.interval_minutes;
        let period = Duration::from_secs(interval_minutes * 60);
        let coordinator = Arc::clone(&self.coordinator);
        let shared = Arc::clone(&self.state);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // A pass outlasting the interval must not cause catch-up bursts.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first interval tick completes immediately; consume it so
            // the initial pass waits a full period.
            ticker.tick().await;
            lock(&shared).next_run = Some(Utc::now() + ChronoDuration::minutes(interval_minutes as i64));

            loop {
                ticker.tick().await;
                lock(&shared).next_run =
                    Some(Utc::now() + ChronoDuration::minutes(interval_minutes as i64));
                // Detached so that stopping the timer cannot interrupt a
                // pass already in flight. An absorbed tick must not advance
                // last_run, so the stamp happens only when a pass ran.
                let coordinator = Arc::clone(&coordinator);
                let state = Arc::clone(&shared);
                tokio::spawn(async move {
                    match coordinator
                        .run_once(SyncScope::Full, TriggerKind::Scheduled)
                        .await
                    {
                        Ok(summary) => {
                            lock(&state).last_run = Some(summary.finished_at);
                            info!("Scheduled pass {} completed: {:?}", summary.id, summary.outcome);
                        }
                        Err(SyncError::AlreadyInProgress) => {
                            debug!("Scheduled tick absorbed: a pass is already running");
                        }
                        Err(error) => {
                            warn!("Scheduled pass could not start: {error}");
                        }
                    }
                });
            }
        });

        state.handle = Some(handle);
        info!("Scheduler started with an interval of {interval_minutes} minutes");
    }

    /// Cancel future ticks. An in-flight pass runs to completion.
    pub fn stop(&self) {
        let mut state = lock(&self.state);
        if let Some(handle) = state.handle.take() {
            handle.abort();
            state.next_run = None;
            info!("Scheduler stopped");
        }
    }

    /// Current scheduler status.
    pub fn status(&self) -> SchedulerStatus {
        let state = lock(&self.state);
        SchedulerStatus {
            enabled: state.handle.as_ref().is_some_and(|h| !h.is_finished()),
            interval_minutes: self.coordinator.settings().interval_minutes,
            last_run_time: state.last_run,
            next_run_time: state.next_run,
        }
    }
}

impl<S, T> Drop for SyncScheduler<S, T> {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.state).handle.take() {
            handle.abort();
        }
    }
}

fn lock(state: &Mutex<SchedulerState>) -> std::sync::MutexGuard<'_, SchedulerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
