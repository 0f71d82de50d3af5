//! Error types for reconciliation operations.
//!
//! One taxonomy covers both external directories and the engine's own
//! control flow. Read-phase errors abort a pass; execute-phase errors are
//! recorded per operation and never abort the remaining operations.

/// Main error type for reconciliation operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The source directory could not be reached or refused authentication.
    #[error("Source directory unavailable: {message}")]
    SourceUnavailable { message: String },

    /// The source directory returned a record the engine cannot interpret,
    /// including a cyclic group hierarchy.
    #[error("Source directory returned malformed data: {message}")]
    SourceMalformed { message: String },

    /// The target endpoint could not be reached within the call timeout.
    #[error("Target endpoint unavailable: {message}")]
    TargetUnavailable { message: String },

    /// The target endpoint rejected an operation (validation failure).
    #[error("Target rejected operation (status {status}): {detail}")]
    TargetRejected { status: u16, detail: String },

    /// The target reported a conflicting entity (e.g. uniqueness violation).
    #[error("Conflict at target: {message}")]
    Conflict { message: String },

    /// A reconciliation pass is already running; the trigger was rejected,
    /// the in-flight pass is unaffected.
    #[error("A reconciliation pass is already in progress")]
    AlreadyInProgress,

    /// The engine configuration cannot produce a usable scope filter or
    /// schedule.
    #[error("Invalid configuration: {message}")]
    ConfigurationInvalid { message: String },
}

impl SyncError {
    /// Create a source-unavailable error.
    pub fn source_unavailable(message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            message: message.into(),
        }
    }

    /// Create a source-malformed error.
    pub fn source_malformed(message: impl Into<String>) -> Self {
        Self::SourceMalformed {
            message: message.into(),
        }
    }

    /// Create a target-unavailable error.
    pub fn target_unavailable(message: impl Into<String>) -> Self {
        Self::TargetUnavailable {
            message: message.into(),
        }
    }

    /// Create a target-rejected error with the response detail the target
    /// returned.
    pub fn target_rejected(status: u16, detail: impl Into<String>) -> Self {
        Self::TargetRejected {
            status,
            detail: detail.into(),
        }
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationInvalid {
            message: message.into(),
        }
    }

    /// Whether retrying the same call could plausibly succeed.
    ///
    /// Only transport-level unavailability qualifies; rejections and
    /// conflicts are deterministic, so retrying them cannot change the
    /// outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. } | Self::TargetUnavailable { .. }
        )
    }
}

/// Result type alias for reconciliation operations.
pub type SyncResult<T> = Result<T, SyncError>;
