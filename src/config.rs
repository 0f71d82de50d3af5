//! Engine configuration.
//!
//! The embedding process (CLI, service wrapper) is responsible for loading
//! these values from wherever it keeps them; the engine only validates and
//! consumes them. Invalid settings surface as
//! [`SyncError::ConfigurationInvalid`](crate::error::SyncError) before any
//! directory is contacted.

use crate::error::{SyncError, SyncResult};
use std::time::Duration;

/// Default reconciliation interval in minutes.
pub const DEFAULT_INTERVAL_MINUTES: u64 = 60;

/// Default per-call timeout for outbound directory requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings consumed by the reconciliation engine.
///
/// `scope_attribute` / `scope_value` select which top-level source groups
/// (and transitively their subgroups) participate in sync. Deletion is off
/// by default for both entity types: a fresh deployment observing an
/// unexpected target state must not start removing entities until an
/// operator opts in.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Name of the group attribute carrying the scope value.
    pub scope_attribute: String,
    /// Expected value of the scope attribute.
    pub scope_value: String,
    /// Delete target users absent from the resolved snapshot.
    pub delete_users: bool,
    /// Delete target groups absent from the resolved snapshot.
    pub delete_groups: bool,
    /// Prefix applied to provisioned group display names. Doubles as the
    /// ownership marker: only target groups carrying this prefix are ever
    /// deletion candidates.
    pub group_name_prefix: String,
    /// Interval between scheduled passes, in minutes.
    pub interval_minutes: u64,
    /// Whether the scheduler fires at all; manual triggers work regardless.
    pub scheduler_enabled: bool,
    /// Bounded timeout for each outbound directory call. Adapters apply it;
    /// exceeding it is reported as unavailability, never partial success.
    pub request_timeout: Duration,
}

impl SyncSettings {
    /// Create settings with the required scope filter and defaults for
    /// everything else.
    pub fn new(scope_attribute: impl Into<String>, scope_value: impl Into<String>) -> Self {
        Self {
            scope_attribute: scope_attribute.into(),
            scope_value: scope_value.into(),
            delete_users: false,
            delete_groups: false,
            group_name_prefix: String::new(),
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            scheduler_enabled: true,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Validate the settings, returning them for chaining.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ConfigurationInvalid`] if the scope filter is
    /// unresolvable, the interval is zero, or deletion is enabled without an
    /// ownership prefix to bound it.
    pub fn validate(self) -> SyncResult<Self> {
        if self.scope_attribute.trim().is_empty() {
            return Err(SyncError::configuration("scope attribute name is empty"));
        }
        if self.scope_value.trim().is_empty() {
            return Err(SyncError::configuration("scope attribute value is empty"));
        }
        if self.interval_minutes == 0 {
            return Err(SyncError::configuration(
                "sync interval must be at least one minute",
            ));
        }
        if self.delete_groups && self.group_name_prefix.is_empty() {
            return Err(SyncError::configuration(
                "group deletion requires a group name prefix to identify owned groups",
            ));
        }
        Ok(self)
    }

    /// Set the group display-name prefix.
    pub fn with_group_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.group_name_prefix = prefix.into();
        self
    }

    /// Enable or disable deletion of target users absent from the snapshot.
    pub fn with_delete_users(mut self, enabled: bool) -> Self {
        self.delete_users = enabled;
        self
    }

    /// Enable or disable deletion of owned target groups absent from the
    /// snapshot.
    pub fn with_delete_groups(mut self, enabled: bool) -> Self {
        self.delete_groups = enabled;
        self
    }

    /// Set the scheduled pass interval in minutes.
    pub fn with_interval_minutes(mut self, minutes: u64) -> Self {
        self.interval_minutes = minutes;
        self
    }

    /// Enable or disable the interval scheduler.
    pub fn with_scheduler_enabled(mut self, enabled: bool) -> Self {
        self.scheduler_enabled = enabled;
        self
    }

    /// Set the per-call request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = SyncSettings::new("vcenter_name", "vcenter01.contoso.com")
            .validate()
            .unwrap();
        assert!(!settings.delete_users);
        assert!(!settings.delete_groups);
        assert_eq!(settings.interval_minutes, DEFAULT_INTERVAL_MINUTES);
        assert!(settings.scheduler_enabled);
    }

    #[test]
    fn test_empty_scope_attribute_rejected() {
        let result = SyncSettings::new("  ", "vcenter01").validate();
        assert!(matches!(
            result,
            Err(SyncError::ConfigurationInvalid { .. })
        ));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = SyncSettings::new("vcenter_name", "vcenter01")
            .with_interval_minutes(0)
            .validate();
        assert!(matches!(
            result,
            Err(SyncError::ConfigurationInvalid { .. })
        ));
    }

    #[test]
    fn test_group_deletion_requires_prefix() {
        let result = SyncSettings::new("vcenter_name", "vcenter01")
            .with_delete_groups(true)
            .validate();
        assert!(matches!(
            result,
            Err(SyncError::ConfigurationInvalid { .. })
        ));

        let result = SyncSettings::new("vcenter_name", "vcenter01")
            .with_delete_groups(true)
            .with_group_name_prefix("master-")
            .validate();
        assert!(result.is_ok());
    }
}
