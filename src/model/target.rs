//! Mirror records of what the target endpoint currently holds.

use serde::{Deserialize, Serialize};

/// A user as currently provisioned at the target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetUser {
    /// Target-assigned identifier, required for update and delete calls.
    pub id: String,
    /// Login name at the target.
    pub user_name: String,
    /// Correlation field pointing back at the source user identifier.
    pub external_id: Option<String>,
    pub display_name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub email: Option<String>,
    pub active: bool,
}

/// A group as currently provisioned at the target.
///
/// There is no group mutation at the target protocol level, so the mirror
/// only needs enough to correlate and delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetGroup {
    /// Target-assigned identifier.
    pub id: String,
    /// Display name; the correlation key for groups.
    pub display_name: String,
    /// Correlation field, when the endpoint preserves it.
    pub external_id: Option<String>,
}
