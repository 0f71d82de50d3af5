//! Operations computed by the diff engine.
//!
//! Each variant carries the minimal payload the executor needs plus a
//! correlation key back to the source entity, so a per-operation error can
//! always name what it was trying to converge.

use crate::model::source::SourceUser;
use crate::model::target::TargetUser;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Projection of a source user into the shape the target accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    /// Correlation key: the source user identifier.
    pub external_id: String,
    pub user_name: String,
    pub given_name: String,
    pub family_name: String,
    pub display_name: String,
    pub email: Option<String>,
    pub active: bool,
}

impl UserPayload {
    /// Project a source user into target shape.
    pub fn project(user: &SourceUser) -> Self {
        Self {
            external_id: user.id.clone(),
            user_name: user.username.clone(),
            given_name: user.first_name.clone().unwrap_or_default(),
            family_name: user.last_name.clone().unwrap_or_default(),
            display_name: user.display_name(),
            email: user.email.clone(),
            active: user.enabled,
        }
    }

    /// Whether provisioning this payload would change the target record.
    ///
    /// Drives idempotence: when nothing differs, the diff engine emits no
    /// update for the user.
    pub fn differs_from(&self, target: &TargetUser) -> bool {
        self.user_name != target.user_name
            || self.given_name != target.given_name.as_deref().unwrap_or("")
            || self.family_name != target.family_name.as_deref().unwrap_or("")
            || self.display_name != target.display_name.as_deref().unwrap_or("")
            || self.email.as_deref() != target.email.as_deref()
            || self.active != target.active
    }
}

/// Projection of a snapshot group into the shape the target accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPayload {
    /// Correlation key: the source group identifier.
    pub external_id: String,
    /// Prefixed display name the group is provisioned under.
    pub display_name: String,
    /// Correlation keys of the member users. The adapter maps these to
    /// target-assigned user ids when building the wire payload.
    pub member_external_ids: Vec<String>,
}

/// One convergence step against the target endpoint.
///
/// Group operations carry their hierarchy depth so the ordering invariants
/// (creates shallowest-first, deletes deepest-first) stay observable after
/// the plan is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Operation {
    CreateUser {
        user: UserPayload,
    },
    UpdateUser {
        target_id: String,
        user: UserPayload,
    },
    DeleteUser {
        target_id: String,
        user_name: String,
    },
    CreateGroup {
        group: GroupPayload,
        depth: usize,
    },
    DeleteGroup {
        target_id: String,
        display_name: String,
        depth: usize,
    },
}

impl Operation {
    /// Short human-readable description, used in per-operation error records.
    pub fn describe(&self) -> String {
        match self {
            Self::CreateUser { user } => format!("create user '{}'", user.user_name),
            Self::UpdateUser { user, .. } => format!("update user '{}'", user.user_name),
            Self::DeleteUser { user_name, .. } => format!("delete user '{user_name}'"),
            Self::CreateGroup { group, .. } => format!("create group '{}'", group.display_name),
            Self::DeleteGroup { display_name, .. } => {
                format!("delete group '{display_name}'")
            }
        }
    }

    pub fn is_user_operation(&self) -> bool {
        matches!(
            self,
            Self::CreateUser { .. } | Self::UpdateUser { .. } | Self::DeleteUser { .. }
        )
    }

    pub fn is_group_operation(&self) -> bool {
        !self.is_user_operation()
    }
}

/// Why a would-be operation was not emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum SkipReason {
    /// Deletion is disabled by policy for this entity type.
    DeletionDisabled,
    /// The target already holds this username under a different external
    /// id; touching it could clobber an entity we do not own.
    ExternalIdConflict { expected: String, found: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeletionDisabled => write!(f, "deletion disabled"),
            Self::ExternalIdConflict { expected, found } => {
                write!(f, "externalId conflict: expected {expected}, found {found}")
            }
        }
    }
}

/// A recorded no-op: the entity the diff declined to touch and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedOperation {
    /// Description of the entity, e.g. `user 'bob'`.
    pub entity: String,
    pub reason: SkipReason,
}
