//! Diff engine: computes the operations that converge the target toward
//! the resolved snapshot.
//!
//! The engine is stateless; it sees only the snapshot, the current target
//! state, and the deletion policy. Output ordering is load-bearing:
//! group creates come first (shallowest-first), then user creates/updates,
//! then user deletes, then group deletes (deepest-first), so the executor
//! can apply the plan sequentially without violating target-side
//! referential constraints.

use crate::config::SyncSettings;
use crate::model::{
    GroupPayload, OpCounts, Operation, ResolvedSnapshot, SkipReason, SkippedOperation, SyncScope,
    TargetGroup, TargetUser, UserPayload,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Deletion policy and ownership scope for one diff.
#[derive(Debug, Clone)]
pub struct DiffPolicy {
    pub delete_users: bool,
    pub delete_groups: bool,
    /// Only target groups carrying this display-name prefix are considered
    /// owned by this instance and therefore deletable.
    pub group_name_prefix: String,
}

impl From<&SyncSettings> for DiffPolicy {
    fn from(settings: &SyncSettings) -> Self {
        Self {
            delete_users: settings.delete_users,
            delete_groups: settings.delete_groups,
            group_name_prefix: settings.group_name_prefix.clone(),
        }
    }
}

/// Ordered operations plus the no-ops the engine declined to emit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffPlan {
    pub operations: Vec<Operation>,
    pub skipped: Vec<SkippedOperation>,
}

impl DiffPlan {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Counts of what the plan would do if executed cleanly; used by the
    /// preview surface.
    pub fn planned_counts(&self) -> OpCounts {
        let mut counts = OpCounts {
            skipped: self.skipped.len() as u32,
            ..OpCounts::default()
        };
        for op in &self.operations {
            match op {
                Operation::CreateUser { .. } => counts.users_created += 1,
                Operation::UpdateUser { .. } => counts.users_updated += 1,
                Operation::DeleteUser { .. } => counts.users_deleted += 1,
                Operation::CreateGroup { .. } => counts.groups_created += 1,
                Operation::DeleteGroup { .. } => counts.groups_deleted += 1,
            }
        }
        counts
    }
}

/// Stateless diff computation.
pub struct DiffEngine;

impl DiffEngine {
    /// Compute the ordered operation plan.
    ///
    /// `scope` selects which stages contribute: a users-only diff emits no
    /// group operations and vice versa.
    pub fn diff(
        snapshot: &ResolvedSnapshot,
        target_users: &[TargetUser],
        target_groups: &[TargetGroup],
        policy: &DiffPolicy,
        scope: SyncScope,
    ) -> DiffPlan {
        let mut plan = DiffPlan::default();

        if scope != SyncScope::UsersOnly {
            Self::diff_group_creates(snapshot, target_groups, &mut plan);
        }
        if scope != SyncScope::GroupsOnly {
            Self::diff_users(snapshot, target_users, policy, &mut plan);
        }
        if scope != SyncScope::UsersOnly {
            Self::diff_group_deletes(snapshot, target_groups, policy, &mut plan);
        }

        debug!(
            "Diff produced {} operations, {} skipped",
            plan.operations.len(),
            plan.skipped.len()
        );
        plan
    }

    fn diff_group_creates(
        snapshot: &ResolvedSnapshot,
        target_groups: &[TargetGroup],
        plan: &mut DiffPlan,
    ) {
        let existing: HashSet<&str> = target_groups
            .iter()
            .map(|g| g.display_name.as_str())
            .collect();

        // Snapshot groups are ordered shallowest-first, so emitting them in
        // order sequences every parent before its subgroups.
        for group in &snapshot.groups {
            if existing.contains(group.provisioned_name.as_str()) {
                continue;
            }
            plan.operations.push(Operation::CreateGroup {
                group: GroupPayload {
                    external_id: group.id.clone(),
                    display_name: group.provisioned_name.clone(),
                    member_external_ids: group.member_ids.clone(),
                },
                depth: group.depth,
            });
        }
    }

    fn diff_users(
        snapshot: &ResolvedSnapshot,
        target_users: &[TargetUser],
        policy: &DiffPolicy,
        plan: &mut DiffPlan,
    ) {
        let by_external_id: HashMap<&str, &TargetUser> = target_users
            .iter()
            .filter_map(|u| u.external_id.as_deref().map(|eid| (eid, u)))
            .collect();
        let by_user_name: HashMap<&str, &TargetUser> = target_users
            .iter()
            .map(|u| (u.user_name.as_str(), u))
            .collect();

        for user in &snapshot.users {
            let payload = UserPayload::project(user);

            if let Some(target) = by_external_id.get(user.id.as_str()) {
                if payload.differs_from(target) {
                    plan.operations.push(Operation::UpdateUser {
                        target_id: target.id.clone(),
                        user: payload,
                    });
                }
            } else if let Some(target) = by_user_name.get(user.username.as_str()) {
                // Same username, different (or missing) correlation key:
                // this is somebody else's record, leave it alone.
                plan.skipped.push(SkippedOperation {
                    entity: format!("user '{}'", user.username),
                    reason: SkipReason::ExternalIdConflict {
                        expected: user.id.clone(),
                        found: target
                            .external_id
                            .clone()
                            .unwrap_or_else(|| "(none)".to_string()),
                    },
                });
            } else {
                plan.operations.push(Operation::CreateUser { user: payload });
            }
        }

        // Target users with no snapshot counterpart.
        let snapshot_ids: HashSet<&str> = snapshot.users.iter().map(|u| u.id.as_str()).collect();
        let snapshot_names: HashSet<&str> =
            snapshot.users.iter().map(|u| u.username.as_str()).collect();
        for target in target_users {
            let matched = target
                .external_id
                .as_deref()
                .is_some_and(|eid| snapshot_ids.contains(eid))
                || snapshot_names.contains(target.user_name.as_str());
            if matched {
                continue;
            }
            if policy.delete_users {
                plan.operations.push(Operation::DeleteUser {
                    target_id: target.id.clone(),
                    user_name: target.user_name.clone(),
                });
            } else {
                plan.skipped.push(SkippedOperation {
                    entity: format!("user '{}'", target.user_name),
                    reason: SkipReason::DeletionDisabled,
                });
            }
        }
    }

    fn diff_group_deletes(
        snapshot: &ResolvedSnapshot,
        target_groups: &[TargetGroup],
        policy: &DiffPolicy,
        plan: &mut DiffPlan,
    ) {
        let snapshot_names: HashSet<&str> = snapshot
            .groups
            .iter()
            .map(|g| g.provisioned_name.as_str())
            .collect();

        let mut deletions: Vec<&TargetGroup> = target_groups
            .iter()
            .filter(|g| {
                // Ownership guard: never touch groups this instance did not
                // provision.
                !policy.group_name_prefix.is_empty()
                    && g.display_name.starts_with(&policy.group_name_prefix)
                    && !snapshot_names.contains(g.display_name.as_str())
            })
            .collect();

        if deletions.is_empty() {
            return;
        }
        if !policy.delete_groups {
            for group in deletions {
                plan.skipped.push(SkippedOperation {
                    entity: format!("group '{}'", group.display_name),
                    reason: SkipReason::DeletionDisabled,
                });
            }
            return;
        }

        // An ancestor's provisioned name is always a strict prefix of its
        // descendants' names, so longest-name-first is a valid
        // children-before-parents order even without target-side hierarchy
        // data.
        deletions.sort_by(|a, b| {
            b.display_name
                .len()
                .cmp(&a.display_name.len())
                .then_with(|| a.display_name.cmp(&b.display_name))
        });
        for group in deletions {
            let stripped = group
                .display_name
                .strip_prefix(&policy.group_name_prefix)
                .unwrap_or(&group.display_name);
            plan.operations.push(Operation::DeleteGroup {
                target_id: group.id.clone(),
                display_name: group.display_name.clone(),
                depth: stripped.matches('-').count(),
            });
        }
    }
}
