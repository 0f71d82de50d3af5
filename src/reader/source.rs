//! Directory reader: applies the scope filter and produces the resolved
//! snapshot.
//!
//! Scope resolution walks each group's ancestry: an attribute defined
//! directly on the group wins, otherwise the nearest defining ancestor
//! supplies it, and a group with no attribute anywhere in its ancestry is
//! out of scope. Once a group is in scope its entire subtree is included
//! without re-checking attributes. Users reachable from the in-scope group
//! set are fetched exactly once each, regardless of how many groups
//! reference them.

use crate::adapter::SourceDirectory;
use crate::error::{SyncError, SyncResult};
use crate::model::{
    AttributeResolution, ResolvedGroup, ResolvedSnapshot, ScopeFilter, SourceGroup,
};
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

/// Position of a group within the in-scope hierarchy.
#[derive(Debug, Clone)]
struct ScopePath {
    depth: usize,
    /// Ancestor name chain from the in-scope root down to this group.
    name_chain: String,
}

/// Traversal frame: a fetched group plus the scope context its parent
/// established.
struct Frame {
    group: SourceGroup,
    /// Value supplied by the nearest ancestor defining the scope attribute.
    inherited: Option<String>,
    /// Set when the parent is in scope; forces inclusion of this subtree.
    parent_scope: Option<ScopePath>,
}

/// Resolves the filtered source snapshot for one pass.
pub struct DirectoryReader<S> {
    source: Arc<S>,
    group_name_prefix: String,
}

impl<S: SourceDirectory> DirectoryReader<S> {
    pub fn new(source: Arc<S>, group_name_prefix: impl Into<String>) -> Self {
        Self {
            source,
            group_name_prefix: group_name_prefix.into(),
        }
    }

    /// Read the source directory and resolve the in-scope snapshot.
    ///
    /// # Errors
    ///
    /// `SourceUnavailable` on transport/auth failure, `SourceMalformed`
    /// when the group hierarchy contains a cycle (or a group reachable
    /// through two parents, which is equally untrustworthy as a tree).
    pub async fn read(&self, filter: &ScopeFilter) -> SyncResult<ResolvedSnapshot> {
        let roots = self.source.list_root_groups().await?;
        debug!(
            "Resolving scope {}={} over {} top-level groups",
            filter.attribute,
            filter.value,
            roots.len()
        );

        let mut visited: HashSet<String> = HashSet::new();
        let mut groups: Vec<ResolvedGroup> = Vec::new();
        // user id -> in-scope group ids the user was reached through
        let mut memberships: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        let mut stack: Vec<Frame> = Vec::new();
        for root in roots {
            if !visited.insert(root.id.clone()) {
                return Err(SyncError::source_malformed(format!(
                    "group '{}' listed more than once at top level",
                    root.id
                )));
            }
            stack.push(Frame {
                group: root,
                inherited: None,
                parent_scope: None,
            });
        }

        while let Some(frame) = stack.pop() {
            let resolution = resolve_attribute(&frame.group, filter, frame.inherited.as_deref());

            let scope = match &frame.parent_scope {
                // Subtree of an in-scope group: included unconditionally.
                Some(parent) => Some(ScopePath {
                    depth: parent.depth + 1,
                    name_chain: format!("{}-{}", parent.name_chain, frame.group.name),
                }),
                None if resolution.matches(filter) => Some(ScopePath {
                    depth: 0,
                    name_chain: frame.group.name.clone(),
                }),
                None => {
                    debug!(
                        "Group '{}' out of scope ({:?})",
                        frame.group.name, resolution
                    );
                    None
                }
            };

            if let Some(path) = &scope {
                let member_ids = self.source.list_members(&frame.group.id).await?;
                for member in &member_ids {
                    memberships
                        .entry(member.clone())
                        .or_default()
                        .insert(frame.group.id.clone());
                }
                groups.push(ResolvedGroup {
                    id: frame.group.id.clone(),
                    name: frame.group.name.clone(),
                    provisioned_name: format!("{}{}", self.group_name_prefix, path.name_chain),
                    depth: path.depth,
                    parent_id: if path.depth > 0 {
                        frame.group.parent_id.clone()
                    } else {
                        None
                    },
                    member_ids,
                });
            }

            // Attribute defined here (matching or not) shadows the
            // inherited value for descendants.
            let inherited_next = match &resolution {
                AttributeResolution::Defined(v) => Some(v.clone()),
                AttributeResolution::Inherited(v) => Some(v.clone()),
                AttributeResolution::Absent => None,
            };

            for child_id in &frame.group.child_ids {
                if !visited.insert(child_id.clone()) {
                    return Err(SyncError::source_malformed(format!(
                        "cyclic group hierarchy: group '{child_id}' reached twice"
                    )));
                }
                let child = self.source.get_group(child_id).await?;
                stack.push(Frame {
                    group: child,
                    inherited: inherited_next.clone(),
                    parent_scope: scope.clone(),
                });
            }
        }

        // Shallowest-first so iteration order already satisfies the
        // parent-before-child creation invariant.
        groups.sort_by(|a, b| a.depth.cmp(&b.depth).then(a.provisioned_name.cmp(&b.provisioned_name)));

        // Union of members across the in-scope set, each fetched once.
        let mut users = Vec::with_capacity(memberships.len());
        for (user_id, group_ids) in memberships {
            let mut user = self.source.get_user(&user_id).await?;
            user.group_ids = group_ids;
            users.push(user);
        }
        users.sort_by(|a, b| a.username.cmp(&b.username));

        info!(
            "Resolved snapshot: {} in-scope groups, {} unique users",
            groups.len(),
            users.len()
        );
        Ok(ResolvedSnapshot { groups, users })
    }
}

/// Resolve a group's scope attribute with the defined/inherited/absent
/// tri-state.
///
/// With a multi-valued attribute the value matching the filter wins when
/// present; otherwise the first value stands in, which still compares as
/// non-matching.
fn resolve_attribute(
    group: &SourceGroup,
    filter: &ScopeFilter,
    inherited: Option<&str>,
) -> AttributeResolution {
    if let Some(values) = group.own_attribute(filter) {
        let value = values
            .iter()
            .find(|v| *v == &filter.value)
            .or_else(|| values.first());
        return AttributeResolution::Defined(value.cloned().unwrap_or_default());
    }
    match inherited {
        Some(v) => AttributeResolution::Inherited(v.to_string()),
        None => AttributeResolution::Absent,
    }
}
