//! Collaborator traits for the two external directories.
//!
//! The engine treats the source directory and the target provisioning
//! endpoint purely as the operations declared here. Transport, token
//! acquisition, and wire formats live in thin adapter crates that
//! implement these traits; the engine only requires that an adapter
//! classifies its failures into the [`SyncError`](crate::error::SyncError)
//! taxonomy and applies the configured per-call timeout.

use crate::error::SyncResult;
use crate::model::{GroupPayload, SourceGroup, SourceUser, TargetGroup, TargetUser, UserPayload};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// One page of a paginated target listing, mirroring the SCIM
/// ListResponse shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub resources: Vec<T>,
    /// Total matching resources across all pages.
    pub total_results: usize,
    /// 1-based index of the first resource in this page.
    pub start_index: usize,
}

/// Read access to the authoritative source directory.
///
/// Pagination is transparent: every method yields the complete logical
/// sequence. Failures are `SourceUnavailable` for transport/auth problems
/// and `SourceMalformed` for unparsable records.
pub trait SourceDirectory: Send + Sync {
    /// List all top-level groups, with attributes populated.
    fn list_root_groups(&self) -> impl Future<Output = SyncResult<Vec<SourceGroup>>> + Send;

    /// Fetch one group by id, with attributes, parent, and children.
    fn get_group(&self, id: &str) -> impl Future<Output = SyncResult<SourceGroup>> + Send;

    /// List the direct member user ids of a group.
    fn list_members(&self, group_id: &str)
    -> impl Future<Output = SyncResult<Vec<String>>> + Send;

    /// Fetch one user record by id.
    fn get_user(&self, id: &str) -> impl Future<Output = SyncResult<SourceUser>> + Send;
}

/// Read/write access to the target provisioning endpoint.
///
/// Listing is paged; the caller drives `start_index` until the endpoint
/// reports end-of-results. Write operations return the taxonomy's
/// classified failures: `TargetUnavailable` (transport), `TargetRejected`
/// (validation), `Conflict` (uniqueness). There is deliberately no group
/// update operation; group membership is expressed at creation and via
/// user assignment, matching the target protocol's capabilities.
pub trait TargetDirectory: Send + Sync {
    /// List provisioned users, one page at a time (`start_index` is
    /// 1-based).
    fn list_users(
        &self,
        start_index: usize,
        count: usize,
    ) -> impl Future<Output = SyncResult<Page<TargetUser>>> + Send;

    /// List provisioned groups, one page at a time.
    fn list_groups(
        &self,
        start_index: usize,
        count: usize,
    ) -> impl Future<Output = SyncResult<Page<TargetGroup>>> + Send;

    /// Create a user; returns the record with its target-assigned id.
    fn create_user(&self, user: &UserPayload)
    -> impl Future<Output = SyncResult<TargetUser>> + Send;

    /// Replace a user's attributes.
    fn update_user(
        &self,
        id: &str,
        user: &UserPayload,
    ) -> impl Future<Output = SyncResult<TargetUser>> + Send;

    /// Delete a user by target-assigned id.
    fn delete_user(&self, id: &str) -> impl Future<Output = SyncResult<()>> + Send;

    /// Create a group; returns the record with its target-assigned id.
    fn create_group(
        &self,
        group: &GroupPayload,
    ) -> impl Future<Output = SyncResult<TargetGroup>> + Send;

    /// Delete a group by target-assigned id.
    fn delete_group(&self, id: &str) -> impl Future<Output = SyncResult<()>> + Send;
}
