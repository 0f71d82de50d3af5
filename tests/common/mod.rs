//! Shared in-memory directory fakes for the integration tests.
//!
//! `InMemorySource` is a static picture of an identity-provider directory;
//! `InMemoryTarget` is a mutable provisioning endpoint that records the
//! order of writes so tests can assert on sequencing.

// Not every test binary exercises every helper.
#![allow(dead_code)]

use scim_sync::error::{SyncError, SyncResult};
use scim_sync::model::{GroupPayload, SourceGroup, SourceUser, TargetGroup, TargetUser, UserPayload};
use scim_sync::{Page, SourceDirectory, TargetDirectory};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// Route engine logs to the test harness when RUST_LOG is set.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A fixed source directory built from plain structs.
#[derive(Default)]
pub struct InMemorySource {
    groups: HashMap<String, SourceGroup>,
    users: HashMap<String, SourceUser>,
    /// Artificial latency on the first read call, for overlap tests.
    read_delay: Duration,
    /// When set, every read fails as transport-unavailable.
    unavailable: bool,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, group: SourceGroup) -> Self {
        self.groups.insert(group.id.clone(), group);
        self
    }

    pub fn with_user(mut self, user: SourceUser) -> Self {
        self.users.insert(user.id.clone(), user);
        self
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }
}

impl SourceDirectory for InMemorySource {
    async fn list_root_groups(&self) -> SyncResult<Vec<SourceGroup>> {
        if self.unavailable {
            return Err(SyncError::source_unavailable("connection refused"));
        }
        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }
        let mut roots: Vec<SourceGroup> = self
            .groups
            .values()
            .filter(|g| g.parent_id.is_none())
            .cloned()
            .collect();
        roots.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(roots)
    }

    async fn get_group(&self, id: &str) -> SyncResult<SourceGroup> {
        self.groups
            .get(id)
            .cloned()
            .ok_or_else(|| SyncError::source_malformed(format!("unknown group '{id}'")))
    }

    async fn list_members(&self, group_id: &str) -> SyncResult<Vec<String>> {
        let group = self.get_group(group_id).await?;
        Ok(group.member_ids)
    }

    async fn get_user(&self, id: &str) -> SyncResult<SourceUser> {
        self.users
            .get(id)
            .cloned()
            .ok_or_else(|| SyncError::source_malformed(format!("unknown user '{id}'")))
    }
}

pub fn group(id: &str, name: &str) -> SourceGroup {
    SourceGroup {
        id: id.to_string(),
        name: name.to_string(),
        attributes: HashMap::new(),
        parent_id: None,
        child_ids: Vec::new(),
        member_ids: Vec::new(),
    }
}

pub fn scoped_group(id: &str, name: &str, attribute: &str, value: &str) -> SourceGroup {
    let mut g = group(id, name);
    g.attributes
        .insert(attribute.to_string(), vec![value.to_string()]);
    g
}

pub fn child_of(mut g: SourceGroup, parent_id: &str) -> SourceGroup {
    g.parent_id = Some(parent_id.to_string());
    g
}

pub fn with_children(mut g: SourceGroup, child_ids: &[&str]) -> SourceGroup {
    g.child_ids = child_ids.iter().map(|s| s.to_string()).collect();
    g
}

pub fn with_members(mut g: SourceGroup, member_ids: &[&str]) -> SourceGroup {
    g.member_ids = member_ids.iter().map(|s| s.to_string()).collect();
    g
}

pub fn user(id: &str, username: &str) -> SourceUser {
    SourceUser {
        id: id.to_string(),
        username: username.to_string(),
        email: Some(format!("{username}@contoso.com")),
        first_name: None,
        last_name: None,
        enabled: true,
        group_ids: BTreeSet::new(),
    }
}

#[derive(Default)]
struct TargetState {
    users: Vec<TargetUser>,
    groups: Vec<TargetGroup>,
    next_id: u64,
    created_groups: Vec<String>,
    deleted_groups: Vec<String>,
    reject_user_names: HashSet<String>,
}

/// A mutable provisioning endpoint with SCIM-style paged listing.
#[derive(Default)]
pub struct InMemoryTarget {
    state: Mutex<TargetState>,
}

impl InMemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_user(&self, user: TargetUser) {
        self.state.lock().unwrap().users.push(user);
    }

    pub fn seed_group(&self, id: &str, display_name: &str) {
        self.state.lock().unwrap().groups.push(TargetGroup {
            id: id.to_string(),
            display_name: display_name.to_string(),
            external_id: None,
        });
    }

    /// Make `create_user` for this user name fail with a 400.
    pub fn reject_user(&self, user_name: &str) {
        self.state
            .lock()
            .unwrap()
            .reject_user_names
            .insert(user_name.to_string());
    }

    pub fn users(&self) -> Vec<TargetUser> {
        self.state.lock().unwrap().users.clone()
    }

    pub fn groups(&self) -> Vec<TargetGroup> {
        self.state.lock().unwrap().groups.clone()
    }

    pub fn user_by_name(&self, user_name: &str) -> Option<TargetUser> {
        self.users().into_iter().find(|u| u.user_name == user_name)
    }

    /// Display names in the order `create_group` was called.
    pub fn created_group_order(&self) -> Vec<String> {
        self.state.lock().unwrap().created_groups.clone()
    }

    /// Display names in the order `delete_group` was called.
    pub fn deleted_group_order(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted_groups.clone()
    }

    fn page<T: Clone>(items: &[T], start_index: usize, count: usize) -> Page<T> {
        let offset = start_index.saturating_sub(1);
        let resources = items
            .iter()
            .skip(offset)
            .take(count)
            .cloned()
            .collect();
        Page {
            resources,
            total_results: items.len(),
            start_index,
        }
    }
}

impl TargetDirectory for InMemoryTarget {
    async fn list_users(&self, start_index: usize, count: usize) -> SyncResult<Page<TargetUser>> {
        let state = self.state.lock().unwrap();
        Ok(Self::page(&state.users, start_index, count))
    }

    async fn list_groups(&self, start_index: usize, count: usize) -> SyncResult<Page<TargetGroup>> {
        let state = self.state.lock().unwrap();
        Ok(Self::page(&state.groups, start_index, count))
    }

    async fn create_user(&self, user: &UserPayload) -> SyncResult<TargetUser> {
        let mut state = self.state.lock().unwrap();
        if state.reject_user_names.contains(&user.user_name) {
            return Err(SyncError::target_rejected(
                400,
                format!("userName '{}' rejected", user.user_name),
            ));
        }
        state.next_id += 1;
        let created = TargetUser {
            id: format!("scim-u{}", state.next_id),
            user_name: user.user_name.clone(),
            external_id: Some(user.external_id.clone()),
            display_name: Some(user.display_name.clone()),
            given_name: Some(user.given_name.clone()),
            family_name: Some(user.family_name.clone()),
            email: user.email.clone(),
            active: user.active,
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: &str, user: &UserPayload) -> SyncResult<TargetUser> {
        let mut state = self.state.lock().unwrap();
        let existing = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| SyncError::target_rejected(404, format!("no user '{id}'")))?;
        existing.user_name = user.user_name.clone();
        existing.external_id = Some(user.external_id.clone());
        existing.display_name = Some(user.display_name.clone());
        existing.given_name = Some(user.given_name.clone());
        existing.family_name = Some(user.family_name.clone());
        existing.email = user.email.clone();
        existing.active = user.active;
        Ok(existing.clone())
    }

    async fn delete_user(&self, id: &str) -> SyncResult<()> {
        let mut state = self.state.lock().unwrap();
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        if state.users.len() == before {
            return Err(SyncError::target_rejected(404, format!("no user '{id}'")));
        }
        Ok(())
    }

    async fn create_group(&self, group: &GroupPayload) -> SyncResult<TargetGroup> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let created = TargetGroup {
            id: format!("scim-g{}", state.next_id),
            display_name: group.display_name.clone(),
            external_id: Some(group.external_id.clone()),
        };
        state.groups.push(created.clone());
        state.created_groups.push(group.display_name.clone());
        Ok(created)
    }

    async fn delete_group(&self, id: &str) -> SyncResult<()> {
        let mut state = self.state.lock().unwrap();
        let Some(position) = state.groups.iter().position(|g| g.id == id) else {
            return Err(SyncError::target_rejected(404, format!("no group '{id}'")));
        };
        let removed = state.groups.remove(position);
        state.deleted_groups.push(removed.display_name);
        Ok(())
    }
}
