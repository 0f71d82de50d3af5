//! Target state reader: pages through the endpoint's current users and
//! groups.
//!
//! The reader only terminates after explicitly observing end-of-results; a
//! short or empty page short of `total_results` fails the read rather than
//! letting an incomplete listing masquerade as "entity missing".

use crate::adapter::{Page, TargetDirectory};
use crate::error::{SyncError, SyncResult};
use crate::model::{TargetGroup, TargetUser};
use log::debug;
use std::sync::Arc;

/// Page size for target listings.
const PAGE_SIZE: usize = 100;

/// Cap on resources fetched per type. A target exceeding it fails the
/// read; reconciling against a truncated listing would produce bogus
/// deletes.
const MAX_RESOURCES: usize = 50_000;

/// Reads the full provisioned state from the target endpoint.
pub struct TargetStateReader<T> {
    target: Arc<T>,
}

impl<T: TargetDirectory> TargetStateReader<T> {
    pub fn new(target: Arc<T>) -> Self {
        Self { target }
    }

    /// Fetch all provisioned users and groups.
    pub async fn read(&self) -> SyncResult<(Vec<TargetUser>, Vec<TargetGroup>)> {
        let users = self
            .collect("users", |start| self.target.list_users(start, PAGE_SIZE))
            .await?;
        let groups = self
            .collect("groups", |start| self.target.list_groups(start, PAGE_SIZE))
            .await?;
        debug!(
            "Target state: {} users, {} groups provisioned",
            users.len(),
            groups.len()
        );
        Ok((users, groups))
    }

    /// Fetch only the provisioned users.
    pub async fn read_users(&self) -> SyncResult<Vec<TargetUser>> {
        self.collect("users", |start| self.target.list_users(start, PAGE_SIZE))
            .await
    }

    /// Fetch only the provisioned groups.
    pub async fn read_groups(&self) -> SyncResult<Vec<TargetGroup>> {
        self.collect("groups", |start| self.target.list_groups(start, PAGE_SIZE))
            .await
    }

    async fn collect<R, F, Fut>(&self, what: &str, mut fetch: F) -> SyncResult<Vec<R>>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = SyncResult<Page<R>>>,
    {
        let mut all: Vec<R> = Vec::new();
        let mut start_index = 1usize;

        loop {
            let page = fetch(start_index).await?;
            let fetched = page.resources.len();
            all.extend(page.resources);

            if all.len() > MAX_RESOURCES {
                return Err(SyncError::target_unavailable(format!(
                    "target reported more than {MAX_RESOURCES} {what}; refusing truncated state"
                )));
            }
            if all.len() >= page.total_results {
                // End of results explicitly observed.
                return Ok(all);
            }
            if fetched == 0 {
                // The endpoint promised more results than it delivered.
                return Err(SyncError::target_unavailable(format!(
                    "target {what} listing ended at {} of {} expected resources",
                    all.len(),
                    page.total_results
                )));
            }
            start_index += fetched;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GroupPayload, UserPayload};
    use std::future::Future;

    /// Target fake yielding a fixed user list through honest pagination,
    /// with an optional lie in `total_results`.
    struct PagedTarget {
        users: Vec<TargetUser>,
        inflate_total: usize,
    }

    fn user(n: usize) -> TargetUser {
        TargetUser {
            id: format!("scim-{n}"),
            user_name: format!("user{n}"),
            external_id: Some(format!("kc-{n}")),
            display_name: None,
            given_name: None,
            family_name: None,
            email: None,
            active: true,
        }
    }

    impl TargetDirectory for PagedTarget {
        fn list_users(
            &self,
            start_index: usize,
            count: usize,
        ) -> impl Future<Output = SyncResult<Page<TargetUser>>> + Send {
            let slice: Vec<TargetUser> = self
                .users
                .iter()
                .skip(start_index - 1)
                .take(count)
                .cloned()
                .collect();
            let page = Page {
                resources: slice,
                total_results: self.users.len() + self.inflate_total,
                start_index,
            };
            async move { Ok(page) }
        }

        fn list_groups(
            &self,
            start_index: usize,
            _count: usize,
        ) -> impl Future<Output = SyncResult<Page<TargetGroup>>> + Send {
            async move {
                Ok(Page {
                    resources: Vec::new(),
                    total_results: 0,
                    start_index,
                })
            }
        }

        fn create_user(
            &self,
            _user: &UserPayload,
        ) -> impl Future<Output = SyncResult<TargetUser>> + Send {
            async move { Err(SyncError::target_rejected(501, "read-only fake")) }
        }

        fn update_user(
            &self,
            _id: &str,
            _user: &UserPayload,
        ) -> impl Future<Output = SyncResult<TargetUser>> + Send {
            async move { Err(SyncError::target_rejected(501, "read-only fake")) }
        }

        fn delete_user(&self, _id: &str) -> impl Future<Output = SyncResult<()>> + Send {
            async move { Err(SyncError::target_rejected(501, "read-only fake")) }
        }

        fn create_group(
            &self,
            _group: &GroupPayload,
        ) -> impl Future<Output = SyncResult<TargetGroup>> + Send {
            async move { Err(SyncError::target_rejected(501, "read-only fake")) }
        }

        fn delete_group(&self, _id: &str) -> impl Future<Output = SyncResult<()>> + Send {
            async move { Err(SyncError::target_rejected(501, "read-only fake")) }
        }
    }

    #[tokio::test]
    async fn test_reads_across_multiple_pages() {
        let target = PagedTarget {
            users: (0..250).map(user).collect(),
            inflate_total: 0,
        };
        let reader = TargetStateReader::new(Arc::new(target));
        let users = reader.read_users().await.unwrap();
        assert_eq!(users.len(), 250);
        assert_eq!(users[249].user_name, "user249");
    }

    #[tokio::test]
    async fn test_empty_target_is_fine() {
        let target = PagedTarget {
            users: Vec::new(),
            inflate_total: 0,
        };
        let reader = TargetStateReader::new(Arc::new(target));
        let (users, groups) = reader.read().await.unwrap();
        assert!(users.is_empty());
        assert!(groups.is_empty());
    }

    #[tokio::test]
    async fn test_short_listing_fails_instead_of_concluding_missing() {
        // The endpoint claims 10 more resources than it ever returns.
        let target = PagedTarget {
            users: (0..50).map(user).collect(),
            inflate_total: 10,
        };
        let reader = TargetStateReader::new(Arc::new(target));
        let result = reader.read_users().await;
        assert!(matches!(result, Err(SyncError::TargetUnavailable { .. })));
    }
}
