//! Document-store seams used by the thread and user actions.
//!
//! Each method is a single query or single-document mutation. Relation
//! population happens above this layer, so both backends share it.

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::community::model::Community;
use crate::thread::model::Thread;
use crate::user::model::{User, UserProfileUpdate, UserSearch};
use crate::utils::error::CustomError;
use crate::utils::pagination::PageWindow;

#[async_trait]
pub trait ThreadStore: Send + Sync {
    async fn insert_thread(&self, thread: &Thread) -> Result<(), CustomError>;

    async fn find_thread(&self, id: &ObjectId) -> Result<Option<Thread>, CustomError>;

    /// Threads whose id is in `ids`, in no particular order. Unknown ids are skipped.
    async fn find_threads_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Thread>, CustomError>;

    /// Threads without a parent, newest first.
    async fn find_top_level_threads(&self, window: PageWindow) -> Result<Vec<Thread>, CustomError>;

    async fn count_top_level_threads(&self) -> Result<u64, CustomError>;

    async fn find_threads_by_author(&self, author: &ObjectId) -> Result<Vec<Thread>, CustomError>;

    /// Threads whose id is in `ids` and whose author is not `author`.
    async fn find_threads_excluding_author(
        &self,
        ids: &[ObjectId],
        author: &ObjectId,
    ) -> Result<Vec<Thread>, CustomError>;

    /// Append `child` to the parent's `children`. Returns whether the parent matched.
    async fn push_thread_child(
        &self,
        parent: &ObjectId,
        child: &ObjectId,
    ) -> Result<bool, CustomError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create or update the user keyed by external id and mark it onboarded.
    async fn upsert_user(&self, update: &UserProfileUpdate) -> Result<(), CustomError>;

    async fn find_user_by_external_id(&self, id: &str) -> Result<Option<User>, CustomError>;

    async fn find_users_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<User>, CustomError>;

    async fn search_users(
        &self,
        search: &UserSearch,
        window: PageWindow,
    ) -> Result<Vec<User>, CustomError>;

    async fn count_users(&self, search: &UserSearch) -> Result<u64, CustomError>;

    async fn push_user_thread(&self, user: &ObjectId, thread: &ObjectId) -> Result<bool, CustomError>;
}

#[async_trait]
pub trait CommunityStore: Send + Sync {
    async fn find_community_by_external_id(&self, id: &str)
    -> Result<Option<Community>, CustomError>;

    async fn find_communities_by_ids(&self, ids: &[ObjectId])
    -> Result<Vec<Community>, CustomError>;

    async fn push_community_thread(
        &self,
        community: &ObjectId,
        thread: &ObjectId,
    ) -> Result<bool, CustomError>;
}

/// Everything the services need from a backend.
pub trait DocumentStore: ThreadStore + UserStore + CommunityStore {}

impl<T: ThreadStore + UserStore + CommunityStore> DocumentStore for T {}
