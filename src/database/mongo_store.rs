use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{self, Document, doc, oid::ObjectId};
use mongodb::{Client, Collection};

use crate::community::model::Community;
use crate::database::store::{CommunityStore, ThreadStore, UserStore};
use crate::thread::model::Thread;
use crate::user::model::{User, UserProfileUpdate, UserSearch};
use crate::utils::error::CustomError;
use crate::utils::pagination::PageWindow;

/// MongoDB-backed document store.
pub struct MongoStore {
    users: Collection<User>,
    threads: Collection<Thread>,
    communities: Collection<Community>,
}

impl MongoStore {
    pub fn new(client: &Client, database: &str) -> Self {
        let db = client.database(database);

        MongoStore {
            users: db.collection::<User>("users"),
            threads: db.collection::<Thread>("threads"),
            communities: db.collection::<Community>("communities"),
        }
    }
}

/// `parent_id: null` also matches documents where the field is missing.
fn top_level_filter() -> Document {
    doc! { "parent_id": null }
}

fn user_search_filter(search: &UserSearch) -> Document {
    let mut filter = doc! { "id": { "$ne": &search.exclude_id } };

    if let Some(text) = &search.text {
        let pattern = regex::escape(text);
        filter.insert(
            "$or",
            vec![
                doc! { "username": { "$regex": &pattern, "$options": "i" } },
                doc! { "name": { "$regex": &pattern, "$options": "i" } },
            ],
        );
    }

    filter
}

#[async_trait]
impl ThreadStore for MongoStore {
    async fn insert_thread(&self, thread: &Thread) -> Result<(), CustomError> {
        self.threads.insert_one(thread).await?;
        Ok(())
    }

    async fn find_thread(&self, id: &ObjectId) -> Result<Option<Thread>, CustomError> {
        Ok(self.threads.find_one(doc! { "_id": id }).await?)
    }

    async fn find_threads_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Thread>, CustomError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let cursor = self.threads.find(doc! { "_id": { "$in": ids } }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_top_level_threads(&self, window: PageWindow) -> Result<Vec<Thread>, CustomError> {
        let cursor = self
            .threads
            .find(top_level_filter())
            .sort(doc! { "created_at": -1, "_id": -1 })
            .skip(window.skip)
            .limit(window.limit as i64)
            .await?;

        Ok(cursor.try_collect().await?)
    }

    async fn count_top_level_threads(&self) -> Result<u64, CustomError> {
        Ok(self.threads.count_documents(top_level_filter()).await?)
    }

    async fn find_threads_by_author(&self, author: &ObjectId) -> Result<Vec<Thread>, CustomError> {
        let cursor = self.threads.find(doc! { "author": author }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_threads_excluding_author(
        &self,
        ids: &[ObjectId],
        author: &ObjectId,
    ) -> Result<Vec<Thread>, CustomError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let cursor = self
            .threads
            .find(doc! { "_id": { "$in": ids }, "author": { "$ne": author } })
            .await?;

        Ok(cursor.try_collect().await?)
    }

    async fn push_thread_child(
        &self,
        parent: &ObjectId,
        child: &ObjectId,
    ) -> Result<bool, CustomError> {
        let result = self
            .threads
            .update_one(doc! { "_id": parent }, doc! { "$push": { "children": child } })
            .await?;

        Ok(result.matched_count > 0)
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn upsert_user(&self, update: &UserProfileUpdate) -> Result<(), CustomError> {
        self.users
            .update_one(
                doc! { "id": &update.user_id },
                doc! {
                    "$set": {
                        "username": &update.username,
                        "name": &update.name,
                        "bio": update.bio.clone(),
                        "image": update.image.clone(),
                        "onboarded": true,
                    },
                    "$setOnInsert": {
                        "threads": [],
                        "communities": [],
                        "created_at": bson::DateTime::now(),
                    },
                },
            )
            .upsert(true)
            .await?;

        Ok(())
    }

    async fn find_user_by_external_id(&self, id: &str) -> Result<Option<User>, CustomError> {
        Ok(self.users.find_one(doc! { "id": id }).await?)
    }

    async fn find_users_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<User>, CustomError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let cursor = self.users.find(doc! { "_id": { "$in": ids } }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn search_users(
        &self,
        search: &UserSearch,
        window: PageWindow,
    ) -> Result<Vec<User>, CustomError> {
        let direction = search.sort_by.as_mongo();

        let cursor = self
            .users
            .find(user_search_filter(search))
            .sort(doc! { "created_at": direction, "_id": direction })
            .skip(window.skip)
            .limit(window.limit as i64)
            .await?;

        Ok(cursor.try_collect().await?)
    }

    async fn count_users(&self, search: &UserSearch) -> Result<u64, CustomError> {
        Ok(self.users.count_documents(user_search_filter(search)).await?)
    }

    async fn push_user_thread(&self, user: &ObjectId, thread: &ObjectId) -> Result<bool, CustomError> {
        let result = self
            .users
            .update_one(doc! { "_id": user }, doc! { "$push": { "threads": thread } })
            .await?;

        Ok(result.matched_count > 0)
    }
}

#[async_trait]
impl CommunityStore for MongoStore {
    async fn find_community_by_external_id(
        &self,
        id: &str,
    ) -> Result<Option<Community>, CustomError> {
        Ok(self.communities.find_one(doc! { "id": id }).await?)
    }

    async fn find_communities_by_ids(
        &self,
        ids: &[ObjectId],
    ) -> Result<Vec<Community>, CustomError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let cursor = self.communities.find(doc! { "_id": { "$in": ids } }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn push_community_thread(
        &self,
        community: &ObjectId,
        thread: &ObjectId,
    ) -> Result<bool, CustomError> {
        let result = self
            .communities
            .update_one(doc! { "_id": community }, doc! { "$push": { "threads": thread } })
            .await?;

        Ok(result.matched_count > 0)
    }
}
