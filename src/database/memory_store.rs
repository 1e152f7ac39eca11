use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use regex::{Regex, RegexBuilder};
use tokio::sync::RwLock;

use crate::community::model::Community;
use crate::database::store::{CommunityStore, ThreadStore, UserStore};
use crate::thread::model::Thread;
use crate::user::model::{User, UserProfileUpdate, UserSearch};
use crate::utils::error::CustomError;
use crate::utils::pagination::{PageWindow, SortOrder};

#[derive(Default)]
struct Collections {
    users: Vec<User>,
    threads: Vec<Thread>,
    communities: Vec<Community>,
}

/// In-process document store with the same query semantics as [`MongoStore`].
///
/// Every call holds the lock for one primitive operation only, so multi-step
/// actions interleave exactly as they would against the database.
///
/// [`MongoStore`]: crate::database::mongo_store::MongoStore
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Communities are created outside this service; this seeds one.
    #[cfg(test)]
    pub async fn insert_community(&self, community: Community) {
        self.inner.write().await.communities.push(community);
    }
}

fn newest_first(a: &Thread, b: &Thread) -> Ordering {
    b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
}

fn search_pattern(search: &UserSearch) -> Result<Option<Regex>, CustomError> {
    search
        .text
        .as_deref()
        .map(|text| {
            RegexBuilder::new(&regex::escape(text))
                .case_insensitive(true)
                .build()
                .map_err(|e| CustomError::BadRequestError(e.to_string()))
        })
        .transpose()
}

fn user_matches(user: &User, search: &UserSearch, pattern: Option<&Regex>) -> bool {
    if user.external_id == search.exclude_id {
        return false;
    }

    match pattern {
        Some(re) => re.is_match(&user.username) || re.is_match(&user.name),
        None => true,
    }
}

fn paginate<T: Clone>(items: &[T], window: PageWindow) -> Vec<T> {
    items
        .iter()
        .skip(window.skip as usize)
        .take(window.limit as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl ThreadStore for MemoryStore {
    async fn insert_thread(&self, thread: &Thread) -> Result<(), CustomError> {
        self.inner.write().await.threads.push(thread.clone());
        Ok(())
    }

    async fn find_thread(&self, id: &ObjectId) -> Result<Option<Thread>, CustomError> {
        let inner = self.inner.read().await;
        Ok(inner.threads.iter().find(|t| t.id == *id).cloned())
    }

    async fn find_threads_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Thread>, CustomError> {
        let inner = self.inner.read().await;
        Ok(inner
            .threads
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn find_top_level_threads(&self, window: PageWindow) -> Result<Vec<Thread>, CustomError> {
        let inner = self.inner.read().await;
        let mut top_level: Vec<Thread> = inner
            .threads
            .iter()
            .filter(|t| t.is_top_level())
            .cloned()
            .collect();
        top_level.sort_by(newest_first);

        Ok(paginate(&top_level, window))
    }

    async fn count_top_level_threads(&self) -> Result<u64, CustomError> {
        let inner = self.inner.read().await;
        Ok(inner.threads.iter().filter(|t| t.is_top_level()).count() as u64)
    }

    async fn find_threads_by_author(&self, author: &ObjectId) -> Result<Vec<Thread>, CustomError> {
        let inner = self.inner.read().await;
        Ok(inner
            .threads
            .iter()
            .filter(|t| t.author == *author)
            .cloned()
            .collect())
    }

    async fn find_threads_excluding_author(
        &self,
        ids: &[ObjectId],
        author: &ObjectId,
    ) -> Result<Vec<Thread>, CustomError> {
        let inner = self.inner.read().await;
        Ok(inner
            .threads
            .iter()
            .filter(|t| ids.contains(&t.id) && t.author != *author)
            .cloned()
            .collect())
    }

    async fn push_thread_child(
        &self,
        parent: &ObjectId,
        child: &ObjectId,
    ) -> Result<bool, CustomError> {
        let mut inner = self.inner.write().await;
        match inner.threads.iter_mut().find(|t| t.id == *parent) {
            Some(thread) => {
                thread.children.push(*child);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn upsert_user(&self, update: &UserProfileUpdate) -> Result<(), CustomError> {
        let mut inner = self.inner.write().await;

        match inner
            .users
            .iter_mut()
            .find(|u| u.external_id == update.user_id)
        {
            Some(user) => {
                user.username = update.username.clone();
                user.name = update.name.clone();
                user.bio = update.bio.clone();
                user.image = update.image.clone();
                user.onboarded = true;
            }
            None => inner.users.push(User {
                id: ObjectId::new(),
                external_id: update.user_id.clone(),
                username: update.username.clone(),
                name: update.name.clone(),
                image: update.image.clone(),
                bio: update.bio.clone(),
                onboarded: true,
                threads: Vec::new(),
                communities: Vec::new(),
                created_at: Utc::now(),
            }),
        }

        Ok(())
    }

    async fn find_user_by_external_id(&self, id: &str) -> Result<Option<User>, CustomError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.external_id == id).cloned())
    }

    async fn find_users_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<User>, CustomError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn search_users(
        &self,
        search: &UserSearch,
        window: PageWindow,
    ) -> Result<Vec<User>, CustomError> {
        let pattern = search_pattern(search)?;
        let inner = self.inner.read().await;

        let mut matched: Vec<User> = inner
            .users
            .iter()
            .filter(|u| user_matches(u, search, pattern.as_ref()))
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            let oldest_first = a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id));
            match search.sort_by {
                SortOrder::Asc => oldest_first,
                SortOrder::Desc => oldest_first.reverse(),
            }
        });

        Ok(paginate(&matched, window))
    }

    async fn count_users(&self, search: &UserSearch) -> Result<u64, CustomError> {
        let pattern = search_pattern(search)?;
        let inner = self.inner.read().await;

        Ok(inner
            .users
            .iter()
            .filter(|u| user_matches(u, search, pattern.as_ref()))
            .count() as u64)
    }

    async fn push_user_thread(&self, user: &ObjectId, thread: &ObjectId) -> Result<bool, CustomError> {
        let mut inner = self.inner.write().await;
        match inner.users.iter_mut().find(|u| u.id == *user) {
            Some(user) => {
                user.threads.push(*thread);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl CommunityStore for MemoryStore {
    async fn find_community_by_external_id(
        &self,
        id: &str,
    ) -> Result<Option<Community>, CustomError> {
        let inner = self.inner.read().await;
        Ok(inner.communities.iter().find(|c| c.external_id == id).cloned())
    }

    async fn find_communities_by_ids(
        &self,
        ids: &[ObjectId],
    ) -> Result<Vec<Community>, CustomError> {
        let inner = self.inner.read().await;
        Ok(inner
            .communities
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }

    async fn push_community_thread(
        &self,
        community: &ObjectId,
        thread: &ObjectId,
    ) -> Result<bool, CustomError> {
        let mut inner = self.inner.write().await;
        match inner.communities.iter_mut().find(|c| c.id == *community) {
            Some(community) => {
                community.threads.push(*thread);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(user_id: &str, username: &str, name: &str) -> UserProfileUpdate {
        UserProfileUpdate {
            user_id: user_id.into(),
            username: username.into(),
            name: name.into(),
            bio: None,
            image: None,
        }
    }

    #[actix_web::test]
    async fn upsert_updates_in_place() {
        let store = MemoryStore::new();
        store.upsert_user(&profile("u1", "ada", "Ada")).await.unwrap();
        store.upsert_user(&profile("u1", "ada_l", "Ada L")).await.unwrap();

        let search = UserSearch {
            exclude_id: String::new(),
            text: None,
            sort_by: SortOrder::Desc,
        };
        assert_eq!(store.count_users(&search).await.unwrap(), 1);

        let user = store.find_user_by_external_id("u1").await.unwrap().unwrap();
        assert_eq!(user.username, "ada_l");
        assert!(user.onboarded);
    }

    #[actix_web::test]
    async fn search_matches_username_or_name_case_insensitively() {
        let store = MemoryStore::new();
        store.upsert_user(&profile("u1", "grace", "Grace Hopper")).await.unwrap();
        store.upsert_user(&profile("u2", "linus", "Linus")).await.unwrap();
        store.upsert_user(&profile("u3", "ken", "HOPPER fan")).await.unwrap();

        let search = UserSearch {
            exclude_id: "nobody".into(),
            text: Some("hopper".into()),
            sort_by: SortOrder::Asc,
        };
        let found = store.search_users(&search, PageWindow::new(None, None)).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|u| u.external_id.as_str()).collect();

        assert_eq!(ids, vec!["u1", "u3"]);
    }

    #[actix_web::test]
    async fn push_child_reports_missing_parent() {
        let store = MemoryStore::new();
        let pushed = store
            .push_thread_child(&ObjectId::new(), &ObjectId::new())
            .await
            .unwrap();
        assert!(!pushed);
    }

    #[actix_web::test]
    async fn top_level_threads_are_newest_first() {
        let store = MemoryStore::new();
        let author = ObjectId::new();
        let first = Thread::new("first".into(), author);
        let second = Thread::new("second".into(), author);
        let reply = Thread::reply_to(&first.id, "reply".into(), author);

        for thread in [&first, &second, &reply] {
            store.insert_thread(thread).await.unwrap();
        }

        let page = store
            .find_top_level_threads(PageWindow::new(None, None))
            .await
            .unwrap();
        let texts: Vec<&str> = page.iter().map(|t| t.text.as_str()).collect();

        assert_eq!(texts, vec!["second", "first"]);
        assert_eq!(store.count_top_level_threads().await.unwrap(), 2);
    }
}
