use std::sync::Arc;

use log::info;
use mongodb::bson::oid::ObjectId;

use crate::cache::{HOME_PATH, PageCache, revalidate_path, revalidate_paths, thread_path};
use crate::database::DocumentStore;
use crate::thread::model::ThreadView;
use crate::thread::populate::{Populate, populate_threads};
use crate::user::model::{User, UserProfileUpdate, UserSearch, UserView};
use crate::utils::error::{CustomError, action_failed};
use crate::utils::pagination::{Page, PageWindow, SortOrder};

/// The only client path an onboarding/profile update revalidates.
pub const PROFILE_EDIT_PATH: &str = "/profile/edit";

pub struct UpdateUserParams {
    pub user_id: String,
    pub username: String,
    pub name: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub path: String,
}

#[derive(Default)]
pub struct FetchUsersParams {
    /// External id of the caller; always excluded from the results.
    pub user_id: String,
    pub search_string: Option<String>,
    pub page_number: Option<u64>,
    pub page_size: Option<u64>,
    pub sort_by: Option<SortOrder>,
}

/// A user together with their populated threads.
#[derive(Debug, Clone, serde::Serialize)]
pub struct UserPosts {
    #[serde(flatten)]
    pub user: UserView,
    pub posts: Vec<ThreadView>,
}

pub struct UserService {
    store: Arc<dyn DocumentStore>,
    cache: Arc<dyn PageCache>,
}

impl UserService {
    pub fn new(store: Arc<dyn DocumentStore>, cache: Arc<dyn PageCache>) -> Self {
        UserService { store, cache }
    }

    /// Upsert by external id, lower-casing the username and marking the user onboarded.
    pub async fn update_user(&self, params: UpdateUserParams) -> Result<(), CustomError> {
        self.try_update_user(params)
            .await
            .map_err(action_failed("Failed to create/update user"))
    }

    async fn try_update_user(&self, params: UpdateUserParams) -> Result<(), CustomError> {
        if params.username.trim().is_empty() || params.name.trim().is_empty() {
            return Err(CustomError::ValidationError(
                "Username and name are required".to_string(),
            ));
        }

        let update = UserProfileUpdate {
            user_id: params.user_id,
            username: params.username.trim().to_lowercase(),
            name: params.name,
            bio: params.bio,
            image: params.image,
        };
        self.store.upsert_user(&update).await?;
        info!("User {} onboarded as {}", update.user_id, update.username);

        if params.path == PROFILE_EDIT_PATH {
            revalidate_path(self.cache.as_ref(), &params.path).await;
        }

        // Cached pages embed the author's name and image.
        if let Some(user) = self.store.find_user_by_external_id(&update.user_id).await? {
            if !user.threads.is_empty() {
                let mut stale = vec![HOME_PATH.to_string()];
                stale.extend(user.threads.iter().map(|id| thread_path(&id.to_hex())));
                revalidate_paths(self.cache.as_ref(), stale).await;
            }
        }

        Ok(())
    }

    pub async fn fetch_user(&self, user_id: &str) -> Result<Option<User>, CustomError> {
        self.store
            .find_user_by_external_id(user_id)
            .await
            .map_err(action_failed("Failed to fetch user"))
    }

    /// Everyone but the caller, optionally filtered by username or name.
    pub async fn fetch_users(&self, params: FetchUsersParams) -> Result<Page<UserView>, CustomError> {
        self.try_fetch_users(params)
            .await
            .map_err(action_failed("Failed to fetch users"))
    }

    async fn try_fetch_users(&self, params: FetchUsersParams) -> Result<Page<UserView>, CustomError> {
        let window = PageWindow::new(params.page_number, params.page_size);
        let search = UserSearch {
            exclude_id: params.user_id,
            text: params
                .search_string
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            sort_by: params.sort_by.unwrap_or_default(),
        };

        let users = self.store.search_users(&search, window).await?;
        let total = self.store.count_users(&search).await?;

        Ok(Page {
            is_next: window.is_next(total, users.len()),
            items: users.iter().map(UserView::from).collect(),
        })
    }

    /// Replies other users left on threads authored by `user_id` (a user `_id`).
    pub async fn get_activity(&self, user_id: &ObjectId) -> Result<Vec<ThreadView>, CustomError> {
        self.try_get_activity(user_id)
            .await
            .map_err(action_failed("Failed to fetch activity"))
    }

    async fn try_get_activity(&self, user_id: &ObjectId) -> Result<Vec<ThreadView>, CustomError> {
        let user_threads = self.store.find_threads_by_author(user_id).await?;

        let child_thread_ids: Vec<ObjectId> = user_threads
            .iter()
            .flat_map(|t| t.children.iter().copied())
            .collect();

        let replies = self
            .store
            .find_threads_excluding_author(&child_thread_ids, user_id)
            .await?;

        populate_threads(self.store.as_ref(), replies, Populate::AUTHOR_ONLY).await
    }

    /// The user with their threads, each carrying community and one level of replies.
    pub async fn fetch_user_posts(&self, user_id: &str) -> Result<Option<UserPosts>, CustomError> {
        self.try_fetch_user_posts(user_id)
            .await
            .map_err(action_failed("Failed to fetch posts"))
    }

    async fn try_fetch_user_posts(&self, user_id: &str) -> Result<Option<UserPosts>, CustomError> {
        let Some(user) = self.store.find_user_by_external_id(user_id).await? else {
            return Ok(None);
        };

        let mut threads = self.store.find_threads_by_ids(&user.threads).await?;
        // Keep the order of the user's own thread list.
        threads.sort_by_key(|t| user.threads.iter().position(|id| *id == t.id));

        let posts = populate_threads(
            self.store.as_ref(),
            threads,
            Populate {
                reply_depth: 1,
                community: true,
            },
        )
        .await?;

        Ok(Some(UserPosts {
            user: UserView::from(&user),
            posts,
        }))
    }
}
