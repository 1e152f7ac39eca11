use std::sync::Arc;

use log::{info, warn};
use mongodb::bson::oid::ObjectId;

use crate::cache::{HOME_PATH, PageCache, revalidate_paths, thread_path};
use crate::database::DocumentStore;
use crate::thread::model::{Thread, ThreadView};
use crate::thread::populate::{Populate, populate_threads};
use crate::utils::error::{CustomError, action_failed};
use crate::utils::pagination::{Page, PageWindow};

pub struct CreateThreadParams {
    pub text: String,
    /// `_id` of the authoring user.
    pub author: ObjectId,
    /// External id of the community to post into, if any.
    pub community_id: Option<String>,
    pub path: String,
}

pub struct AddCommentParams {
    pub thread_id: String,
    pub comment_text: String,
    /// `_id` of the replying user.
    pub user_id: ObjectId,
    pub path: String,
}

fn require_text(text: &str) -> Result<(), CustomError> {
    if text.trim().is_empty() {
        return Err(CustomError::ValidationError(
            "Thread text cannot be empty".to_string(),
        ));
    }
    Ok(())
}

pub struct ThreadService {
    store: Arc<dyn DocumentStore>,
    cache: Arc<dyn PageCache>,
}

impl ThreadService {
    pub fn new(store: Arc<dyn DocumentStore>, cache: Arc<dyn PageCache>) -> Self {
        ThreadService { store, cache }
    }

    /// Insert a top-level thread and link it from its author and community.
    ///
    /// The writes are independent: if a later one fails the thread stays.
    pub async fn create_thread(&self, params: CreateThreadParams) -> Result<ThreadView, CustomError> {
        self.try_create_thread(params)
            .await
            .map_err(action_failed("Error creating thread"))
    }

    async fn try_create_thread(&self, params: CreateThreadParams) -> Result<ThreadView, CustomError> {
        require_text(&params.text)?;

        let community = match params.community_id.as_deref() {
            Some(id) => self.store.find_community_by_external_id(id).await?,
            None => None,
        };

        let mut thread = Thread::new(params.text, params.author);
        thread.community = community.as_ref().map(|c| c.id);
        self.store.insert_thread(&thread).await?;

        if !self.store.push_user_thread(&params.author, &thread.id).await? {
            warn!("Thread {} created for unknown author {}", thread.id, params.author);
        }

        if let Some(community) = &community {
            self.store
                .push_community_thread(&community.id, &thread.id)
                .await?;
        }

        info!("Thread {} created by {}", thread.id, params.author);
        revalidate_paths(self.cache.as_ref(), vec![params.path, HOME_PATH.to_string()]).await;

        let mut views = populate_threads(
            self.store.as_ref(),
            vec![thread],
            Populate {
                reply_depth: 0,
                community: true,
            },
        )
        .await?;

        views
            .pop()
            .ok_or_else(|| CustomError::InternalServerError("Created thread vanished".to_string()))
    }

    /// Top-level threads, newest first, with authors, communities and one
    /// level of replies.
    pub async fn fetch_posts(
        &self,
        page_number: Option<u64>,
        page_size: Option<u64>,
    ) -> Result<Page<ThreadView>, CustomError> {
        self.try_fetch_posts(PageWindow::new(page_number, page_size))
            .await
            .map_err(action_failed("Error fetching posts"))
    }

    async fn try_fetch_posts(&self, window: PageWindow) -> Result<Page<ThreadView>, CustomError> {
        let threads = self.store.find_top_level_threads(window).await?;
        let total = self.store.count_top_level_threads().await?;
        let is_next = window.is_next(total, threads.len());

        let items = populate_threads(
            self.store.as_ref(),
            threads,
            Populate {
                reply_depth: 1,
                community: true,
            },
        )
        .await?;

        Ok(Page { items, is_next })
    }

    /// One thread with its replies and their replies.
    pub async fn fetch_thread_by_id(&self, id: &str) -> Result<ThreadView, CustomError> {
        self.try_fetch_thread_by_id(id)
            .await
            .map_err(action_failed("Error fetching thread"))
    }

    async fn try_fetch_thread_by_id(&self, id: &str) -> Result<ThreadView, CustomError> {
        let id = ObjectId::parse_str(id)?;
        let thread = self
            .store
            .find_thread(&id)
            .await?
            .ok_or_else(|| CustomError::NotFoundError("Thread not found".to_string()))?;

        let mut views = populate_threads(
            self.store.as_ref(),
            vec![thread],
            Populate {
                reply_depth: 2,
                community: true,
            },
        )
        .await?;

        views
            .pop()
            .ok_or_else(|| CustomError::NotFoundError("Thread not found".to_string()))
    }

    /// Save a reply, then append it to the parent's children.
    pub async fn add_comment_to_thread(
        &self,
        params: AddCommentParams,
    ) -> Result<ThreadView, CustomError> {
        self.try_add_comment(params)
            .await
            .map_err(action_failed("Error adding comment to the thread"))
    }

    async fn try_add_comment(&self, params: AddCommentParams) -> Result<ThreadView, CustomError> {
        require_text(&params.comment_text)?;

        let thread_id = ObjectId::parse_str(&params.thread_id)?;
        let original = self
            .store
            .find_thread(&thread_id)
            .await?
            .ok_or_else(|| CustomError::NotFoundError("Thread not found".to_string()))?;

        let comment = Thread::reply_to(&original.id, params.comment_text, params.user_id);
        self.store.insert_thread(&comment).await?;

        if !self.store.push_thread_child(&original.id, &comment.id).await? {
            // Parent disappeared between the two writes; the reply is orphaned.
            return Err(CustomError::NotFoundError("Thread not found".to_string()));
        }

        info!("Reply {} added to thread {}", comment.id, original.id);

        // The feed embeds replies one level down and a thread page two levels.
        let mut stale = vec![
            params.path,
            HOME_PATH.to_string(),
            thread_path(&original.id.to_hex()),
        ];
        if let Some(grandparent) = original.parent_id {
            stale.push(thread_path(&grandparent.to_hex()));
        }
        revalidate_paths(self.cache.as_ref(), stale).await;

        let mut views =
            populate_threads(self.store.as_ref(), vec![comment], Populate::AUTHOR_ONLY).await?;

        views
            .pop()
            .ok_or_else(|| CustomError::InternalServerError("Created reply vanished".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::model::Community;
    use crate::database::store::{CommunityStore, ThreadStore, UserStore};
    use crate::test_support::{TestApp, onboard};

    fn create_params(text: &str, author: ObjectId, community_id: Option<&str>) -> CreateThreadParams {
        CreateThreadParams {
            text: text.to_string(),
            author,
            community_id: community_id.map(str::to_string),
            path: "/".to_string(),
        }
    }

    fn comment_params(thread_id: &str, text: &str, user_id: ObjectId) -> AddCommentParams {
        AddCommentParams {
            thread_id: thread_id.to_string(),
            comment_text: text.to_string(),
            user_id,
            path: format!("/thread/{}", thread_id),
        }
    }

    #[actix_web::test]
    async fn create_thread_links_author_and_community() {
        let app = TestApp::new();
        let author = onboard(&app, "user_1", "ada").await;
        let community = Community::new("org_1", "rustaceans", "Rustaceans");
        let community_oid = community.id;
        app.store.insert_community(community).await;

        let view = app
            .threads
            .create_thread(create_params("hello", author.id, Some("org_1")))
            .await
            .unwrap();

        let thread_id = ObjectId::parse_str(&view.id).unwrap();
        let user = app.store.find_user_by_external_id("user_1").await.unwrap().unwrap();
        assert_eq!(user.threads, vec![thread_id]);

        let communities = app.store.find_communities_by_ids(&[community_oid]).await.unwrap();
        assert_eq!(communities[0].threads, vec![thread_id]);
        assert_eq!(view.community.unwrap().id, "org_1");
        assert_eq!(view.author.unwrap().id, "user_1");
        assert_eq!(app.cache.revalidated_paths().await, vec!["/".to_string()]);
    }

    #[actix_web::test]
    async fn create_thread_with_unknown_community_leaves_it_empty() {
        let app = TestApp::new();
        let author = onboard(&app, "user_1", "ada").await;

        let view = app
            .threads
            .create_thread(create_params("hello", author.id, Some("org_missing")))
            .await
            .unwrap();

        assert!(view.community.is_none());
        let stored = app
            .store
            .find_thread(&ObjectId::parse_str(&view.id).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.community, None);
    }

    #[actix_web::test]
    async fn create_thread_rejects_blank_text() {
        let app = TestApp::new();
        let author = onboard(&app, "user_1", "ada").await;

        let err = app
            .threads
            .create_thread(create_params("   ", author.id, None))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            CustomError::ValidationError(
                "Error creating thread: Thread text cannot be empty".to_string()
            )
        );
        assert_eq!(app.store.count_top_level_threads().await.unwrap(), 0);
    }

    #[actix_web::test]
    async fn comment_on_missing_thread_fails_without_orphan() {
        let app = TestApp::new();
        let author = onboard(&app, "user_1", "ada").await;
        let missing = ObjectId::new().to_hex();

        let err = app
            .threads
            .add_comment_to_thread(comment_params(&missing, "hi", author.id))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            CustomError::NotFoundError(
                "Error adding comment to the thread: Thread not found".to_string()
            )
        );
        assert!(app.store.find_threads_by_author(&author.id).await.unwrap().is_empty());
        assert!(app.cache.revalidated_paths().await.is_empty());
    }

    #[actix_web::test]
    async fn comment_with_malformed_id_is_a_bad_request() {
        let app = TestApp::new();
        let author = onboard(&app, "user_1", "ada").await;

        let err = app
            .threads
            .add_comment_to_thread(comment_params("not-an-id", "hi", author.id))
            .await
            .unwrap_err();

        assert!(matches!(err, CustomError::BadRequestError(_)));
        assert!(err.message().starts_with("Error adding comment to the thread: "));
    }

    #[actix_web::test]
    async fn comment_is_appended_to_parent_once() {
        let app = TestApp::new();
        let author = onboard(&app, "user_1", "ada").await;
        let replier = onboard(&app, "user_2", "grace").await;

        let parent = app
            .threads
            .create_thread(create_params("root", author.id, None))
            .await
            .unwrap();
        let reply = app
            .threads
            .add_comment_to_thread(comment_params(&parent.id, "first!", replier.id))
            .await
            .unwrap();

        let parent_oid = ObjectId::parse_str(&parent.id).unwrap();
        let stored = app.store.find_thread(&parent_oid).await.unwrap().unwrap();
        let reply_oid = ObjectId::parse_str(&reply.id).unwrap();

        assert_eq!(stored.children, vec![reply_oid]);
        assert_eq!(reply.parent_id.as_deref(), Some(parent.id.as_str()));
        assert_eq!(
            app.cache.revalidated_paths().await,
            vec!["/".to_string(), thread_path(&parent.id), "/".to_string()]
        );
    }

    #[actix_web::test]
    async fn nested_reply_revalidates_feed_parent_and_root_pages() {
        let app = TestApp::new();
        let author = onboard(&app, "user_1", "ada").await;

        let root = app
            .threads
            .create_thread(create_params("root", author.id, None))
            .await
            .unwrap();
        let reply = app
            .threads
            .add_comment_to_thread(comment_params(&root.id, "a", author.id))
            .await
            .unwrap();

        let before = app.cache.revalidated_paths().await.len();
        app.threads
            .add_comment_to_thread(comment_params(&reply.id, "a.1", author.id))
            .await
            .unwrap();
        let revalidated = app.cache.revalidated_paths().await.split_off(before);

        assert_eq!(
            revalidated,
            vec![thread_path(&reply.id), HOME_PATH.to_string(), thread_path(&root.id)]
        );
    }

    #[actix_web::test]
    async fn create_thread_from_another_page_revalidates_the_feed() {
        let app = TestApp::new();
        let author = onboard(&app, "user_1", "ada").await;

        let mut params = create_params("hello", author.id, None);
        params.path = "/create-thread".to_string();
        app.threads.create_thread(params).await.unwrap();

        assert_eq!(
            app.cache.revalidated_paths().await,
            vec!["/create-thread".to_string(), HOME_PATH.to_string()]
        );
    }

    #[actix_web::test]
    async fn fetch_posts_paginates_top_level_threads() {
        let app = TestApp::new();
        let author = onboard(&app, "user_1", "ada").await;

        let mut ids = Vec::new();
        for text in ["one", "two", "three"] {
            let view = app
                .threads
                .create_thread(create_params(text, author.id, None))
                .await
                .unwrap();
            ids.push(view.id);
        }
        app.threads
            .add_comment_to_thread(comment_params(&ids[0], "reply", author.id))
            .await
            .unwrap();

        let first = app.threads.fetch_posts(Some(1), Some(2)).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert!(first.is_next);
        assert_eq!(first.items[0].text, "three");
        assert_eq!(first.items[1].text, "two");

        let second = app.threads.fetch_posts(Some(2), Some(2)).await.unwrap();
        assert_eq!(second.items.len(), 1);
        assert!(!second.is_next);
        assert_eq!(second.items[0].text, "one");
        assert_eq!(second.items[0].children.len(), 1);
        assert_eq!(second.items[0].children[0].author.as_ref().unwrap().name, "ada");
    }

    #[actix_web::test]
    async fn fetch_posts_caps_oversized_pages() {
        let app = TestApp::new();
        let author = onboard(&app, "user_1", "ada").await;
        app.threads
            .create_thread(create_params("only", author.id, None))
            .await
            .unwrap();

        let whole = app.threads.fetch_posts(Some(1), Some(u64::MAX)).await.unwrap();
        assert_eq!(whole.items.len(), 1);
        assert!(!whole.is_next);

        let beyond = app.threads.fetch_posts(Some(u64::MAX), Some(u64::MAX)).await.unwrap();
        assert!(beyond.items.is_empty());
        assert!(!beyond.is_next);
    }

    #[actix_web::test]
    async fn fetch_thread_by_id_populates_two_reply_levels_in_order() {
        let app = TestApp::new();
        let author = onboard(&app, "user_1", "ada").await;
        let replier = onboard(&app, "user_2", "grace").await;

        let root = app
            .threads
            .create_thread(create_params("root", author.id, None))
            .await
            .unwrap();
        let first = app
            .threads
            .add_comment_to_thread(comment_params(&root.id, "a", replier.id))
            .await
            .unwrap();
        app.threads
            .add_comment_to_thread(comment_params(&root.id, "b", author.id))
            .await
            .unwrap();
        app.threads
            .add_comment_to_thread(comment_params(&first.id, "a.1", author.id))
            .await
            .unwrap();

        let view = app.threads.fetch_thread_by_id(&root.id).await.unwrap();
        let texts: Vec<&str> = view.children.iter().map(|c| c.text.as_str()).collect();

        assert_eq!(texts, vec!["a", "b"]);
        assert_eq!(view.reply_count, 2);
        assert_eq!(view.children[0].children.len(), 1);
        assert_eq!(view.children[0].children[0].text, "a.1");
        assert_eq!(view.children[0].author.as_ref().unwrap().id, "user_2");
    }

    #[actix_web::test]
    async fn fetch_missing_thread_is_not_found() {
        let app = TestApp::new();

        let err = app
            .threads
            .fetch_thread_by_id(&ObjectId::new().to_hex())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            CustomError::NotFoundError("Error fetching thread: Thread not found".to_string())
        );
    }
}
