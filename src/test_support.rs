use std::sync::Arc;

use crate::cache::MemoryPageCache;
use crate::config::{AppConfig, StoreBackend};
use crate::database::MemoryStore;
use crate::state::AppState;
use crate::thread::service::ThreadService;
use crate::user::model::User;
use crate::user::service::{UpdateUserParams, UserService};

/// Services wired to in-memory backends, with handles to inspect them.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryPageCache>,
    pub threads: ThreadService,
    pub users: UserService,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryPageCache::new(60));

        TestApp {
            threads: ThreadService::new(store.clone(), cache.clone()),
            users: UserService::new(store.clone(), cache.clone()),
            store,
            cache,
        }
    }

    /// App data sharing this app's store and cache, for HTTP tests.
    pub fn state(&self) -> AppState {
        AppState::new(test_config(), self.store.clone(), self.cache.clone())
    }
}

pub const TEST_SECRET: &str = "test-secret";

pub fn test_config() -> AppConfig {
    AppConfig {
        host: "localhost".to_string(),
        port: 0,
        store_backend: StoreBackend::Memory,
        mongodb_uri: String::new(),
        mongodb_database: String::new(),
        redis_url: None,
        page_cache_ttl_seconds: 60,
        jwt_secret: TEST_SECRET.to_string(),
    }
}

/// Create an onboarded user whose name equals its username.
pub async fn onboard(app: &TestApp, user_id: &str, username: &str) -> User {
    app.users
        .update_user(UpdateUserParams {
            user_id: user_id.to_string(),
            username: username.to_string(),
            name: username.to_string(),
            bio: None,
            image: None,
            path: "/onboarding".to_string(),
        })
        .await
        .unwrap();

    app.users.fetch_user(user_id).await.unwrap().unwrap()
}
