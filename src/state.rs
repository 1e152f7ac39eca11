use std::sync::Arc;

use actix_web::web;
use log::info;

use crate::cache::{MemoryPageCache, PageCache, RedisPageCache, connect_to_redis};
use crate::config::{AppConfig, StoreBackend};
use crate::database::{DocumentStore, MemoryStore, MongoStore, connect_to_mongo};
use crate::router::index::routes;
use crate::thread::service::ThreadService;
use crate::user::service::UserService;
use crate::utils::error::CustomError;

/// Shared handles registered as app data on every worker.
#[derive(Clone)]
pub struct AppState {
    pub config: web::Data<AppConfig>,
    pub threads: web::Data<ThreadService>,
    pub users: web::Data<UserService>,
    pub cache: web::Data<dyn PageCache>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>, cache: Arc<dyn PageCache>) -> Self {
        AppState {
            config: web::Data::new(config),
            threads: web::Data::new(ThreadService::new(store.clone(), cache.clone())),
            users: web::Data::new(UserService::new(store, cache.clone())),
            cache: web::Data::from(cache),
        }
    }

    /// Connect the backends selected by `config`.
    pub async fn connect(config: AppConfig) -> Result<Self, CustomError> {
        let store: Arc<dyn DocumentStore> = match config.store_backend {
            StoreBackend::Mongo => {
                let client = connect_to_mongo(&config).await?;
                Arc::new(MongoStore::new(&client, &config.mongodb_database))
            }
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        };
        info!("Using {} document store", config.store_backend);

        let cache: Arc<dyn PageCache> = match &config.redis_url {
            Some(url) => {
                let client = connect_to_redis(url).await?;
                Arc::new(RedisPageCache::new(&client, config.page_cache_ttl_seconds))
            }
            None => {
                info!("REDIS_URL not set, caching pages in memory");
                Arc::new(MemoryPageCache::new(config.page_cache_ttl_seconds))
            }
        };

        Ok(AppState::new(config, store, cache))
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.config.clone())
            .app_data(self.threads.clone())
            .app_data(self.users.clone())
            .app_data(self.cache.clone());
        routes(cfg);
    }
}
