//! Cached page bodies keyed by route path, and the revalidation hook that
//! marks them stale after a mutation.

pub mod memory;
pub mod redis_cache;

use async_trait::async_trait;
use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::utils::error::CustomError;

pub use memory::MemoryPageCache;
pub use redis_cache::{RedisPageCache, connect_to_redis};

/// Cache key of the home feed's first page.
pub const HOME_PATH: &str = "/";

/// Cache key of a thread's detail page.
pub fn thread_path(id: &str) -> String {
    format!("/thread/{}", id)
}

#[async_trait]
pub trait PageCache: Send + Sync {
    async fn get_page(&self, path: &str) -> Result<Option<String>, CustomError>;

    async fn put_page(&self, path: &str, body: &str) -> Result<(), CustomError>;

    /// Drop whatever is cached for `path`.
    async fn revalidate(&self, path: &str) -> Result<(), CustomError>;
}

/// Fire-and-forget revalidation. A cache failure never fails the action.
pub async fn revalidate_path(cache: &dyn PageCache, path: &str) {
    if let Err(e) = cache.revalidate(path).await {
        warn!("Failed to revalidate {}: {}", path, e);
    }
}

/// Revalidate each distinct path once, in the order given.
pub async fn revalidate_paths(cache: &dyn PageCache, paths: Vec<String>) {
    let mut done: Vec<String> = Vec::with_capacity(paths.len());
    for path in paths {
        if done.contains(&path) {
            continue;
        }
        revalidate_path(cache, &path).await;
        done.push(path);
    }
}

/// Read a cached JSON page, treating cache errors and stale shapes as a miss.
pub async fn cached_json<T: DeserializeOwned>(cache: &dyn PageCache, path: &str) -> Option<T> {
    match cache.get_page(path).await {
        Ok(Some(body)) => serde_json::from_str(&body)
            .map_err(|e| warn!("Discarding unreadable cache entry {}: {}", path, e))
            .ok(),
        Ok(None) => None,
        Err(e) => {
            warn!("Failed to read cache entry {}: {}", path, e);
            None
        }
    }
}

/// Store a JSON page, logging instead of failing.
pub async fn store_json<T: Serialize>(cache: &dyn PageCache, path: &str, value: &T) {
    let body = match serde_json::to_string(value) {
        Ok(body) => body,
        Err(e) => {
            warn!("Failed to serialize cache entry {}: {}", path, e);
            return;
        }
    };

    if let Err(e) = cache.put_page(path, &body).await {
        warn!("Failed to write cache entry {}: {}", path, e);
    }
}
