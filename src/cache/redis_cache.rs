use async_trait::async_trait;
use log::info;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};

use crate::cache::PageCache;
use crate::utils::error::CustomError;

/// Redis connection wrapper
pub struct RedisClient {
    connection: MultiplexedConnection,
}

impl RedisClient {
    pub async fn init(redis_url: &str) -> Result<Self, CustomError> {
        let client = Client::open(redis_url).map_err(|e| {
            CustomError::InternalServerError(format!("Failed to create Redis client: {}", e))
        })?;

        let connection = client.get_multiplexed_async_connection().await.map_err(|e| {
            CustomError::InternalServerError(format!("Failed to connect to Redis: {}", e))
        })?;

        info!("Connected successfully to Redis");

        Ok(Self { connection })
    }

    pub fn get_connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }
}

/// Page cache stored in Redis under `cache:page:<path>`.
#[derive(Clone)]
pub struct RedisPageCache {
    connection: MultiplexedConnection,
    ttl_seconds: u64,
}

impl RedisPageCache {
    pub fn new(client: &RedisClient, ttl_seconds: u64) -> Self {
        Self {
            connection: client.get_connection(),
            ttl_seconds,
        }
    }

    fn key(path: &str) -> String {
        format!("cache:page:{}", path)
    }
}

#[async_trait]
impl PageCache for RedisPageCache {
    async fn get_page(&self, path: &str) -> Result<Option<String>, CustomError> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(Self::key(path)).await?;
        Ok(value)
    }

    async fn put_page(&self, path: &str, body: &str) -> Result<(), CustomError> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(Self::key(path), body, self.ttl_seconds)
            .await?;
        Ok(())
    }

    async fn revalidate(&self, path: &str) -> Result<(), CustomError> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(Self::key(path)).await?;
        Ok(())
    }
}

/// Convenience function to connect to Redis
pub async fn connect_to_redis(redis_url: &str) -> Result<RedisClient, CustomError> {
    RedisClient::init(redis_url).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_by_path() {
        assert_eq!(RedisPageCache::key("/thread/42"), "cache:page:/thread/42");
    }
}
