use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::PageCache;
use crate::utils::error::CustomError;

struct Entry {
    body: String,
    expires_at: Instant,
}

/// Process-local page cache, used when Redis is not configured.
pub struct MemoryPageCache {
    entries: RwLock<HashMap<String, Entry>>,
    ttl: Duration,
    #[cfg(test)]
    revalidated: RwLock<Vec<String>>,
}

impl MemoryPageCache {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Duration::from_secs(ttl_seconds),
            #[cfg(test)]
            revalidated: RwLock::new(Vec::new()),
        }
    }

    #[cfg(test)]
    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Every path revalidated so far, in call order.
    #[cfg(test)]
    pub async fn revalidated_paths(&self) -> Vec<String> {
        self.revalidated.read().await.clone()
    }
}

#[async_trait]
impl PageCache for MemoryPageCache {
    async fn get_page(&self, path: &str) -> Result<Option<String>, CustomError> {
        let mut entries = self.entries.write().await;
        match entries.get(path) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.body.clone())),
            Some(_) => {
                entries.remove(path);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put_page(&self, path: &str, body: &str) -> Result<(), CustomError> {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            path.to_string(),
            Entry {
                body: body.to_string(),
                expires_at: now + self.ttl,
            },
        );
        Ok(())
    }

    async fn revalidate(&self, path: &str) -> Result<(), CustomError> {
        self.entries.write().await.remove(path);
        #[cfg(test)]
        self.revalidated.write().await.push(path.to_string());
        Ok(())
    }
}
