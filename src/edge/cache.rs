//! Expiring media lookup cache

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tokio::time::Instant;

/// Failure of the cache backend itself (a miss is not an error)
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

/// Key-value cache of resolved media nodes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaCache: Send + Sync {
    /// Cached node for `media_id`; expired entries read as a miss
    async fn get(&self, media_id: &str) -> Result<Option<String>, CacheError>;

    /// Store `node` for `media_id`, fresh for `ttl`
    async fn set(&self, media_id: &str, node: &str, ttl: Duration) -> Result<(), CacheError>;
}

/// Process-local cache; entries are dropped lazily on read
#[derive(Debug, Default)]
pub struct InMemoryMediaCache {
    entries: DashMap<String, (String, Instant)>,
}

impl InMemoryMediaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl MediaCache for InMemoryMediaCache {
    async fn get(&self, media_id: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let hit = match self.entries.get(media_id) {
            Some(entry) if entry.1 > now => return Ok(Some(entry.0.clone())),
            Some(_) => true,
            None => false,
        };
        if hit {
            self.entries
                .remove_if(media_id, |_, (_, expires)| *expires <= now);
        }
        Ok(None)
    }

    async fn set(&self, media_id: &str, node: &str, ttl: Duration) -> Result<(), CacheError> {
        self.entries
            .insert(media_id.to_string(), (node.to_string(), Instant::now() + ttl));
        Ok(())
    }
}
