//! Cache invalidation coordinator backed by Redis.
//!
//! Stores JSON snapshots of hot read paths (story detail, discovery
//! lists, dashboard overview) and evicts them when publishing or rating
//! writes commit. All operations are best-effort: a Redis failure is
//! logged and swallowed, and staleness stays bounded by the value TTL.

use fabula_common::InvalidationPolicy;
use fred::clients::Client as RedisClient;
use fred::interfaces::{ClientLike, KeysInterface};
use fred::types::Expiration;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cache service coordinating Redis reads, writes, and invalidation.
#[derive(Clone)]
pub struct CacheService {
    redis: Option<Arc<RedisClient>>,
    prefix: String,
    policy: InvalidationPolicy,
}

impl CacheService {
    /// Create a new cache service.
    #[must_use]
    pub fn new(redis: Arc<RedisClient>, prefix: String, policy: InvalidationPolicy) -> Self {
        Self {
            redis: Some(redis),
            prefix,
            policy,
        }
    }

    /// Cache service that performs no operations.
    ///
    /// Every read is a miss and every write is dropped. Used when no
    /// Redis client is available.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            redis: None,
            prefix: "fabula".to_string(),
            policy: InvalidationPolicy::Targeted,
        }
    }

    /// Whether a Redis client is attached.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.redis.is_some()
    }

    /// Cache key for a story detail view.
    #[must_use]
    pub fn story_key(&self, story_id: &str) -> String {
        format!("{}:story:{story_id}", self.prefix)
    }

    /// Cache key for the latest-stories list.
    #[must_use]
    pub fn latest_stories_key(&self) -> String {
        format!("{}:stories:latest", self.prefix)
    }

    /// Cache key for the top-rated list.
    #[must_use]
    pub fn top_stories_key(&self) -> String {
        format!("{}:stories:top", self.prefix)
    }

    /// Cache key for the dashboard overview.
    #[must_use]
    pub fn dashboard_key(&self) -> String {
        format!("{}:dashboard:overview", self.prefix)
    }

    /// Get a cached JSON value.
    ///
    /// Returns `None` on a miss, a Redis failure, or a malformed value.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let redis = self.redis.as_ref()?;

        let result: Option<String> = match redis.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed");
                return None;
            }
        };

        let json_str = result?;
        match serde_json::from_str(&json_str) {
            Ok(value) => {
                debug!(key = %key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cached value failed to deserialize");
                None
            }
        }
    }

    /// Store a JSON value with a TTL in seconds.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl_seconds: i64) {
        let Some(redis) = &self.redis else {
            return;
        };

        let json_str = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache value failed to serialize");
                return;
            }
        };

        if let Err(e) = redis
            .set::<(), _, _>(key, json_str, Some(Expiration::EX(ttl_seconds)), None, false)
            .await
        {
            warn!(key = %key, error = %e, "Cache write failed");
        }
    }

    /// Delete a set of keys.
    pub async fn delete(&self, keys: Vec<String>) {
        let Some(redis) = &self.redis else {
            return;
        };
        if keys.is_empty() {
            return;
        }

        if let Err(e) = redis.del::<(), _>(keys).await {
            warn!(error = %e, "Cache delete failed");
        }
    }

    /// Evict everything derived from a story.
    ///
    /// Under the targeted policy this removes the story key plus the
    /// list and dashboard buckets that embed story data. Under the
    /// flush-all policy the whole cache goes.
    pub async fn invalidate_story(&self, story_id: &str) {
        match self.policy {
            InvalidationPolicy::Targeted => {
                let keys = self.story_invalidation_keys(story_id);
                debug!(story_id = %story_id, "Evicting story cache keys");
                self.delete(keys).await;
            }
            InvalidationPolicy::FlushAll => self.flush_all().await,
        }
    }

    /// Evict the dashboard overview.
    pub async fn invalidate_dashboard(&self) {
        match self.policy {
            InvalidationPolicy::Targeted => {
                self.delete(vec![self.dashboard_key()]).await;
            }
            InvalidationPolicy::FlushAll => self.flush_all().await,
        }
    }

    fn story_invalidation_keys(&self, story_id: &str) -> Vec<String> {
        vec![
            self.story_key(story_id),
            self.latest_stories_key(),
            self.top_stories_key(),
            self.dashboard_key(),
        ]
    }

    async fn flush_all(&self) {
        let Some(redis) = &self.redis else {
            return;
        };

        if let Err(e) = redis.flushall::<()>(false).await {
            warn!(error = %e, "Cache flush failed");
        } else {
            debug!("Flushed cache");
        }
    }
}
