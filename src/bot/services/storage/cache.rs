use std::time::Duration;

use moka::future::Cache;

use super::types::{Mentor, RankingPosition, Service, TopWorker, UserStats, Worker};

pub const TTL_SHORT: Duration = Duration::from_secs(60);
pub const TTL_MEDIUM: Duration = Duration::from_secs(5 * 60);
pub const TTL_LONG: Duration = Duration::from_secs(10 * 60);

/// Read-through caches for the storage layer, invalidated explicitly by the
/// write paths. In-process only: with several bot instances the TTLs are the
/// sole coherency bound.
pub struct StorageCache {
    pub workers: Cache<i64, Worker>,
    pub services: Cache<(), Vec<Service>>,
    pub mentors: Cache<(), Vec<Mentor>>,
    pub stats: Cache<i64, UserStats>,
    pub positions: Cache<i64, RankingPosition>,
    pub top: Cache<String, Vec<TopWorker>>,
    pub settings: Cache<String, String>,
}

impl StorageCache {
    pub fn new() -> Self {
        fn build<K, V>(ttl: Duration) -> Cache<K, V>
        where
            K: std::hash::Hash + Eq + Send + Sync + 'static,
            V: Clone + Send + Sync + 'static,
        {
            Cache::builder().time_to_live(ttl).max_capacity(4096).build()
        }

        StorageCache {
            workers: build(TTL_SHORT),
            services: build(TTL_MEDIUM),
            mentors: build(TTL_MEDIUM),
            stats: build(TTL_SHORT),
            positions: build(TTL_SHORT),
            top: build(TTL_SHORT),
            settings: build(TTL_LONG),
        }
    }

    pub async fn invalidate_worker(&self, user_id: i64) {
        self.workers.invalidate(&user_id).await;
        self.stats.invalidate(&user_id).await;
        self.positions.invalidate(&user_id).await;
    }

    pub fn invalidate_all_workers(&self) {
        self.workers.invalidate_all();
        self.stats.invalidate_all();
        self.positions.invalidate_all();
    }

    pub async fn invalidate_services(&self) {
        self.services.invalidate(&()).await;
    }

    pub async fn invalidate_mentors(&self) {
        self.mentors.invalidate(&()).await;
    }
}

impl Default for StorageCache {
    fn default() -> Self {
        Self::new()
    }
}
