use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config;

/// Injected cache seam for computed goal progress values.
///
/// Recomputation from Sale/Client rows is always the authority; a cache hit
/// only short-circuits redundant recomputation inside the TTL window. A
/// shared store (e.g. Redis) would implement this same trait for multi-process
/// deployments.
#[async_trait]
pub trait GoalValueCache: Send + Sync {
    async fn get(&self, goal_id: Uuid) -> Option<Decimal>;
    async fn set(&self, goal_id: Uuid, value: Decimal);
    async fn invalidate(&self, goal_id: Uuid);
    async fn invalidate_many(&self, goal_ids: &[Uuid]);
}

/// Process-local TTL cache. Entries expire lazily on read.
pub struct InMemoryGoalCache {
    entries: RwLock<HashMap<Uuid, (Decimal, Instant)>>,
    ttl: Duration,
}

impl InMemoryGoalCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn from_config() -> Self {
        Self::new(Duration::from_secs(config::config().goals.cache_ttl_secs))
    }
}

#[async_trait]
impl GoalValueCache for InMemoryGoalCache {
    async fn get(&self, goal_id: Uuid) -> Option<Decimal> {
        let entries = self.entries.read().await;
        match entries.get(&goal_id) {
            Some((value, stored_at)) if stored_at.elapsed() < self.ttl => Some(*value),
            _ => None,
        }
    }

    async fn set(&self, goal_id: Uuid, value: Decimal) {
        let mut entries = self.entries.write().await;
        // Opportunistically drop expired entries while holding the write lock
        let ttl = self.ttl;
        entries.retain(|_, (_, stored_at)| stored_at.elapsed() < ttl);
        entries.insert(goal_id, (value, Instant::now()));
    }

    async fn invalidate(&self, goal_id: Uuid) {
        self.entries.write().await.remove(&goal_id);
    }

    async fn invalidate_many(&self, goal_ids: &[Uuid]) {
        let mut entries = self.entries.write().await;
        for id in goal_ids {
            entries.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn set_get_invalidate() {
        let cache = InMemoryGoalCache::new(Duration::from_secs(60));
        let id = Uuid::new_v4();

        assert_eq!(cache.get(id).await, None);
        cache.set(id, dec!(3000)).await;
        assert_eq!(cache.get(id).await, Some(dec!(3000)));

        cache.invalidate(id).await;
        assert_eq!(cache.get(id).await, None);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = InMemoryGoalCache::new(Duration::from_millis(20));
        let id = Uuid::new_v4();

        cache.set(id, dec!(42)).await;
        assert_eq!(cache.get(id).await, Some(dec!(42)));

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get(id).await, None);
    }

    #[tokio::test]
    async fn invalidate_many_clears_all_given() {
        let cache = InMemoryGoalCache::new(Duration::from_secs(60));
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        cache.set(a, dec!(1)).await;
        cache.set(b, dec!(2)).await;
        cache.set(c, dec!(3)).await;

        cache.invalidate_many(&[a, b]).await;
        assert_eq!(cache.get(a).await, None);
        assert_eq!(cache.get(b).await, None);
        assert_eq!(cache.get(c).await, Some(dec!(3)));
    }
}
