//! Concurrent store of portal sessions with per-session locking.
//!
//! [`SessionRegistry`] keeps every live [`SessionHolder`] in a `HashMap`
//! where each entry sits behind its own [`tokio::sync::RwLock`]. Requests
//! from different browsers proceed concurrently; requests from the same
//! browser are serialized on its holder.
//!
//! Entries remember when they were last handed out. Each insert first
//! evicts entries idle for longer than the registry's limit, skipping any
//! still held by an in-flight request.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use super::SessionHolder;
use crate::domain::SessionKey;

/// Shared handle to one session's holder.
pub type SharedHolder = Arc<RwLock<SessionHolder>>;

#[derive(Debug)]
struct Entry {
    holder: SharedHolder,
    last_seen: Instant,
}

/// Central store of live portal sessions.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionKey, Entry>>,
    max_idle: Duration,
}

impl SessionRegistry {
    /// Creates an empty registry whose entries expire after `max_idle`
    /// without use.
    #[must_use]
    pub fn new(max_idle: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_idle,
        }
    }

    /// Returns the holder for `key` and marks it as used.
    pub async fn get(&self, key: SessionKey) -> Option<SharedHolder> {
        let mut map = self.sessions.write().await;
        map.get_mut(&key).map(|entry| {
            entry.last_seen = Instant::now();
            Arc::clone(&entry.holder)
        })
    }

    /// Returns the holder for `key`, creating it with `make` when absent.
    /// Creating a holder evicts idle ones first.
    pub async fn get_or_insert_with(
        &self,
        key: SessionKey,
        make: impl FnOnce() -> SessionHolder,
    ) -> SharedHolder {
        if let Some(existing) = self.get(key).await {
            return existing;
        }
        let mut map = self.sessions.write().await;
        let evicted = evict(&mut map, self.max_idle);
        if evicted > 0 {
            tracing::debug!(evicted, "idle portal sessions evicted");
        }
        let entry = map.entry(key).or_insert_with(|| Entry {
            holder: Arc::new(RwLock::new(make())),
            last_seen: Instant::now(),
        });
        Arc::clone(&entry.holder)
    }

    /// Removes the holder for `key`, dropping its auth subscription once the
    /// last in-flight request lets go of it.
    pub async fn remove(&self, key: SessionKey) -> Option<SharedHolder> {
        let removed = self.sessions.write().await.remove(&key);
        if removed.is_some() {
            tracing::debug!(session = %key, "portal session removed");
        }
        removed.map(|entry| entry.holder)
    }

    /// Drops every entry unused for longer than `max_idle` that no request
    /// is holding. Returns how many were dropped.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        evict(&mut *self.sessions.write().await, max_idle)
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if no session is live.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

fn evict(map: &mut HashMap<SessionKey, Entry>, max_idle: Duration) -> usize {
    let before = map.len();
    map.retain(|_, entry| {
        entry.last_seen.elapsed() < max_idle || Arc::strong_count(&entry.holder) > 1
    });
    before - map.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crate::backend::{AuthBackend, DataBackend};
    use crate::domain::EventBus;
    use crate::service::{AuthService, ContentStore, RoleGate};

    fn parts() -> (AuthService, RoleGate, ContentStore) {
        let backend = Arc::new(MemoryBackend::with_site_schema());
        let data = Arc::clone(&backend) as Arc<dyn DataBackend>;
        (
            AuthService::new(backend as Arc<dyn AuthBackend>, EventBus::new(8), "/portal"),
            RoleGate::new(Arc::clone(&data)),
            ContentStore::new(data, EventBus::new(8)),
        )
    }

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Duration::from_secs(1800))
    }

    #[tokio::test]
    async fn get_or_insert_reuses_the_holder() {
        let (auth, gate, store) = parts();
        let registry = registry();
        let key = SessionKey::new();

        let first = registry
            .get_or_insert_with(key, || {
                SessionHolder::new(key, &auth, gate.clone(), store.clone())
            })
            .await;
        let second = registry
            .get_or_insert_with(key, || {
                SessionHolder::new(key, &auth, gate.clone(), store.clone())
            })
            .await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len().await, 1);
        assert_eq!(auth.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn remove_releases_the_subscription() {
        let (auth, gate, store) = parts();
        let registry = registry();
        let key = SessionKey::new();
        let holder = registry
            .get_or_insert_with(key, || SessionHolder::new(key, &auth, gate, store))
            .await;
        drop(holder);

        assert!(registry.remove(key).await.is_some());
        assert!(registry.is_empty().await);
        assert_eq!(auth.subscriber_count(), 0);
        assert!(registry.remove(key).await.is_none());
    }

    #[tokio::test]
    async fn inserting_evicts_idle_unheld_sessions() {
        let (auth, gate, store) = parts();
        let registry = SessionRegistry::new(Duration::ZERO);
        let idle = SessionKey::new();
        let held = SessionKey::new();
        let fresh = SessionKey::new();

        drop(
            registry
                .get_or_insert_with(idle, || {
                    SessionHolder::new(idle, &auth, gate.clone(), store.clone())
                })
                .await,
        );
        let in_flight = registry
            .get_or_insert_with(held, || {
                SessionHolder::new(held, &auth, gate.clone(), store.clone())
            })
            .await;
        assert_eq!(registry.len().await, 1);
        assert!(registry.get(idle).await.is_none());

        let _ = registry
            .get_or_insert_with(fresh, || SessionHolder::new(fresh, &auth, gate, store))
            .await;
        assert!(registry.get(held).await.is_some());
        assert_eq!(registry.len().await, 2);
        assert_eq!(auth.subscriber_count(), 2);
        drop(in_flight);
    }

    #[tokio::test]
    async fn recently_used_sessions_survive_eviction() {
        let (auth, gate, store) = parts();
        let registry = registry();
        let key = SessionKey::new();
        drop(
            registry
                .get_or_insert_with(key, || SessionHolder::new(key, &auth, gate, store))
                .await,
        );

        assert_eq!(registry.evict_idle(Duration::from_secs(60)).await, 0);
        assert_eq!(registry.evict_idle(Duration::ZERO).await, 1);
        assert!(registry.is_empty().await);
        assert_eq!(auth.subscriber_count(), 0);
    }
}
