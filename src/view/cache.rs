use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use super::collection::{Collection, Keyed};

struct CacheEntry<T> {
    collection: Collection<T>,
    touched: Instant,
}

/// Per-session copies of list pages, keyed by `"{session_id}"` or
/// `"{session_id}:{scope}"`. Entries idle for longer than the TTL are pruned
/// on every write.
pub struct ViewCache<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    ttl: Duration,
}

fn prune<T>(entries: &mut HashMap<String, CacheEntry<T>>, ttl: Duration) {
    let before = entries.len();
    entries.retain(|_, entry| entry.touched.elapsed() <= ttl);
    if entries.len() != before {
        debug!(pruned = before - entries.len(), "Pruned idle view cache entries.");
    }
}

impl<T: Keyed + Clone> ViewCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Option<Collection<T>> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(key)?;
        if entry.touched.elapsed() > self.ttl {
            entries.remove(key);
            return None;
        }
        entry.touched = Instant::now();
        Some(entry.collection.clone())
    }

    pub async fn store(&self, key: String, collection: Collection<T>) {
        let mut entries = self.entries.lock().await;
        prune(&mut entries, self.ttl);
        entries.insert(
            key,
            CacheEntry {
                collection,
                touched: Instant::now(),
            },
        );
    }

    /// Patches the live copy of `key` under the lock, so concurrent patches
    /// of one list all land. Without a live copy `apply` is handed back.
    pub async fn update<F, R>(&self, key: &str, apply: F) -> Result<(Collection<T>, R), F>
    where
        F: FnOnce(&mut Collection<T>) -> R,
    {
        let mut entries = self.entries.lock().await;
        prune(&mut entries, self.ttl);
        let Some(entry) = entries.get_mut(key) else {
            return Err(apply);
        };
        entry.touched = Instant::now();
        let outcome = apply(&mut entry.collection);
        Ok((entry.collection.clone(), outcome))
    }

    /// Like [`ViewCache::update`], but `seed` becomes the copy when there is
    /// none. A copy stored by a concurrent request in the meantime wins over
    /// `seed`.
    pub async fn update_or_seed<F, R>(
        &self,
        key: String,
        seed: Collection<T>,
        apply: F,
    ) -> (Collection<T>, R)
    where
        F: FnOnce(&mut Collection<T>) -> R,
    {
        let mut entries = self.entries.lock().await;
        prune(&mut entries, self.ttl);
        let entry = match entries.entry(key) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => vacant.insert(CacheEntry {
                collection: seed,
                touched: Instant::now(),
            }),
        };
        entry.touched = Instant::now();
        let outcome = apply(&mut entry.collection);
        (entry.collection.clone(), outcome)
    }

    /// Drops every entry of one session, e.g. on logout.
    pub async fn evict_session(&self, session_id: &str) {
        let scoped = format!("{session_id}:");
        self.entries
            .lock()
            .await
            .retain(|key, _| key != session_id && !key.starts_with(&scoped));
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
