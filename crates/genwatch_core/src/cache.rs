//! Key-addressed store of server-derived data with change notification.
//!
//! Values are handed out as `Arc` snapshots, so a reader sees either the
//! value before a write or the value after it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{Job, JobId};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    ActiveGeneration,
    GenerationHistory { page: u32, limit: u32 },
    Generation(JobId),
    Gallery { query: String },
    Publications { page: u32 },
    Transactions,
}

/// A family of keys addressed by one invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheTarget {
    ActiveGeneration,
    GenerationHistory,
    Generation(JobId),
    Gallery,
    Publications,
    Transactions,
}

impl CacheTarget {
    pub fn covers(&self, key: &CacheKey) -> bool {
        match (self, key) {
            (CacheTarget::ActiveGeneration, CacheKey::ActiveGeneration)
            | (CacheTarget::GenerationHistory, CacheKey::GenerationHistory { .. })
            | (CacheTarget::Gallery, CacheKey::Gallery { .. })
            | (CacheTarget::Publications, CacheKey::Publications { .. })
            | (CacheTarget::Transactions, CacheKey::Transactions) => true,
            (CacheTarget::Generation(target), CacheKey::Generation(id)) => target == id,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    ActiveGeneration(Option<Job>),
    Jobs(Vec<Job>),
    Job(Job),
    Json(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub value: Arc<CachedValue>,
    /// Set by invalidation; the value is still readable until refilled.
    pub stale: bool,
    pub version: u64,
}

/// Receives the key of every entry that was invalidated or rewritten.
pub trait CacheObserver: Send + Sync {
    fn changed(&self, key: &CacheKey);
}

#[derive(Debug)]
struct Entry {
    value: Arc<CachedValue>,
    stale: bool,
    version: u64,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<CacheKey, Entry>,
    // Bumped on every write or invalidation of a key, including absent ones,
    // so an in-flight fill can tell that it raced an invalidation.
    versions: HashMap<CacheKey, u64>,
    observers: Vec<Arc<dyn CacheObserver>>,
}

impl Inner {
    fn bump(&mut self, key: &CacheKey) -> u64 {
        let version = self.versions.entry(key.clone()).or_insert(0);
        *version += 1;
        *version
    }

    fn store(&mut self, key: CacheKey, value: CachedValue) {
        let version = self.bump(&key);
        self.entries.insert(
            key,
            Entry {
                value: Arc::new(value),
                stale: false,
                version,
            },
        );
    }
}

#[derive(Default)]
pub struct CacheStore {
    inner: Mutex<Inner>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave an entry half-written.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn subscribe(&self, observer: Arc<dyn CacheObserver>) {
        self.lock().observers.push(observer);
    }

    pub fn get(&self, key: &CacheKey) -> Option<Snapshot> {
        self.lock().entries.get(key).map(|entry| Snapshot {
            value: entry.value.clone(),
            stale: entry.stale,
            version: entry.version,
        })
    }

    /// Current version of a key; pass it to [`CacheStore::fill`] after loading.
    pub fn version(&self, key: &CacheKey) -> u64 {
        *self.lock().versions.entry(key.clone()).or_insert(0)
    }

    pub fn put(&self, key: CacheKey, value: CachedValue) {
        let observers = {
            let mut inner = self.lock();
            inner.store(key.clone(), value);
            inner.observers.clone()
        };
        notify(&observers, &key);
    }

    /// Stores a loaded value unless the key changed since `seen_version`.
    pub fn fill(&self, key: CacheKey, value: CachedValue, seen_version: u64) -> bool {
        let observers = {
            let mut inner = self.lock();
            if inner.versions.get(&key).copied().unwrap_or(0) != seen_version {
                return false;
            }
            inner.store(key.clone(), value);
            inner.observers.clone()
        };
        notify(&observers, &key);
        true
    }

    /// Marks every key covered by `target` stale and notifies observers.
    pub fn invalidate(&self, target: &CacheTarget) -> usize {
        let (keys, observers) = {
            let mut inner = self.lock();
            // `versions` also holds keys that are being loaded but not yet stored.
            let mut keys: Vec<CacheKey> = inner
                .versions
                .keys()
                .filter(|key| target.covers(key))
                .cloned()
                .collect();
            if let Some(exact) = exact_key(target) {
                if !keys.contains(&exact) {
                    keys.push(exact);
                }
            }
            for key in &keys {
                let version = inner.bump(key);
                if let Some(entry) = inner.entries.get_mut(key) {
                    entry.stale = true;
                    entry.version = version;
                }
            }
            (keys, inner.observers.clone())
        };
        let touched = keys.len();
        for key in &keys {
            notify(&observers, key);
        }
        touched
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.versions.clear();
    }
}

fn exact_key(target: &CacheTarget) -> Option<CacheKey> {
    match target {
        CacheTarget::ActiveGeneration => Some(CacheKey::ActiveGeneration),
        CacheTarget::Generation(id) => Some(CacheKey::Generation(id.clone())),
        CacheTarget::Transactions => Some(CacheKey::Transactions),
        CacheTarget::GenerationHistory | CacheTarget::Gallery | CacheTarget::Publications => None,
    }
}

fn notify(observers: &[Arc<dyn CacheObserver>], key: &CacheKey) {
    for observer in observers {
        observer.changed(key);
    }
}
