//! Thread-safe least-recently-used container with a dispose hook

use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

use hashbrown::HashMap;

type Dispose<V> = Box<dyn Fn(V) + Send + Sync>;

struct Entries<K, V> {
    map: HashMap<K, V>,
    /// Least recently used first
    order: VecDeque<K>,
}

impl<K: Eq + Hash + Clone, V> Entries<K, V> {
    fn touch(&mut self, key: &K) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(key.clone());
    }
}

/// Holds at most `maxsize` values; inserting past that evicts the least
/// recently used entry and hands it to the dispose callback.
///
/// Dispose runs after the internal lock is released.
pub struct RecentlyUsed<K, V> {
    maxsize: usize,
    entries: Mutex<Entries<K, V>>,
    dispose: Option<Dispose<V>>,
}

impl<K: Eq + Hash + Clone, V: Clone> RecentlyUsed<K, V> {
    pub fn new(maxsize: usize) -> Self {
        Self {
            maxsize,
            entries: Mutex::new(Entries {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            dispose: None,
        }
    }

    pub fn with_dispose(maxsize: usize, dispose: impl Fn(V) + Send + Sync + 'static) -> Self {
        Self {
            dispose: Some(Box::new(dispose)),
            ..Self::new(maxsize)
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries<K, V>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispose_all(&self, values: Vec<V>) {
        if let Some(dispose) = &self.dispose {
            for value in values {
                dispose(value);
            }
        }
    }

    pub fn maxsize(&self) -> usize {
        self.maxsize
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.lock();
        let value = entries.map.get(key).cloned()?;
        entries.touch(key);
        Some(value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.lock().map.contains_key(key)
    }

    /// Insert or replace; a replaced value is disposed like an evicted one.
    pub fn insert(&self, key: K, value: V) {
        let evicted = {
            let mut entries = self.lock();
            let mut evicted = Vec::new();
            if let Some(old) = entries.map.insert(key.clone(), value) {
                evicted.push(old);
            }
            entries.touch(&key);
            evicted.extend(self.evict_overflow(&mut entries));
            evicted
        };
        self.dispose_all(evicted);
    }

    /// Return the value for `key`, creating it with `create` when absent.
    ///
    /// Creation happens under the lock so concurrent callers for the same key
    /// observe a single value.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: K,
        create: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        let (value, evicted) = {
            let mut entries = self.lock();
            if let Some(value) = entries.map.get(&key).cloned() {
                entries.touch(&key);
                return Ok(value);
            }
            let value = create()?;
            entries.map.insert(key.clone(), value.clone());
            entries.touch(&key);
            let evicted = self.evict_overflow(&mut entries);
            (value, evicted)
        };
        self.dispose_all(evicted);
        Ok(value)
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        let removed = {
            let mut entries = self.lock();
            let removed = entries.map.remove(key)?;
            if let Some(pos) = entries.order.iter().position(|k| k == key) {
                entries.order.remove(pos);
            }
            removed
        };
        self.dispose_all(vec![removed.clone()]);
        Some(removed)
    }

    /// Remove and dispose every value.
    pub fn clear(&self) {
        let values: Vec<V> = {
            let mut entries = self.lock();
            entries.order.clear();
            entries.map.drain().map(|(_, v)| v).collect()
        };
        self.dispose_all(values);
    }

    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> Vec<K> {
        self.lock().order.iter().cloned().collect()
    }

    fn evict_overflow(&self, entries: &mut Entries<K, V>) -> Vec<V> {
        let mut evicted = Vec::new();
        while entries.map.len() > self.maxsize {
            let Some(oldest) = entries.order.pop_front() else {
                break;
            };
            if let Some(value) = entries.map.remove(&oldest) {
                evicted.push(value);
            }
        }
        evicted
    }
}

impl<K, V> fmt::Debug for RecentlyUsed<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecentlyUsed")
            .field("maxsize", &self.maxsize)
            .finish_non_exhaustive()
    }
}
