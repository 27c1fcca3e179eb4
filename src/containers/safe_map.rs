//! Read-mostly concurrent map with linearizable per-key primitives.
//!
//! `SafeMap` wraps a sharded concurrent hash map and exposes the atomic
//! store/load/swap/compare-and-swap/compare-and-delete vocabulary plus a
//! two-phase bulk-update protocol. Per-key atomics are linearizable against
//! each other; `range` carries no cross-key snapshot guarantee.

use std::hash::Hash;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// A generic concurrent map. Cheap to share behind an `Arc`; all methods
/// take `&self`.
///
/// # Examples
///
/// ```
/// use reef::containers::SafeMap;
///
/// let map = SafeMap::new();
/// map.store("answer", 42);
/// assert_eq!(map.load(&"answer"), Some(42));
/// assert!(map.compare_and_swap(&"answer", &42, 43));
/// assert_eq!(map.swap("answer", 1), Some(43));
/// ```
#[derive(Debug, Default)]
pub struct SafeMap<K: Eq + Hash, V> {
    inner: DashMap<K, V>,
}

impl<K: Eq + Hash, V> SafeMap<K, V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    /// Creates an empty map pre-sized for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: DashMap::with_capacity(capacity),
        }
    }

    /// Returns a snapshot of the last committed value for `key`.
    pub fn load(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.inner.get(key).map(|entry| entry.value().clone())
    }

    /// Writes `value` under `key`, overwriting any prior value.
    pub fn store(&self, key: K, value: V) {
        self.inner.insert(key, value);
    }

    /// Returns the existing value with `true`, or installs `value` and
    /// returns it with `false`. Atomic per key.
    pub fn load_or_store(&self, key: K, value: V) -> (V, bool)
    where
        V: Clone,
    {
        match self.inner.entry(key) {
            Entry::Occupied(entry) => (entry.get().clone(), true),
            Entry::Vacant(entry) => {
                entry.insert(value.clone());
                (value, false)
            }
        }
    }

    /// Removes `key` and returns its value, atomically.
    pub fn load_and_delete(&self, key: &K) -> Option<V> {
        self.inner.remove(key).map(|(_, value)| value)
    }

    /// Removes `key`. Idempotent.
    pub fn delete(&self, key: &K) {
        self.inner.remove(key);
    }

    /// Exchanges the value under `key`, returning the previous one.
    pub fn swap(&self, key: K, value: V) -> Option<V> {
        self.inner.insert(key, value)
    }

    /// Replaces the value under `key` with `new` iff the current value
    /// equals `old`. Linearizable against the other per-key atomics.
    pub fn compare_and_swap(&self, key: &K, old: &V, new: V) -> bool
    where
        V: PartialEq,
    {
        match self.inner.get_mut(key) {
            Some(mut entry) => {
                if *entry.value() == *old {
                    *entry.value_mut() = new;
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }

    /// Removes `key` iff the current value equals `old`.
    pub fn compare_and_delete(&self, key: &K, old: &V) -> bool
    where
        V: PartialEq,
    {
        self.inner.remove_if(key, |_, value| value == old).is_some()
    }

    /// Removes every entry. Concurrent operations may land before or after
    /// the sweep; the map is consistent afterwards.
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Returns the number of entries. Immediately outdated under
    /// concurrent mutation.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns whether the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Visits every key present at some moment during the call; no snapshot
    /// guarantee across keys. The visitor returns `false` to halt.
    ///
    /// The visitor must not mutate this map: the walk holds shard read
    /// locks.
    pub fn range<F>(&self, mut visitor: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        for entry in self.inner.iter() {
            if !visitor(entry.key(), entry.value()) {
                break;
            }
        }
    }

    /// Two-phase bulk update.
    ///
    /// Phase 1 walks the map once, collecting `(key, new)` for every entry
    /// where `update` returns `Some(new)`. Phase 2 applies the collected
    /// stores from a pool of `num_cpus` worker threads fed through a
    /// bounded channel, and joins the pool before returning. External
    /// writes race with phase 2; the last store per key wins.
    pub fn range_update<F>(&self, update: F)
    where
        K: Clone + Send + Sync,
        V: Clone + Send + Sync,
        F: FnMut(&K, &V) -> Option<V>,
    {
        let mut update = update;
        let mut items: Vec<(K, V)> = Vec::new();
        self.range(|key, value| {
            if let Some(new_value) = update(key, value) {
                items.push((key.clone(), new_value));
            }
            true
        });
        if items.is_empty() {
            return;
        }

        let workers = num_cpus::get().max(1);
        // In-flight bound: workers can hold at most 2x their count.
        let (tx, rx) = mpsc::sync_channel::<(K, V)>(workers * 2);
        let rx = Arc::new(Mutex::new(rx));

        thread::scope(|scope| {
            for _ in 0..workers {
                let rx = Arc::clone(&rx);
                scope.spawn(move || loop {
                    let item = rx.lock().expect("range_update receiver poisoned").recv();
                    match item {
                        Ok((key, value)) => self.store(key, value),
                        Err(_) => break,
                    }
                });
            }

            for item in items {
                tx.send(item).expect("range_update workers exited early");
            }
            drop(tx);
        });
    }
}
