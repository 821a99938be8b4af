//! Size-weighted LRU with lazy TTL expiry.

use std::borrow::Borrow;
use std::hash::Hash;
use std::time::{Duration, Instant};

use bytes::Bytes;
use lru::LruCache;

/// Values that know their own cache weight.
pub trait Weigh {
    fn weight(&self) -> usize;
}

impl Weigh for Bytes {
    fn weight(&self) -> usize {
        self.len()
    }
}

impl Weigh for String {
    fn weight(&self) -> usize {
        self.len()
    }
}

impl Weigh for Vec<u8> {
    fn weight(&self) -> usize {
        self.len()
    }
}

/// Limits of a [`WeightedLru`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeightedLruConfig {
    /// Maximum total weight of stored values.
    pub capacity: usize,
    /// Age after which an entry reads as absent. `None` disables expiry.
    pub ttl: Option<Duration>,
}

#[derive(Debug)]
struct Slot<V> {
    value: V,
    weight: usize,
    inserted_at: Instant,
}

/// LRU map bounded by the summed weight of its values.
///
/// Expired entries are not swept: they read as misses and stay until they are
/// evicted or overwritten.
#[derive(Debug)]
pub struct WeightedLru<K: Hash + Eq, V> {
    entries: LruCache<K, Slot<V>>,
    weight: usize,
    config: WeightedLruConfig,
}

impl<K: Hash + Eq, V: Weigh> WeightedLru<K, V> {
    #[must_use]
    pub fn new(config: WeightedLruConfig) -> Self {
        Self {
            entries: LruCache::unbounded(),
            weight: 0,
            config,
        }
    }

    pub fn config(&self) -> WeightedLruConfig {
        self.config
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total weight of stored values.
    pub fn weight(&self) -> usize {
        self.weight
    }

    /// Look up a live entry and mark it most recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_at(key, Instant::now())
    }

    pub(crate) fn get_at<Q>(&mut self, key: &Q, now: Instant) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.entries.peek(key)?;
        if self.is_expired(slot.inserted_at, now) {
            return None;
        }
        self.entries.get(key).map(|slot| &slot.value)
    }

    /// Store `value`, evicting least recently used entries until it fits.
    ///
    /// Returns the number of evicted entries. A value heavier than the whole
    /// capacity is not stored, and any previous value for `key` is removed.
    pub fn put(&mut self, key: K, value: V) -> usize {
        self.put_at(key, value, Instant::now())
    }

    pub(crate) fn put_at(&mut self, key: K, value: V, now: Instant) -> usize {
        let weight = value.weight();
        self.pop(&key);

        if weight > self.config.capacity {
            return 0;
        }

        let mut evicted = 0;
        while self.weight + weight > self.config.capacity {
            let Some((_, slot)) = self.entries.pop_lru() else {
                break;
            };
            self.weight -= slot.weight;
            evicted += 1;
        }

        self.weight += weight;
        self.entries.put(
            key,
            Slot {
                value,
                weight,
                inserted_at: now,
            },
        );
        evicted
    }

    /// Remove an entry, expired or not.
    pub fn pop<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.entries.pop(key)?;
        self.weight -= slot.weight;
        Some(slot.value)
    }

    /// Remove every entry whose key matches `predicate`.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&K) -> bool) -> usize
    where
        K: Clone,
    {
        let doomed: Vec<K> = self
            .entries
            .iter()
            .filter(|(key, _)| predicate(key))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            self.pop(key);
        }
        doomed.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.weight = 0;
    }

    fn is_expired(&self, inserted_at: Instant, now: Instant) -> bool {
        self.config
            .ttl
            .is_some_and(|ttl| now.saturating_duration_since(inserted_at) > ttl)
    }
}
