//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with a cost budget and
//! frequency-based admission.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::debug;

use crate::cache::stats::StatsRecorder;
use crate::cache::{CacheEntry, CacheStats, FrequencySketch};
use crate::config::CacheConfig;

#[derive(Debug, Default)]
struct Entries {
    map: HashMap<String, CacheEntry>,
    total_cost: u64,
    next_seq: u64,
}

// == Cache Store ==
/// Bounded, concurrent key/value store.
///
/// All synchronization is internal: share it as `Arc<CacheStore>` and call
/// `get`/`set` from any task. Reads take a shared lock only; writes are
/// serialized. Eviction is not LRU or FIFO. When the cost budget is exceeded the
/// coldest entries (by estimated read frequency, then insertion order) are
/// displaced, and a new key that is colder than what it would displace is
/// rejected instead.
#[derive(Debug)]
pub struct CacheStore {
    entries: RwLock<Entries>,
    sketch: Mutex<FrequencySketch>,
    /// Key hashes of recent reads, flushed into the sketch in batches
    read_buffer: Mutex<Vec<u64>>,
    buffer_items: usize,
    max_cost: u64,
    stats: StatsRecorder,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore from its construction parameters.
    ///
    /// The parameters are fixed for the lifetime of the store.
    pub fn new(config: &CacheConfig) -> Self {
        let buffer_items = config.buffer_items.max(1);
        Self {
            entries: RwLock::new(Entries::default()),
            sketch: Mutex::new(FrequencySketch::new(config.num_counters)),
            read_buffer: Mutex::new(Vec::with_capacity(buffer_items)),
            buffer_items,
            max_cost: config.max_cost,
            stats: StatsRecorder::default(),
        }
    }

    // == Set ==
    /// Stores a value under `key`, charging `cost` against the budget.
    ///
    /// Returns `false` when the admission policy rejects the entry: either its
    /// cost alone exceeds the budget, or making room would displace entries
    /// read more often than the incoming key. Rejection is not an error; the
    /// caller may retry later or skip the entry.
    ///
    /// Overwriting an existing key is always admitted so that the stored value
    /// is the most recent commit.
    pub fn set(&self, key: impl Into<String>, value: Value, cost: u64) -> bool {
        let key = key.into();

        if cost > self.max_cost {
            self.stats.record_rejection();
            debug!(key = %key, cost, max_cost = self.max_cost, "Cache entry exceeds cost budget");
            return false;
        }

        let mut sketch = self.sketch.lock();
        self.drain_reads(&mut sketch);

        let mut guard = self.entries.write();
        let entries = &mut *guard;

        let previous_cost = entries.map.get(&key).map(|entry| entry.cost);
        let projected = entries.total_cost - previous_cost.unwrap_or(0) + cost;

        let victims = if projected > self.max_cost {
            // Updates skip the frequency comparison
            let incoming = match previous_cost {
                Some(_) => None,
                None => Some(sketch.estimate(key_hash(&key))),
            };
            match select_victims(&entries.map, &sketch, &key, projected - self.max_cost, incoming) {
                Some(victims) => victims,
                None => {
                    self.stats.record_rejection();
                    debug!(key = %key, cost, "Cache admission rejected");
                    return false;
                }
            }
        } else {
            Vec::new()
        };

        for victim in &victims {
            if let Some(evicted) = entries.map.remove(victim) {
                entries.total_cost -= evicted.cost;
                debug!(
                    key = %victim,
                    cost = evicted.cost,
                    age_secs = evicted.age().num_seconds(),
                    "Evicted cache entry"
                );
            }
        }
        if !victims.is_empty() {
            self.stats.record_evictions(victims.len() as u64);
            debug!(key = %key, evicted = victims.len(), "Evicted entries to admit key");
        }

        let seq = entries.next_seq;
        entries.next_seq += 1;
        if let Some(replaced) = entries.map.insert(key, CacheEntry::new(value, cost, seq)) {
            entries.total_cost -= replaced.cost;
        }
        entries.total_cost += cost;

        self.stats.record_admission();
        true
    }

    // == Get ==
    /// Retrieves a copy of the value stored under `key`.
    ///
    /// Both hits and misses count towards the key's read frequency.
    pub fn get(&self, key: &str) -> Option<Value> {
        let value = self
            .entries
            .read()
            .map
            .get(key)
            .map(|entry| entry.value.clone());

        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        self.record_read(key_hash(key));

        value
    }

    // == Has ==
    /// Returns true if `key` is present. Does not affect statistics.
    pub fn has(&self, key: &str) -> bool {
        self.entries.read().map.contains_key(key)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        self.stats.snapshot(entries.map.len(), entries.total_cost)
    }

    // == Total Cost ==
    /// Returns the sum of the costs of all stored entries.
    pub fn total_cost(&self) -> u64 {
        self.entries.read().total_cost
    }

    /// Maximum aggregate cost the store will hold.
    pub fn max_cost(&self) -> u64 {
        self.max_cost
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.read().map.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().map.is_empty()
    }

    fn record_read(&self, hash: u64) {
        let batch = {
            let mut buffer = self.read_buffer.lock();
            buffer.push(hash);
            if buffer.len() < self.buffer_items {
                return;
            }
            std::mem::take(&mut *buffer)
        };

        // Lossy: a busy sketch drops the batch rather than blocking readers
        if let Some(mut sketch) = self.sketch.try_lock() {
            for hash in batch {
                sketch.increment(hash);
            }
        }
    }

    fn drain_reads(&self, sketch: &mut FrequencySketch) {
        let pending = std::mem::take(&mut *self.read_buffer.lock());
        for hash in pending {
            sketch.increment(hash);
        }
    }
}

/// Picks the entries to displace so that `needed` cost is freed.
///
/// Returns `None` if a required victim is read more often than `incoming`.
fn select_victims(
    map: &HashMap<String, CacheEntry>,
    sketch: &FrequencySketch,
    key: &str,
    needed: u64,
    incoming: Option<u8>,
) -> Option<Vec<String>> {
    let mut candidates: Vec<(u8, u64, &String, u64)> = map
        .iter()
        .filter(|(candidate, _)| candidate.as_str() != key)
        .map(|(candidate, entry)| {
            (
                sketch.estimate(key_hash(candidate)),
                entry.seq,
                candidate,
                entry.cost,
            )
        })
        .collect();
    candidates.sort_unstable_by_key(|(frequency, seq, _, _)| (*frequency, *seq));

    let mut victims = Vec::new();
    let mut freed = 0;
    for (frequency, _, candidate, cost) in candidates {
        if freed >= needed {
            break;
        }
        if incoming.is_some_and(|incoming| frequency > incoming) {
            return None;
        }
        victims.push(candidate.clone());
        freed += cost;
    }

    (freed >= needed).then_some(victims)
}

fn key_hash(key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    fn store_with_budget(max_cost: u64) -> CacheStore {
        CacheStore::new(&CacheConfig {
            num_counters: 1024,
            max_cost,
            buffer_items: 1,
        })
    }

    #[test]
    fn test_store_new() {
        let store = store_with_budget(100);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.total_cost(), 0);
        assert_eq!(store.max_cost(), 100);
    }

    #[test]
    fn test_store_set_and_get() {
        let store = store_with_budget(100);

        assert!(store.set("key1", json!("value1"), 10));

        assert_eq!(store.get("key1"), Some(json!("value1")));
        assert!(store.has("key1"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.total_cost(), 10);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let store = store_with_budget(100);

        assert_eq!(store.get("nonexistent"), None);
        assert!(!store.has("nonexistent"));
    }

    #[test]
    fn test_store_overwrite() {
        let store = store_with_budget(100);

        assert!(store.set("key1", json!("value1"), 10));
        assert!(store.set("key1", json!("value2"), 30));

        assert_eq!(store.get("key1"), Some(json!("value2")));
        assert_eq!(store.len(), 1);
        assert_eq!(store.total_cost(), 30);
    }

    #[test]
    fn test_store_rejects_entry_larger_than_budget() {
        let store = store_with_budget(100);

        assert!(!store.set("huge", json!("x"), 101));

        assert!(!store.has("huge"));
        assert_eq!(store.stats().rejected, 1);
    }

    #[test]
    fn test_store_keeps_everything_under_budget() {
        let store = store_with_budget(100);

        for i in 0..10 {
            assert!(store.set(format!("key{}", i), json!(i), 10));
        }

        assert_eq!(store.len(), 10);
        assert_eq!(store.total_cost(), 100);
        for i in 0..10 {
            assert_eq!(store.get(&format!("key{}", i)), Some(json!(i)));
        }
    }

    #[test]
    fn test_store_cost_bounded_eviction() {
        let store = store_with_budget(1000);

        for (key, cost) in [("a", 200), ("b", 300), ("c", 400), ("d", 500)] {
            store.set(key, json!(key), cost);
        }

        assert!(store.total_cost() <= 1000);
        assert!(store.has("c"));
        assert!(store.has("d"));
        assert_eq!(store.stats().evicted, 2);
    }

    #[test]
    fn test_store_prefers_hot_keys_under_pressure() {
        let store = store_with_budget(300);
        store.set("hot1", json!(1), 100);
        store.set("cold", json!(2), 100);
        store.set("hot2", json!(3), 100);

        for _ in 0..5 {
            store.get("hot1");
            store.get("hot2");
        }

        assert!(store.set("newcomer", json!(4), 100));

        assert!(store.has("hot1"));
        assert!(store.has("hot2"));
        assert!(store.has("newcomer"));
        assert!(!store.has("cold"));
    }

    #[test]
    fn test_store_rejects_cold_newcomer() {
        let store = store_with_budget(200);
        store.set("a", json!("a"), 100);
        store.set("b", json!("b"), 100);
        for _ in 0..3 {
            store.get("a");
            store.get("b");
        }

        assert!(!store.set("c", json!("c"), 100));

        assert!(store.has("a"));
        assert!(store.has("b"));
        assert!(!store.has("c"));
        assert_eq!(store.total_cost(), 200);
    }

    #[test]
    fn test_store_update_always_admitted() {
        let store = store_with_budget(200);
        store.set("a", json!("a"), 100);
        store.set("b", json!("b"), 100);
        for _ in 0..3 {
            store.get("a");
        }

        // Growing "b" must displace "a" even though "a" is hotter
        assert!(store.set("b", json!("b2"), 150));

        assert_eq!(store.get("b"), Some(json!("b2")));
        assert!(!store.has("a"));
        assert_eq!(store.total_cost(), 150);
    }

    #[test]
    fn test_store_stats() {
        let store = store_with_budget(100);

        store.set("key1", json!("value1"), 5);
        store.get("key1"); // hit
        store.get("nonexistent"); // miss

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.admitted, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.total_cost, 5);
    }

    #[test]
    fn test_store_concurrent_readers_and_writer() {
        let store = Arc::new(CacheStore::new(&CacheConfig {
            num_counters: 1024,
            max_cost: 10_000,
            buffer_items: 8,
        }));
        store.set("shared", json!(0), 1);

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        assert!(store.get("shared").is_some());
                    }
                })
            })
            .collect();

        for i in 1..=500 {
            store.set("shared", json!(i), 1);
        }
        for reader in readers {
            reader.join().unwrap();
        }

        assert_eq!(store.get("shared"), Some(json!(500)));
        assert_eq!(store.stats().hits, 4001);
    }
}
