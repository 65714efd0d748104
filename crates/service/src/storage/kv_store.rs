use dashmap::{mapref::entry::Entry, DashMap};

/// Key-value storage for opaque string values.
/// Every method must appear atomic to concurrent callers on the same key.
pub trait KvStore: Send + Sync {
    /// Insert only if `key` is absent; returns whether the insert happened.
    fn create_if_absent(&self, key: &str, value: String) -> bool;
    /// Insert or overwrite.
    fn set(&self, key: &str, value: String);
    fn get(&self, key: &str) -> Option<String>;
    fn exists(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
    /// Remove the entry; returns whether one existed.
    fn delete(&self, key: &str) -> bool;
    /// Replace the value only while it still equals `expected`.
    fn compare_and_set(&self, key: &str, expected: &str, value: String) -> bool;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory store over a `DashMap`. Locking is per shard, so operations on
/// unrelated keys rarely contend.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    map: DashMap<String, String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for InMemoryStore {
    fn create_if_absent(&self, key: &str, value: String) -> bool {
        match self.map.entry(key.to_owned()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    fn set(&self, key: &str, value: String) {
        self.map.insert(key.to_owned(), value);
    }

    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).map(|v| v.value().clone())
    }

    fn exists(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    fn delete(&self, key: &str) -> bool {
        self.map.remove(key).is_some()
    }

    fn compare_and_set(&self, key: &str, expected: &str, value: String) -> bool {
        match self.map.get_mut(key) {
            Some(mut current) if current.as_str() == expected => {
                *current = value;
                true
            }
            _ => false,
        }
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Barrier,
    };

    #[test]
    fn create_if_absent_inserts_once() {
        let store = InMemoryStore::new();
        assert!(store.create_if_absent("k", "v1".into()));
        assert_eq!(store.get("k").as_deref(), Some("v1"));

        // second create loses and leaves the original value alone
        assert!(!store.create_if_absent("k", "v2".into()));
        assert_eq!(store.get("k").as_deref(), Some("v1"));
    }

    #[test]
    fn set_overwrites_regardless_of_prior_state() {
        let store = InMemoryStore::new();
        store.set("k", "a".into());
        assert_eq!(store.get("k").as_deref(), Some("a"));
        store.set("k", "b".into());
        store.set("k", "b".into());
        assert_eq!(store.get("k").as_deref(), Some("b"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn delete_reports_removal_exactly_once() {
        let store = InMemoryStore::new();
        assert!(!store.delete("missing"));
        store.set("k", "v".into());
        assert!(store.exists("k"));
        assert!(store.delete("k"));
        assert!(!store.delete("k"));
        assert!(!store.exists("k"));
        assert_eq!(store.get("k"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn compare_and_set_requires_matching_value() {
        let store = InMemoryStore::new();
        assert!(!store.compare_and_set("k", "x", "y".into()));
        assert!(!store.exists("k"));

        store.set("k", "x".into());
        assert!(!store.compare_and_set("k", "other", "y".into()));
        assert_eq!(store.get("k").as_deref(), Some("x"));
        assert!(store.compare_and_set("k", "x", "y".into()));
        assert_eq!(store.get("k").as_deref(), Some("y"));
    }

    #[test]
    fn default_exists_goes_through_get() {
        struct OnlyGet(InMemoryStore);
        impl KvStore for OnlyGet {
            fn create_if_absent(&self, key: &str, value: String) -> bool {
                self.0.create_if_absent(key, value)
            }
            fn set(&self, key: &str, value: String) {
                self.0.set(key, value)
            }
            fn get(&self, key: &str) -> Option<String> {
                self.0.get(key)
            }
            fn delete(&self, key: &str) -> bool {
                self.0.delete(key)
            }
            fn compare_and_set(&self, key: &str, expected: &str, value: String) -> bool {
                self.0.compare_and_set(key, expected, value)
            }
            fn len(&self) -> usize {
                self.0.len()
            }
        }

        let store = OnlyGet(InMemoryStore::new());
        assert!(!store.exists("k"));
        store.set("k", "v".into());
        assert!(store.exists("k"));
        assert!(!store.is_empty());
    }

    #[test]
    fn concurrent_create_has_single_winner() {
        const RACERS: usize = 16;
        let store = Arc::new(InMemoryStore::new());
        let barrier = Arc::new(Barrier::new(RACERS));
        let wins = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..RACERS)
            .map(|i| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                let wins = Arc::clone(&wins);
                std::thread::spawn(move || {
                    barrier.wait();
                    let won = store.create_if_absent("race", format!("v{i}"));
                    if won {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                    (i, won)
                })
            })
            .collect();

        let winners: Vec<usize> = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|(_, won)| *won)
            .map(|(i, _)| i)
            .collect();

        assert_eq!(wins.load(Ordering::SeqCst), 1);
        assert_eq!(winners.len(), 1);
        assert_eq!(store.get("race"), Some(format!("v{}", winners[0])));
    }

    #[test]
    fn concurrent_sets_on_distinct_keys_are_all_visible() {
        let store = Arc::new(InMemoryStore::new());
        std::thread::scope(|s| {
            for t in 0..8 {
                let store = &store;
                s.spawn(move || {
                    for i in 0..100 {
                        store.set(&format!("t{t}-{i}"), i.to_string());
                    }
                });
            }
        });
        assert_eq!(store.len(), 800);
        assert_eq!(store.get("t7-99").as_deref(), Some("99"));
    }
}
