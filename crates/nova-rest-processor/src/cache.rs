use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

/// Session-scoped memo table that computes each key at most once.
///
/// The map lock is only held long enough to find or create the per-key cell;
/// initialisation runs on the cell, so concurrent callers for the same key
/// block on it while other keys proceed independently. Entries are never
/// overwritten or evicted.
pub struct OnceMap<V> {
    entries: Mutex<HashMap<String, Arc<OnceLock<V>>>>,
}

impl<V> Default for OnceMap<V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<V: Clone> OnceMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `key`, running `init` if (and only if) no value
    /// has been computed yet.
    pub fn get_or_init(&self, key: &str, init: impl FnOnce() -> V) -> V {
        let cell = {
            let mut entries = self.entries.lock();
            match entries.get(key) {
                Some(cell) => cell.clone(),
                None => {
                    let cell = Arc::new(OnceLock::new());
                    entries.insert(key.to_owned(), cell.clone());
                    cell
                }
            }
        };
        cell.get_or_init(init).clone()
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let cell = self.entries.lock().get(key).cloned()?;
        cell.get().cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of computed entries.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|cell| cell.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Computed entries in key order.
    pub fn snapshot(&self) -> BTreeMap<String, V> {
        self.entries
            .lock()
            .iter()
            .filter_map(|(key, cell)| cell.get().map(|value| (key.clone(), value.clone())))
            .collect()
    }
}

impl<V> std::fmt::Debug for OnceMap<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnceMap")
            .field("keys", &self.entries.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn init_runs_once_per_key() {
        let map = OnceMap::new();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let value = map.get_or_init("a", || {
                calls.fetch_add(1, Ordering::SeqCst);
                Some("x".to_owned())
            });
            assert_eq!(value.as_deref(), Some("x"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(map.get("b"), None);
    }

    #[test]
    fn negative_results_are_memoized() {
        let map: OnceMap<Option<String>> = OnceMap::new();
        assert_eq!(map.get_or_init("missing", || None), None);
        assert!(map.contains_key("missing"));
        assert_eq!(
            map.get_or_init("missing", || Some("late".to_owned())),
            None
        );
    }

    #[test]
    fn concurrent_callers_share_one_initialisation() {
        let map = Arc::new(OnceMap::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let threads = 16;
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let map = map.clone();
                let calls = calls.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    map.get_or_init("shared", || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(std::time::Duration::from_millis(5));
                        42u32
                    })
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(map.len(), 1);
    }
}
