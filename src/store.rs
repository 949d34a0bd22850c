use std::sync::{Arc, Mutex, PoisonError};

use crate::reading::Reading;

/// Latest reading shared between the acquisition, presentation and
/// publication tasks.
///
/// The reading is only ever replaced as a whole value under the lock, so a
/// snapshot is always some reading previously passed to [`update`].
///
/// [`update`]: SharedReadingStore::update
#[derive(Debug, Clone, Default)]
pub struct SharedReadingStore {
    current: Arc<Mutex<Option<Reading>>>,
}

impl SharedReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, reading: Reading) {
        // A poisoned lock still guards a complete value.
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(reading);
    }

    pub fn snapshot(&self) -> Option<Reading> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn test_snapshot_before_update_is_absent() {
        let store = SharedReadingStore::new();
        assert_eq!(store.snapshot(), None);
    }

    #[test]
    fn test_snapshot_is_stable_after_single_update() {
        let store = SharedReadingStore::new();
        let r = Reading::new(22.4, 51.0, 1008.7);
        store.update(r);
        for _ in 0..10 {
            assert_eq!(store.snapshot(), Some(r));
        }
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let store = SharedReadingStore::new();
        store.update(Reading::new(1.0, 2.0, 3.0));
        let before = store.snapshot();
        store.update(Reading::new(4.0, 5.0, 6.0));
        assert_eq!(before, Some(Reading::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_concurrent_update_and_snapshot_never_tear() {
        let store = SharedReadingStore::new();
        let writers = 2;
        let readers = 6;
        let ops_per_caller = 1250;

        let mut handles = Vec::new();
        for w in 0..writers {
            let store = store.clone();
            handles.push(thread::spawn(move || {
                for i in 0..ops_per_caller {
                    let v = (w * ops_per_caller + i) as f64;
                    store.update(Reading::new(v, v, v));
                }
            }));
        }
        for _ in 0..readers {
            let store = store.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..ops_per_caller {
                    if let Some(r) = store.snapshot() {
                        assert_eq!(r.temperature, r.humidity);
                        assert_eq!(r.humidity, r.pressure);
                        assert!(r.temperature < (writers * ops_per_caller) as f64);
                    }
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        assert!(store.snapshot().is_some());
    }
}
