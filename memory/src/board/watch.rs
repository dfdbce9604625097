use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::PlayerId;

pub(crate) type WatchCallback = Box<dyn FnOnce(String) + Send>;

/// Pending one-shot watch registrations, at most one per player.
#[derive(Default)]
pub(crate) struct WatchRegistry {
    pending: Mutex<HashMap<PlayerId, WatchCallback>>,
}

impl WatchRegistry {
    pub(crate) fn register(&self, viewer: PlayerId, callback: WatchCallback) {
        if self.pending.lock().insert(viewer.clone(), callback).is_some() {
            debug!(viewer = %viewer, "Replaced pending watch");
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Consumes every pending registration and calls it with `render(viewer)`.
    ///
    /// The registry is unlocked while callbacks run, so they may register
    /// again. A panicking callback is logged and skipped.
    pub(crate) fn deliver(&self, render: impl Fn(&PlayerId) -> String) {
        let pending = std::mem::take(&mut *self.pending.lock());
        for (viewer, callback) in pending {
            let view = render(&viewer);
            debug!(viewer = %viewer, "Delivering board change");
            if catch_unwind(AssertUnwindSafe(move || callback(view))).is_err() {
                warn!(viewer = %viewer, "Watch callback panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn counting(counter: &Arc<AtomicUsize>) -> WatchCallback {
        let counter = Arc::clone(counter);
        Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn delivery_is_one_shot() {
        let registry = WatchRegistry::default();
        let counter = Arc::new(AtomicUsize::new(0));
        registry.register(PlayerId::from("a"), counting(&counter));
        registry.register(PlayerId::from("b"), counting(&counter));
        assert_eq!(registry.len(), 2);

        registry.deliver(|viewer| viewer.to_string());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(registry.len(), 0);

        registry.deliver(|viewer| viewer.to_string());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn registering_again_replaces() {
        let registry = WatchRegistry::default();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        registry.register(PlayerId::from("a"), counting(&first));
        registry.register(PlayerId::from("a"), counting(&second));
        assert_eq!(registry.len(), 1);

        registry.deliver(|viewer| viewer.to_string());
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn each_viewer_gets_their_own_rendering() {
        let registry = WatchRegistry::default();
        let (tx, rx) = std::sync::mpsc::channel();
        for viewer in ["a", "b"] {
            let tx = tx.clone();
            registry.register(PlayerId::from(viewer), Box::new(move |view| tx.send(view).unwrap()));
        }
        registry.deliver(|viewer| format!("view of {}", viewer));

        let mut views: Vec<String> = rx.try_iter().collect();
        views.sort();
        assert_eq!(views, vec!["view of a", "view of b"]);
    }
}
