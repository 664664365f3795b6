use std::panic;
use std::sync::Arc;

use tracing::warn;

/// Receives breadcrumb log mutations. Observers are handed event text only,
/// never the log itself, so they cannot mutate it during a notification.
pub trait BreadcrumbObserver: Send + Sync {
    /// `event` is the stored form, timestamp prefix included.
    fn event_added(&self, event: &str);

    /// Some events aged out or hit the ceiling.
    fn old_events_removed(&self, _dropped: usize) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

#[derive(Default)]
pub(crate) struct ObserverRegistry {
    next_id: u64,
    observers: Vec<(ObserverId, Arc<dyn BreadcrumbObserver>)>,
}

impl ObserverRegistry {
    pub(crate) fn register(&mut self, observer: Arc<dyn BreadcrumbObserver>) -> ObserverId {
        self.next_id += 1;
        let id = ObserverId(self.next_id);
        self.observers.push((id, observer));
        id
    }

    pub(crate) fn unregister(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        before != self.observers.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub(crate) fn emit_added(&self, event: &str) {
        for (id, observer) in &self.observers {
            if panic::catch_unwind(panic::AssertUnwindSafe(|| observer.event_added(event))).is_err() {
                warn!(observer = id.0, "breadcrumb observer panicked; continuing");
            }
        }
    }

    pub(crate) fn emit_removed(&self, dropped: usize) {
        for (id, observer) in &self.observers {
            if panic::catch_unwind(panic::AssertUnwindSafe(|| observer.old_events_removed(dropped)))
                .is_err()
            {
                warn!(observer = id.0, "breadcrumb observer panicked; continuing");
            }
        }
    }
}
