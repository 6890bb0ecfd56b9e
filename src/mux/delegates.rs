//! Priority-Ordered Delegate Registry
//!
//! Delegates are broad feature handlers registered at a unique integer
//! priority. Dispatch walks them in ascending priority order and stops at
//! the first delegate that consumes the event.
//!
//! The registry is mutated from setup code but read on the delivery thread
//! for every event. Readers take an immutable snapshot (`Arc` clone under a
//! short read lock) and iterate it without holding any lock, so a slow
//! delegate never blocks registration and registration never blocks
//! dispatch mid-iteration.

use crate::event::{EventKind, UiEvent};
use crate::mux::DispatchContext;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// A priority-ordered, optionally kind-filtered handler for
/// accessibility events.
pub trait Delegate: Send + Sync {
    /// The event kinds this delegate wants, or `None` for all kinds.
    ///
    /// Registering a delegate that returns `None` sets the registry's
    /// catch-all flag.
    fn event_kinds(&self) -> Option<&HashSet<EventKind>> {
        None
    }

    /// Handle an event. Returning `true` consumes the event and stops
    /// iteration over lower-priority delegates.
    fn on_event(&self, ctx: &DispatchContext<'_>, event: &UiEvent) -> bool;
}

/// Closures double as catch-all delegates.
impl<F> Delegate for F
where
    F: Fn(&DispatchContext<'_>, &UiEvent) -> bool + Send + Sync,
{
    fn on_event(&self, ctx: &DispatchContext<'_>, event: &UiEvent) -> bool {
        self(ctx, event)
    }
}

/// Immutable snapshot of the registered delegates.
pub struct DelegateTable {
    /// Delegates in ascending priority order
    entries: Vec<(i32, Arc<dyn Delegate>)>,
    /// Union of all per-delegate filters seen so far
    kinds: HashSet<EventKind>,
    /// At least one delegate subscribes to all kinds
    catch_all: bool,
}

impl DelegateTable {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            kinds: HashSet::new(),
            catch_all: false,
        }
    }

    /// Whether any delegate wants events of this kind.
    pub fn wants(&self, kind: EventKind) -> bool {
        self.catch_all || self.kinds.contains(&kind)
    }

    /// Delegates in ascending priority order.
    pub fn entries(&self) -> &[(i32, Arc<dyn Delegate>)] {
        &self.entries
    }

    /// Number of registered delegates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no delegate is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Registry of delegates keyed by unique priority.
pub struct DelegateRegistry {
    map: RwLock<BTreeMap<i32, Arc<dyn Delegate>>>,
    /// Aggregated filter state. Grows monotonically: replacing a delegate
    /// does not shrink the union, so an event kind once subscribed stays
    /// routed for the life of the registry.
    kinds: RwLock<HashSet<EventKind>>,
    catch_all: RwLock<bool>,
    snapshot: RwLock<Arc<DelegateTable>>,
}

impl DelegateRegistry {
    pub fn new() -> Self {
        Self {
            map: RwLock::new(BTreeMap::new()),
            kinds: RwLock::new(HashSet::new()),
            catch_all: RwLock::new(false),
            snapshot: RwLock::new(Arc::new(DelegateTable::empty())),
        }
    }

    /// Insert or overwrite the delegate at `priority`.
    ///
    /// Registration at an already-used priority silently replaces the
    /// earlier delegate; only the latest one fires.
    pub fn register(&self, priority: i32, delegate: Arc<dyn Delegate>) {
        match delegate.event_kinds() {
            None => *self.catch_all.write() = true,
            Some(filter) => self.kinds.write().extend(filter.iter().copied()),
        }
        self.map.write().insert(priority, delegate);
        self.rebuild();
    }

    /// Remove the delegate at `priority`, if any.
    pub fn unregister(&self, priority: i32) -> bool {
        let removed = self.map.write().remove(&priority).is_some();
        if removed {
            self.rebuild();
        }
        removed
    }

    /// Current snapshot for lock-free iteration.
    pub fn snapshot(&self) -> Arc<DelegateTable> {
        Arc::clone(&self.snapshot.read())
    }

    fn rebuild(&self) {
        let entries: Vec<_> = self
            .map
            .read()
            .iter()
            .map(|(priority, delegate)| (*priority, Arc::clone(delegate)))
            .collect();
        let table = DelegateTable {
            entries,
            kinds: self.kinds.read().clone(),
            catch_all: *self.catch_all.read(),
        };
        *self.snapshot.write() = Arc::new(table);
    }
}

impl Default for DelegateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Filtered {
        kinds: HashSet<EventKind>,
        hits: AtomicUsize,
    }

    impl Filtered {
        fn new(kinds: &[EventKind]) -> Self {
            Self {
                kinds: kinds.iter().copied().collect(),
                hits: AtomicUsize::new(0),
            }
        }
    }

    impl Delegate for Filtered {
        fn event_kinds(&self) -> Option<&HashSet<EventKind>> {
            Some(&self.kinds)
        }

        fn on_event(&self, _ctx: &DispatchContext<'_>, _event: &UiEvent) -> bool {
            self.hits.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    struct CatchAll;

    impl Delegate for CatchAll {
        fn on_event(&self, _ctx: &DispatchContext<'_>, _event: &UiEvent) -> bool {
            false
        }
    }

    #[test]
    fn test_empty_registry_wants_nothing() {
        let registry = DelegateRegistry::new();
        let table = registry.snapshot();
        assert!(table.is_empty());
        assert!(!table.wants(EventKind::ViewClicked));
    }

    #[test]
    fn test_filter_aggregation() {
        let registry = DelegateRegistry::new();
        registry.register(10, Arc::new(Filtered::new(&[EventKind::ViewClicked])));
        registry.register(20, Arc::new(Filtered::new(&[EventKind::ViewScrolled])));

        let table = registry.snapshot();
        assert!(table.wants(EventKind::ViewClicked));
        assert!(table.wants(EventKind::ViewScrolled));
        assert!(!table.wants(EventKind::Announcement));
    }

    #[test]
    fn test_catch_all_flag() {
        let registry = DelegateRegistry::new();
        registry.register(0, Arc::new(CatchAll));

        let table = registry.snapshot();
        assert!(table.wants(EventKind::ViewClicked));
        assert!(table.wants(EventKind::AssistReadingContext));
    }

    #[test]
    fn test_ascending_priority_order() {
        let registry = DelegateRegistry::new();
        registry.register(30, Arc::new(CatchAll));
        registry.register(-5, Arc::new(CatchAll));
        registry.register(10, Arc::new(CatchAll));

        let priorities: Vec<i32> = registry
            .snapshot()
            .entries()
            .iter()
            .map(|(p, _)| *p)
            .collect();
        assert_eq!(priorities, vec![-5, 10, 30]);
    }

    #[test]
    fn test_same_priority_replaces() {
        let registry = DelegateRegistry::new();
        registry.register(10, Arc::new(CatchAll));
        registry.register(10, Arc::new(CatchAll));
        assert_eq!(registry.snapshot().len(), 1);
    }

    #[test]
    fn test_replacement_does_not_shrink_filter_union() {
        let registry = DelegateRegistry::new();
        registry.register(10, Arc::new(Filtered::new(&[EventKind::ViewClicked])));
        registry.register(10, Arc::new(Filtered::new(&[EventKind::ViewScrolled])));

        let table = registry.snapshot();
        assert!(table.wants(EventKind::ViewClicked));
        assert!(table.wants(EventKind::ViewScrolled));
    }

    #[test]
    fn test_unregister() {
        let registry = DelegateRegistry::new();
        registry.register(10, Arc::new(CatchAll));
        assert!(registry.unregister(10));
        assert!(!registry.unregister(10));
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn test_snapshot_is_stable_across_registration() {
        let registry = DelegateRegistry::new();
        registry.register(10, Arc::new(CatchAll));
        let before = registry.snapshot();
        registry.register(20, Arc::new(CatchAll));
        // The earlier snapshot is unaffected by later registration.
        assert_eq!(before.len(), 1);
        assert_eq!(registry.snapshot().len(), 2);
    }
}
