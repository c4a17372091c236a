// ============================================================================
// spark-observe - Dependency Set
// Per-property subscriber collection with snapshot notification
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::core::context::with_context;
use crate::core::types::{DepId, Subscriber, SubscriberId};

// =============================================================================
// DEP
// =============================================================================

/// A set of subscribers interested in one property, or in one observable as a
/// whole.
///
/// `Dep` is a cheap handle: clones share the same subscriber set. Subscribers
/// are held weakly and keyed by [`SubscriberId`], so registering the same
/// subscriber twice is a no-op and dropped subscribers fall out on the next
/// notify.
#[derive(Clone)]
pub struct Dep {
    inner: Rc<DepInner>,
}

struct DepInner {
    id: DepId,
    subs: RefCell<IndexMap<SubscriberId, Weak<dyn Subscriber>>>,
}

impl Dep {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(DepInner {
                id: with_context(|ctx| ctx.allocate_dep_id()),
                subs: RefCell::new(IndexMap::new()),
            }),
        }
    }

    pub fn id(&self) -> DepId {
        self.inner.id
    }

    /// Register `sub`. Returns false if it was already registered.
    pub fn add_sub(&self, sub: &Rc<dyn Subscriber>) -> bool {
        let id = sub.id();
        let mut subs = self.inner.subs.borrow_mut();
        if subs.contains_key(&id) {
            return false;
        }
        subs.insert(id, Rc::downgrade(sub));
        true
    }

    /// Unregister a subscriber. Returns false if it was not registered.
    pub fn remove_sub(&self, id: SubscriberId) -> bool {
        self.inner.subs.borrow_mut().shift_remove(&id).is_some()
    }

    pub fn has_sub(&self, id: SubscriberId) -> bool {
        self.inner.subs.borrow().contains_key(&id)
    }

    /// Number of live subscribers
    pub fn sub_count(&self) -> usize {
        self.inner
            .subs
            .borrow()
            .values()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Register the active subscriber, if any, with this dep.
    ///
    /// The subscriber gets a chance to veto via
    /// [`Subscriber::record_dep`] (per-cycle dedupe in consumers).
    pub fn depend(&self) {
        let Some(target) = with_context(|ctx| ctx.current_target()) else {
            return;
        };
        if target.record_dep(self) {
            self.add_sub(&target);
        }
    }

    /// Invoke every subscriber registered at the time of the call.
    ///
    /// Iterates a snapshot ordered by subscriber id: a subscriber added while
    /// notifying is not invoked in this pass, and no borrow of the set is held
    /// while subscribers run.
    pub fn notify(&self) {
        let mut subs: Vec<(SubscriberId, Rc<dyn Subscriber>)> = {
            let mut map = self.inner.subs.borrow_mut();
            map.retain(|_, weak| weak.strong_count() > 0);
            map.iter()
                .filter_map(|(id, weak)| weak.upgrade().map(|sub| (*id, sub)))
                .collect()
        };
        subs.sort_by_key(|(id, _)| *id);

        tracing::trace!(dep = self.inner.id, subscribers = subs.len(), "notify");

        for (_, sub) in subs {
            sub.update();
        }
    }

    pub fn ptr_eq(&self, other: &Dep) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Dep {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dep")
            .field("id", &self.inner.id)
            .field("subs", &self.inner.subs.borrow().len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactivity::tracking::track;
    use std::cell::{Cell, RefCell};

    struct Counter {
        id: SubscriberId,
        runs: Cell<usize>,
    }

    impl Counter {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                id: with_context(|ctx| ctx.allocate_subscriber_id()),
                runs: Cell::new(0),
            })
        }
    }

    impl Subscriber for Counter {
        fn id(&self) -> SubscriberId {
            self.id
        }

        fn update(&self) {
            self.runs.set(self.runs.get() + 1);
        }
    }

    #[test]
    fn add_sub_has_set_semantics() {
        let dep = Dep::new();
        let sub: Rc<dyn Subscriber> = Counter::new();

        assert!(dep.add_sub(&sub));
        assert!(!dep.add_sub(&sub));
        assert_eq!(dep.sub_count(), 1);
    }

    #[test]
    fn notify_invokes_each_subscriber_once() {
        let dep = Dep::new();
        let a = Counter::new();
        let b = Counter::new();
        dep.add_sub(&(a.clone() as Rc<dyn Subscriber>));
        dep.add_sub(&(b.clone() as Rc<dyn Subscriber>));
        dep.add_sub(&(a.clone() as Rc<dyn Subscriber>));

        dep.notify();

        assert_eq!(a.runs.get(), 1);
        assert_eq!(b.runs.get(), 1);
    }

    #[test]
    fn depend_registers_active_subscriber_only() {
        let dep = Dep::new();
        let sub = Counter::new();

        dep.depend();
        assert_eq!(dep.sub_count(), 0);

        {
            let _guard = track(sub.clone());
            dep.depend();
            dep.depend();
        }
        assert_eq!(dep.sub_count(), 1);
        assert!(dep.has_sub(sub.id));
    }

    #[test]
    fn remove_sub_unregisters() {
        let dep = Dep::new();
        let sub = Counter::new();
        dep.add_sub(&(sub.clone() as Rc<dyn Subscriber>));

        assert!(dep.remove_sub(sub.id));
        assert!(!dep.remove_sub(sub.id));

        dep.notify();
        assert_eq!(sub.runs.get(), 0);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let dep = Dep::new();
        {
            let sub = Counter::new();
            dep.add_sub(&(sub as Rc<dyn Subscriber>));
        }
        assert_eq!(dep.sub_count(), 0);
        dep.notify();
    }

    #[test]
    fn notify_order_follows_subscriber_creation() {
        struct Recorder {
            id: SubscriberId,
            log: Rc<RefCell<Vec<SubscriberId>>>,
        }

        impl Subscriber for Recorder {
            fn id(&self) -> SubscriberId {
                self.id
            }

            fn update(&self) {
                self.log.borrow_mut().push(self.id);
            }
        }

        let log = Rc::new(RefCell::new(Vec::new()));
        let first: Rc<dyn Subscriber> = Rc::new(Recorder {
            id: with_context(|ctx| ctx.allocate_subscriber_id()),
            log: log.clone(),
        });
        let second: Rc<dyn Subscriber> = Rc::new(Recorder {
            id: with_context(|ctx| ctx.allocate_subscriber_id()),
            log: log.clone(),
        });

        let dep = Dep::new();
        dep.add_sub(&second);
        dep.add_sub(&first);
        dep.notify();

        assert_eq!(*log.borrow(), vec![first.id(), second.id()]);
    }

    #[test]
    fn subscriber_added_during_notify_waits_for_next_pass() {
        struct Adder {
            id: SubscriberId,
            dep: Dep,
            late: Rc<dyn Subscriber>,
        }

        impl Subscriber for Adder {
            fn id(&self) -> SubscriberId {
                self.id
            }

            fn update(&self) {
                self.dep.add_sub(&self.late);
            }
        }

        let dep = Dep::new();
        let late = Counter::new();
        let adder: Rc<dyn Subscriber> = Rc::new(Adder {
            id: with_context(|ctx| ctx.allocate_subscriber_id()),
            dep: dep.clone(),
            late: late.clone(),
        });
        dep.add_sub(&adder);

        dep.notify();
        assert_eq!(late.runs.get(), 0);

        dep.notify();
        assert_eq!(late.runs.get(), 1);
    }
}
