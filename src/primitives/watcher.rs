// ============================================================================
// spark-observe - Watcher
// A self-re-tracking subscriber
// ============================================================================
//
// Each run executes the watcher's closure inside a tracked read phase and
// records the Deps it touched. After the run, Deps from the previous run that
// were not touched again are unsubscribed, so a branch that stops reading a
// property stops hearing about it.
//
// A watcher whose own run writes to something it reads would notify itself
// re-entrantly; such notifications are folded into a rerun after the current
// pass, bounded by MAX_RERUNS.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::core::config::warn;
use crate::core::context::with_context;
use crate::core::types::{DepId, Subscriber, SubscriberId};
use crate::reactivity::dep::Dep;
use crate::reactivity::tracking::track;

/// Consecutive reruns allowed before a watcher is considered to be looping
pub const MAX_RERUNS: usize = 100;

// =============================================================================
// WATCHER
// =============================================================================

/// Runs a closure now and again whenever anything it read changes.
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use spark_observe::{observe, watcher, Object, Value};
///
/// let data = Object::from_iter([("count", 0)]);
/// observe(&Value::from(data.clone()), false).unwrap();
///
/// let seen = Rc::new(Cell::new(0.0));
/// let _w = watcher({
///     let (data, seen) = (data.clone(), seen.clone());
///     move || seen.set(data.get("count").as_number().unwrap_or_default())
/// });
///
/// data.set("count", 3);
/// assert_eq!(seen.get(), 3.0);
/// ```
pub struct Watcher {
    id: SubscriberId,
    this: Weak<Watcher>,
    getter: RefCell<Box<dyn FnMut()>>,
    deps: RefCell<IndexMap<DepId, Dep>>,
    new_deps: RefCell<IndexMap<DepId, Dep>>,
    active: Cell<bool>,
    running: Cell<bool>,
    pending: Cell<bool>,
    run_count: Cell<usize>,
}

impl Watcher {
    /// Create a watcher and run it once to collect its dependencies.
    pub fn new(getter: impl FnMut() + 'static) -> Rc<Self> {
        let watcher = Rc::new_cyclic(|this| Watcher {
            id: with_context(|ctx| ctx.allocate_subscriber_id()),
            this: this.clone(),
            getter: RefCell::new(Box::new(getter)),
            deps: RefCell::new(IndexMap::new()),
            new_deps: RefCell::new(IndexMap::new()),
            active: Cell::new(true),
            running: Cell::new(false),
            pending: Cell::new(false),
            run_count: Cell::new(0),
        });
        watcher.run();
        watcher
    }

    /// Re-run the closure and re-collect dependencies.
    ///
    /// Called while already running, the request is deferred until the
    /// current pass finishes.
    pub fn run(&self) {
        if !self.active.get() {
            return;
        }
        if self.running.get() {
            self.pending.set(true);
            return;
        }

        let _running = RunningFlag::set(&self.running);
        let mut passes = 0;
        loop {
            self.pending.set(false);
            self.run_once();
            passes += 1;

            if !self.pending.get() || !self.active.get() {
                break;
            }
            if passes >= MAX_RERUNS {
                self.pending.set(false);
                warn(&format!(
                    "Watcher {} reran {MAX_RERUNS} times in a row; it may be updating \
                     a value it also reads.",
                    self.id
                ));
                break;
            }
        }
    }

    fn run_once(&self) {
        let Some(this) = self.this.upgrade() else {
            return;
        };

        {
            let _tracking = track(this);
            let mut getter = self.getter.borrow_mut();
            (getter)();
        }

        if self.active.get() {
            self.cleanup_deps();
        } else {
            // torn down mid-run: drop whatever was read after the teardown
            let read_after = std::mem::take(&mut *self.new_deps.borrow_mut());
            for dep in read_after.values() {
                dep.remove_sub(self.id);
            }
        }
        self.run_count.set(self.run_count.get() + 1);
        tracing::trace!(
            target: "spark_observe",
            watcher = self.id,
            deps = self.deps.borrow().len(),
            "watcher ran"
        );
    }

    /// Swap in this run's Deps and unsubscribe from the ones not read again.
    fn cleanup_deps(&self) {
        let current = std::mem::take(&mut *self.new_deps.borrow_mut());
        let previous = self.deps.replace(current);
        let deps = self.deps.borrow();
        for (id, dep) in previous {
            if !deps.contains_key(&id) {
                dep.remove_sub(self.id);
            }
        }
    }

    /// Unsubscribe from everything and never run again.
    pub fn teardown(&self) {
        if !self.active.replace(false) {
            return;
        }
        let deps = std::mem::take(&mut *self.deps.borrow_mut());
        let new_deps = std::mem::take(&mut *self.new_deps.borrow_mut());
        for dep in deps.values().chain(new_deps.values()) {
            dep.remove_sub(self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Number of Deps read during the last run
    pub fn dep_count(&self) -> usize {
        self.deps.borrow().len()
    }

    /// Number of completed runs, including the initial one
    pub fn run_count(&self) -> usize {
        self.run_count.get()
    }
}

impl Subscriber for Watcher {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn update(&self) {
        self.run();
    }

    fn record_dep(&self, dep: &Dep) -> bool {
        let id = dep.id();
        if self.new_deps.borrow().contains_key(&id) {
            return false;
        }
        self.new_deps.borrow_mut().insert(id, dep.clone());
        // still subscribed from the previous run
        !self.deps.borrow().contains_key(&id)
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        for dep in self.deps.get_mut().values() {
            dep.remove_sub(self.id);
        }
    }
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("id", &self.id)
            .field("active", &self.active.get())
            .field("deps", &self.deps.borrow().len())
            .field("run_count", &self.run_count.get())
            .finish()
    }
}

/// Clears the running flag on every exit path out of `run`.
struct RunningFlag<'a>(&'a Cell<bool>);

impl<'a> RunningFlag<'a> {
    fn set(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for RunningFlag<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Create a [`Watcher`]. It runs immediately.
pub fn watcher(getter: impl FnMut() + 'static) -> Rc<Watcher> {
    Watcher::new(getter)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::{Object, Value};
    use crate::observer::{observe, property_dep};

    fn observed(pairs: &[(&str, Value)]) -> Object {
        let obj: Object = pairs.iter().map(|(k, v)| (*k, v.clone())).collect();
        observe(&Value::from(obj.clone()), false).unwrap();
        obj
    }

    #[test]
    fn runs_immediately_and_on_change() {
        let data = observed(&[("a", Value::from(1))]);
        let w = watcher({
            let data = data.clone();
            move || {
                data.get("a");
            }
        });
        assert_eq!(w.run_count(), 1);
        assert_eq!(w.dep_count(), 1);

        data.set("a", 2);
        assert_eq!(w.run_count(), 2);
        data.set("a", 2);
        assert_eq!(w.run_count(), 2);
    }

    #[test]
    fn stale_dependencies_are_dropped() {
        let data = observed(&[
            ("flag", Value::from(true)),
            ("left", Value::from(1)),
            ("right", Value::from(2)),
        ]);
        let w = watcher({
            let data = data.clone();
            move || {
                if data.get("flag").as_bool() == Some(true) {
                    data.get("left");
                } else {
                    data.get("right");
                }
            }
        });
        let left = property_dep(&data, "left").unwrap();
        let right = property_dep(&data, "right").unwrap();
        assert!(left.has_sub(w.id()));
        assert!(!right.has_sub(w.id()));

        data.set("flag", false);
        assert!(!left.has_sub(w.id()));
        assert!(right.has_sub(w.id()));

        let runs = w.run_count();
        data.set("left", 10);
        assert_eq!(w.run_count(), runs);
    }

    #[test]
    fn reading_twice_subscribes_once() {
        let data = observed(&[("a", Value::from(1))]);
        let w = watcher({
            let data = data.clone();
            move || {
                data.get("a");
                data.get("a");
            }
        });
        assert_eq!(w.dep_count(), 1);
        assert_eq!(property_dep(&data, "a").unwrap().sub_count(), 1);
    }

    #[test]
    fn teardown_unsubscribes() {
        let data = observed(&[("a", Value::from(1))]);
        let w = watcher({
            let data = data.clone();
            move || {
                data.get("a");
            }
        });
        w.teardown();
        assert!(!w.is_active());
        assert_eq!(property_dep(&data, "a").unwrap().sub_count(), 0);

        data.set("a", 5);
        assert_eq!(w.run_count(), 1);
    }

    #[test]
    fn teardown_from_inside_run_unsubscribes() {
        let data = observed(&[
            ("stop", Value::from(false)),
            ("before", Value::from(1)),
            ("after", Value::from(2)),
        ]);
        let handle: Rc<RefCell<Weak<Watcher>>> = Rc::new(RefCell::new(Weak::new()));
        let w = watcher({
            let (data, handle) = (data.clone(), handle.clone());
            move || {
                data.get("before");
                if data.get("stop").as_bool() == Some(true) {
                    if let Some(w) = handle.borrow().upgrade() {
                        w.teardown();
                    }
                    data.get("after");
                }
            }
        });
        *handle.borrow_mut() = Rc::downgrade(&w);

        data.set("stop", true);
        assert!(!w.is_active());
        assert_eq!(w.dep_count(), 0);
        for key in ["stop", "before", "after"] {
            assert_eq!(property_dep(&data, key).unwrap().sub_count(), 0, "{key}");
        }

        let runs = w.run_count();
        data.set("after", 3);
        data.set("before", 3);
        assert_eq!(w.run_count(), runs);
    }

    #[test]
    fn dropping_unsubscribes() {
        let data = observed(&[("a", Value::from(1))]);
        let w = watcher({
            let data = data.clone();
            move || {
                data.get("a");
            }
        });
        drop(w);
        assert_eq!(property_dep(&data, "a").unwrap().sub_count(), 0);
        data.set("a", 2);
    }

    #[test]
    fn self_triggering_write_reruns_until_stable() {
        let data = observed(&[("n", Value::from(0))]);
        let w = watcher({
            let data = data.clone();
            move || {
                let n = data.get("n").as_number().unwrap_or_default();
                if n < 3.0 {
                    data.set("n", n + 1.0);
                }
            }
        });
        assert_eq!(data.get("n").as_number(), Some(3.0));
        assert_eq!(w.run_count(), 4);
    }

    #[test]
    fn runaway_loop_is_bounded() {
        let messages = Rc::new(RefCell::new(Vec::<String>::new()));
        let cfg = crate::Config::default().with_warn_handler({
            let messages = messages.clone();
            move |m| messages.borrow_mut().push(m.to_string())
        });

        let data = observed(&[("n", Value::from(0))]);
        let w = crate::with_config(cfg, || {
            watcher({
                let data = data.clone();
                move || {
                    let n = data.get("n").as_number().unwrap_or_default();
                    data.set("n", n + 1.0);
                }
            })
        });

        assert_eq!(w.run_count(), MAX_RERUNS);
        assert_eq!(messages.borrow().len(), 1);
    }
}
