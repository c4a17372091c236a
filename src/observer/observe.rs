// ============================================================================
// spark-observe - Object Observer
// Attaches tracking metadata to objects and arrays, once
// ============================================================================

use std::cell::Cell;
use std::rc::Rc;

use super::define::define_reactive;
use crate::collections::{Array, Object, Value};
use crate::core::context::with_context;
use crate::core::error::NotObservable;
use crate::reactivity::dep::Dep;

// =============================================================================
// OBSERVER
// =============================================================================

/// Tracking metadata attached to an observed object or array.
///
/// The Dep here stands for the value as a whole: it is notified when keys are
/// added or deleted through [`set`](crate::set) / [`del`](crate::del), and
/// when an array is structurally mutated.
#[derive(Debug)]
pub struct Observer {
    dep: Dep,
    vm_count: Cell<usize>,
}

impl Observer {
    fn new() -> Self {
        Self {
            dep: Dep::new(),
            vm_count: Cell::new(0),
        }
    }

    pub fn dep(&self) -> &Dep {
        &self.dep
    }

    /// How many root consumers use this value as their root data
    pub fn vm_count(&self) -> usize {
        self.vm_count.get()
    }

    /// Install a reactive slot on every enumerable own property
    pub fn walk(&self, obj: &Object) {
        for key in obj.keys() {
            if let Err(err) = define_reactive(obj, &key, None, None, false) {
                tracing::debug!(target: "spark_observe", key = %key, error = %err, "skipped property");
            }
        }
    }

    /// Observe every composite element of `items`
    pub fn observe_array(&self, items: &[Value]) {
        for item in items {
            let _ = observe(item, false);
        }
    }
}

// =============================================================================
// OBSERVE
// =============================================================================

/// Attach an [`Observer`] to `value`, or return the one already attached.
///
/// Objects get a reactive slot on every enumerable property and arrays have
/// their elements observed, recursively. The value is converted in place.
/// `as_root` marks the value as a consumer's root data.
///
/// An existing observer is returned even while observing is toggled off.
///
/// ```
/// use std::rc::Rc;
/// use spark_observe::{observe, NotObservable, Object, Value};
///
/// let data = Value::from(Object::from_iter([("a", 1)]));
/// let first = observe(&data, false).unwrap();
/// let second = observe(&data, false).unwrap();
/// assert!(Rc::ptr_eq(&first, &second));
///
/// assert_eq!(observe(&Value::from(1), false).unwrap_err(), NotObservable::Primitive);
/// ```
pub fn observe(value: &Value, as_root: bool) -> Result<Rc<Observer>, NotObservable> {
    let ob = match value {
        Value::Object(obj) => match obj.observer() {
            Some(ob) => ob,
            None => observe_object(obj)?,
        },
        Value::Array(arr) => match arr.observer() {
            Some(ob) => ob,
            None => observe_new_array(arr)?,
        },
        _ => return Err(NotObservable::Primitive),
    };

    if as_root {
        ob.vm_count.set(ob.vm_count.get() + 1);
    }
    Ok(ob)
}

fn check_eligible(extensible: bool, component_instance: bool) -> Result<(), NotObservable> {
    let (observing, ssr) = with_context(|ctx| (ctx.should_observe(), ctx.is_server_rendering()));
    if !observing {
        return Err(NotObservable::ObservingDisabled);
    }
    if ssr {
        return Err(NotObservable::ServerRendering);
    }
    if !extensible {
        return Err(NotObservable::NotExtensible);
    }
    if component_instance {
        return Err(NotObservable::ComponentInstance);
    }
    Ok(())
}

fn observe_object(obj: &Object) -> Result<Rc<Observer>, NotObservable> {
    check_eligible(obj.is_extensible(), obj.is_component_instance())?;

    // Attached before walking so a self-reference finds the marker.
    let ob = Rc::new(Observer::new());
    obj.attach_observer(ob.clone());
    tracing::trace!(target: "spark_observe", dep = ob.dep.id(), keys = obj.len(), "observe object");

    ob.walk(obj);
    Ok(ob)
}

fn observe_new_array(arr: &Array) -> Result<Rc<Observer>, NotObservable> {
    check_eligible(arr.is_extensible(), false)?;

    let ob = Rc::new(Observer::new());
    arr.attach_observer(ob.clone());
    tracing::trace!(target: "spark_observe", dep = ob.dep.id(), len = arr.len(), "observe array");

    ob.observe_array(&arr.to_vec());
    Ok(ob)
}

// =============================================================================
// OBSERVING TOGGLE
// =============================================================================

/// Enable or disable observation of values not yet observed. Returns the
/// previous state.
pub fn toggle_observing(enabled: bool) -> bool {
    with_context(|ctx| ctx.set_should_observe(enabled))
}

/// Restores the observing flag it replaced when dropped.
#[must_use = "observing resumes as soon as the guard is dropped"]
pub struct ObservingGuard {
    previous: bool,
}

impl Drop for ObservingGuard {
    fn drop(&mut self) {
        toggle_observing(self.previous);
    }
}

/// Turn observing off until the guard is dropped.
///
/// Used when passing values down that are already reactive at their source,
/// or that must stay plain.
pub fn pause_observing() -> ObservingGuard {
    ObservingGuard {
        previous: toggle_observing(false),
    }
}

// =============================================================================
// TESTS
// =============================================================================
