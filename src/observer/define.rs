// ============================================================================
// spark-observe - Property Interceptor
// Reactive read/write paths for a single object property
// ============================================================================
//
// A reactive slot replaces the property in the object's map. Reads register
// the active subscriber with the slot's Dep (and with the child observer's
// Dep, so subscribers also hear about keys added to or elements pushed into
// the nested value). Writes compare, store, re-observe, then notify.
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::observe::{observe, Observer};
use crate::collections::object::{Getter, Property, PropertyKind, Setter};
use crate::collections::{Array, Object, Value};
use crate::core::context::{is_tracking, with_context};
use crate::core::error::{ReactiveError, Result};
use crate::reactivity::dep::Dep;
use crate::reactivity::tracking::untrack;

/// Hook run on every effective write before it is applied, outside
/// production mode. Typically used to warn about writes to read-only data.
pub type CustomSetter = Rc<dyn Fn(&Value)>;

// =============================================================================
// REACTIVE SLOT
// =============================================================================

pub(crate) struct ReactiveSlot {
    dep: Dep,
    /// Backing store, unused when a prior getter is chained
    value: RefCell<Value>,
    child: RefCell<Option<Rc<Observer>>>,
    getter: Option<Getter>,
    setter: Option<Setter>,
    custom_setter: Option<CustomSetter>,
    shallow: bool,
}

impl ReactiveSlot {
    fn current(&self) -> Value {
        match &self.getter {
            Some(get) => get(),
            None => self.value.borrow().clone(),
        }
    }

    pub(crate) fn get(&self) -> Value {
        let value = self.current();

        if is_tracking() {
            self.dep.depend();
            let child = self.child.borrow().clone();
            if let Some(child) = child {
                child.dep().depend();
                if let Value::Array(arr) = &value {
                    depend_array(arr);
                }
            }
        }

        value
    }

    pub(crate) fn set(&self, new_value: Value) {
        if new_value.same_value(&self.current()) {
            return;
        }

        if let Some(hook) = &self.custom_setter {
            if !with_context(|ctx| ctx.is_production()) {
                hook(&new_value);
            }
        }

        match (&self.getter, &self.setter) {
            // read-only accessor
            (Some(_), None) => return,
            (_, Some(set)) => set(new_value.clone()),
            (None, None) => {
                let old = self.value.replace(new_value.clone());
                drop(old);
            }
        }

        let child = if self.shallow {
            None
        } else {
            observe(&new_value, false).ok()
        };
        *self.child.borrow_mut() = child;

        self.dep.notify();
    }

    /// Stored value without tracking. `None` for getter-backed slots.
    pub(crate) fn peek(&self) -> Option<Value> {
        match self.getter {
            Some(_) => None,
            None => Some(self.value.borrow().clone()),
        }
    }

    pub(crate) fn dep(&self) -> &Dep {
        &self.dep
    }
}

impl fmt::Debug for ReactiveSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveSlot")
            .field("dep", &self.dep)
            .field("shallow", &self.shallow)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// DEFINE REACTIVE
// =============================================================================

/// Make `obj[key]` reactive.
///
/// An existing accessor is kept and chained through. With `value` as `None`
/// the current value is read from the property (unless it is a getter-only
/// accessor). Unless `shallow`, the value is observed as well.
///
/// A non-configurable property is left as it is. Adding a new key to a
/// non-extensible object fails.
pub fn define_reactive(
    obj: &Object,
    key: &str,
    value: Option<Value>,
    custom_setter: Option<CustomSetter>,
    shallow: bool,
) -> Result<()> {
    let existing = obj.own_property(key);

    let (getter, setter): (Option<Getter>, Option<Setter>) = match &existing {
        Some(prop) if !prop.configurable => return Ok(()),
        None if !obj.is_extensible() => {
            return Err(ReactiveError::NotExtensible {
                key: key.to_string(),
            })
        }
        Some(Property {
            kind: PropertyKind::Accessor { get, set },
            ..
        }) => (get.clone(), set.clone()),
        Some(Property {
            kind: PropertyKind::Reactive(slot),
            ..
        }) => {
            let (read, write) = (slot.clone(), slot.clone());
            let get: Getter = Rc::new(move || read.get());
            let set: Setter = Rc::new(move |v: Value| write.set(v));
            (Some(get), Some(set))
        }
        _ => (None, None),
    };

    let value = match value {
        Some(value) => value,
        None if getter.is_none() || setter.is_some() => untrack(|| obj.get(key)),
        None => Value::Undefined,
    };

    let child = if shallow {
        None
    } else {
        observe(&value, false).ok()
    };

    let slot = ReactiveSlot {
        dep: Dep::new(),
        value: RefCell::new(value),
        child: RefCell::new(child),
        getter,
        setter,
        custom_setter,
        shallow,
    };

    obj.install(
        key,
        Property {
            kind: PropertyKind::Reactive(Rc::new(slot)),
            enumerable: true,
            configurable: true,
        },
    );
    Ok(())
}

/// Register the active subscriber with every observable element of `arr`,
/// descending into nested arrays.
///
/// Element access cannot be intercepted, so a subscriber that reads an array
/// depends on each of its elements as a whole.
pub fn depend_array(arr: &Array) {
    for item in arr.to_vec() {
        if let Some(ob) = item.observer() {
            ob.dep().depend();
        }
        if let Value::Array(inner) = &item {
            depend_array(inner);
        }
    }
}

/// The Dep of a reactive property, if `key` has been made reactive
pub fn property_dep(obj: &Object, key: &str) -> Option<Dep> {
    match obj.own_property(key)?.kind {
        PropertyKind::Reactive(slot) => Some(slot.dep().clone()),
        _ => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================
