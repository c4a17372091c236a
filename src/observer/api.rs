// ============================================================================
// spark-observe - Root API
// Adding and deleting properties so that subscribers hear about it
// ============================================================================
//
// Plain assignment of a new key cannot be intercepted: the key has no slot
// and no Dep. `set` installs the slot and notifies the owning observer's Dep;
// `del` removes the key and does the same.
// ============================================================================

use super::define::define_reactive;
use crate::collections::{Key, Object, Value};
use crate::core::config::warn;
use crate::core::error::{ReactiveError, Result};

/// Set a property on an object or an element of an array, adding it as a
/// reactive property and notifying the owner if it did not exist.
///
/// Returns the value that was set. Adding properties to a component instance
/// or to a consumer's root data is refused with a warning.
///
/// ```
/// use spark_observe::{observe, set, Object, Value};
///
/// let data = Value::from(Object::new());
/// observe(&data, false).unwrap();
///
/// set(&data, "added", 1).unwrap();
/// assert!(spark_observe::property_dep(data.as_object().unwrap(), "added").is_some());
/// ```
pub fn set(target: &Value, key: impl Into<Key>, value: impl Into<Value>) -> Result<Value> {
    let key = key.into();
    let value = value.into();

    match target {
        Value::Array(arr) => {
            let Some(index) = key.as_index() else {
                return Err(ReactiveError::invalid_key("array", key.as_name()));
            };
            arr.ensure_len(index).map_err(|_| ReactiveError::AllocationFailed { index })?;
            arr.splice(index, 1, [value.clone()]);
            Ok(value)
        }
        Value::Object(obj) => set_property(obj, &key.as_name(), value),
        other => {
            warn(&format!(
                "Cannot set reactive property on undefined, null, or primitive value: {other}"
            ));
            Err(ReactiveError::InvalidTarget { kind: other.kind() })
        }
    }
}

fn set_property(obj: &Object, key: &str, value: Value) -> Result<Value> {
    if obj.has_own(key) {
        obj.set(key, value.clone());
        return Ok(value);
    }

    let ob = obj.observer();
    if obj.is_component_instance() || ob.as_ref().is_some_and(|ob| ob.vm_count() > 0) {
        warn(
            "Avoid adding reactive properties to a component instance or its root data \
             at runtime - declare it upfront.",
        );
        return Ok(value);
    }

    let Some(ob) = ob else {
        obj.set(key, value.clone());
        return Ok(value);
    };

    define_reactive(obj, key, Some(value.clone()), None, false)?;
    ob.dep().notify();
    Ok(value)
}

/// Delete a property or array element, notifying the owner.
///
/// Deleting from a component instance or a consumer's root data is refused
/// with a warning. Deleting a key the object does not have is a no-op.
pub fn del(target: &Value, key: impl Into<Key>) -> Result<()> {
    let key = key.into();

    match target {
        Value::Array(arr) => {
            let Some(index) = key.as_index() else {
                return Err(ReactiveError::invalid_key("array", key.as_name()));
            };
            arr.splice(index, 1, []);
            Ok(())
        }
        Value::Object(obj) => {
            delete_property(obj, &key.as_name());
            Ok(())
        }
        other => {
            warn(&format!(
                "Cannot delete reactive property on undefined, null, or primitive value: {other}"
            ));
            Err(ReactiveError::InvalidTarget { kind: other.kind() })
        }
    }
}

fn delete_property(obj: &Object, key: &str) {
    let ob = obj.observer();
    if obj.is_component_instance() || ob.as_ref().is_some_and(|ob| ob.vm_count() > 0) {
        warn(
            "Avoid deleting properties on a component instance or its root data \
             - just set it to null.",
        );
        return;
    }

    if !obj.has_own(key) || !obj.delete(key) {
        return;
    }

    if let Some(ob) = ob {
        ob.dep().notify();
    }
}

// =============================================================================
// TESTS
// =============================================================================
