// ============================================================================
// spark-observe - Typed Field
// A reactive property slot for fixed-shape structs
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::collections::Value;
use crate::core::context::is_tracking;
use crate::observer::{depend_array, observe, Observer};
use crate::reactivity::dep::Dep;

// =============================================================================
// SAME VALUE
// =============================================================================

/// Change detection for field values.
///
/// Floats treat NaN as the same as NaN. `Value` compares composites by
/// identity and also observes them when stored in a field.
pub trait SameValue: Clone {
    fn same_value(&self, other: &Self) -> bool;

    /// Observe the value when it is stored, if it is observable
    fn observe_child(&self) -> Option<Rc<Observer>> {
        None
    }

    /// Depend on nested elements after a tracked read
    fn depend_elements(&self) {}
}

macro_rules! impl_same_value_eq {
    ($($t:ty),* $(,)?) => {
        $(
            impl SameValue for $t {
                fn same_value(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

impl_same_value_eq!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, bool, char, String,
    &'static str
);

impl SameValue for f32 {
    fn same_value(&self, other: &Self) -> bool {
        self == other || (self.is_nan() && other.is_nan())
    }
}

impl SameValue for f64 {
    fn same_value(&self, other: &Self) -> bool {
        self == other || (self.is_nan() && other.is_nan())
    }
}

impl<T: SameValue> SameValue for Option<T> {
    fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same_value(b),
            (None, None) => true,
            _ => false,
        }
    }

    fn observe_child(&self) -> Option<Rc<Observer>> {
        self.as_ref().and_then(|value| value.observe_child())
    }

    fn depend_elements(&self) {
        if let Some(value) = self {
            value.depend_elements();
        }
    }
}

impl SameValue for Value {
    fn same_value(&self, other: &Self) -> bool {
        Value::same_value(self, other)
    }

    fn observe_child(&self) -> Option<Rc<Observer>> {
        observe(self, false).ok()
    }

    fn depend_elements(&self) {
        if let Value::Array(arr) = self {
            depend_array(arr);
        }
    }
}

// =============================================================================
// FIELD<T>
// =============================================================================

/// A reactive slot holding a `T`.
///
/// Reads inside a tracked phase register the active subscriber; writes of a
/// different value notify. Usually declared through
/// [`reactive_struct!`](crate::reactive_struct).
///
/// ```
/// use spark_observe::Field;
///
/// let count = Field::new(0);
/// assert!(count.set(1));
/// assert!(!count.set(1));
/// assert_eq!(count.get(), 1);
/// ```
pub struct Field<T> {
    dep: Dep,
    value: RefCell<T>,
    child: RefCell<Option<Rc<Observer>>>,
}

impl<T: SameValue> Field<T> {
    pub fn new(value: T) -> Self {
        let child = value.observe_child();
        Self {
            dep: Dep::new(),
            value: RefCell::new(value),
            child: RefCell::new(child),
        }
    }

    /// Get the current value (cloning), tracked.
    pub fn get(&self) -> T {
        self.track();
        self.value.borrow().clone()
    }

    /// Access the current value with a closure, tracked.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        let value = self.value.borrow().clone();
        f(&value)
    }

    /// Get the current value without registering a dependency.
    pub fn peek(&self) -> T {
        self.value.borrow().clone()
    }

    /// Store `value`. Returns true if it differed from the current value and
    /// subscribers were notified.
    pub fn set(&self, value: T) -> bool {
        if self.value.borrow().same_value(&value) {
            return false;
        }

        let child = value.observe_child();
        let old = self.value.replace(value);
        drop(old);
        *self.child.borrow_mut() = child;

        self.dep.notify();
        true
    }

    /// Update the value in place from the current one.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        let next = f(&self.peek());
        self.set(next)
    }

    pub fn dep(&self) -> &Dep {
        &self.dep
    }

    fn track(&self) {
        if !is_tracking() {
            return;
        }
        self.dep.depend();
        let child = self.child.borrow().clone();
        if let Some(child) = child {
            child.dep().depend();
            self.value.borrow().clone().depend_elements();
        }
    }
}

impl<T: SameValue + Default> Default for Field<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("value", &*self.value.borrow())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
