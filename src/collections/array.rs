// ============================================================================
// spark-observe - Array
// A shared sequence whose structural mutations are intercepted
// ============================================================================
//
// Element access by index cannot be intercepted, so arrays are tracked as a
// whole: the seven structure-mutating operations notify the observer's Dep
// and observe whatever they insert. A subscriber that read the array through
// a reactive property (or via `depend`) hears about every such change.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::TryReserveError;
use std::fmt;
use std::rc::Rc;

use super::value::Value;
use crate::observer::define::depend_array;
use crate::observer::Observer;

// =============================================================================
// ARRAY
// =============================================================================

/// An observable sequence of values.
///
/// `Array` is a handle; clones refer to the same sequence. The only way to
/// change its shape is through the intercepted mutators below, which keep the
/// return values of their plain `Vec` counterparts.
///
/// ```
/// use spark_observe::{observe, Array, Object, Value};
///
/// let list = Array::from_vec(vec![Value::from(1), Value::from(2)]);
/// observe(&Value::from(list.clone()), false).unwrap();
///
/// let item = Object::from_iter([("done", false)]);
/// assert_eq!(list.push(item.clone()), 3);
/// assert!(item.observer().is_some());
/// ```
#[derive(Clone)]
pub struct Array {
    inner: Rc<ArrayInner>,
}

struct ArrayInner {
    items: RefCell<Vec<Value>>,
    /// The hidden observer marker. At most one observer is ever attached.
    observer: RefCell<Option<Rc<Observer>>>,
    extensible: Cell<bool>,
}

impl Array {
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    pub fn from_vec(items: Vec<Value>) -> Self {
        Self {
            inner: Rc::new(ArrayInner {
                items: RefCell::new(items),
                observer: RefCell::new(None),
                extensible: Cell::new(true),
            }),
        }
    }

    // =========================================================================
    // READ (untracked, like indexed access)
    // =========================================================================

    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index`, or `Undefined` past the end
    pub fn get(&self, index: usize) -> Value {
        self.inner
            .items
            .borrow()
            .get(index)
            .cloned()
            .unwrap_or_default()
    }

    /// Snapshot of the elements
    pub fn to_vec(&self) -> Vec<Value> {
        self.inner.items.borrow().clone()
    }

    // =========================================================================
    // INTERCEPTED MUTATORS
    // =========================================================================

    /// Append to the end. Returns the new length.
    pub fn push(&self, value: impl Into<Value>) -> usize {
        self.push_many([value.into()])
    }

    /// Append several values. Returns the new length.
    pub fn push_many(&self, values: impl IntoIterator<Item = Value>) -> usize {
        let inserted: Vec<Value> = values.into_iter().collect();
        let len = {
            let mut items = self.inner.items.borrow_mut();
            items.extend(inserted.iter().cloned());
            items.len()
        };
        self.intercept(&inserted);
        len
    }

    /// Remove the last element
    pub fn pop(&self) -> Option<Value> {
        let removed = self.inner.items.borrow_mut().pop();
        self.intercept(&[]);
        removed
    }

    /// Remove the first element
    pub fn shift(&self) -> Option<Value> {
        let removed = {
            let mut items = self.inner.items.borrow_mut();
            if items.is_empty() {
                None
            } else {
                Some(items.remove(0))
            }
        };
        self.intercept(&[]);
        removed
    }

    /// Insert at the start. Returns the new length.
    pub fn unshift(&self, value: impl Into<Value>) -> usize {
        self.unshift_many([value.into()])
    }

    /// Insert several values at the start, keeping their order. Returns the
    /// new length.
    pub fn unshift_many(&self, values: impl IntoIterator<Item = Value>) -> usize {
        let inserted: Vec<Value> = values.into_iter().collect();
        let len = {
            let mut items = self.inner.items.borrow_mut();
            items.splice(0..0, inserted.iter().cloned());
            items.len()
        };
        self.intercept(&inserted);
        len
    }

    /// Remove `delete_count` elements at `start` and insert `items` in their
    /// place. `start` and `delete_count` are clamped to the array bounds.
    /// Returns the removed elements.
    pub fn splice(
        &self,
        start: usize,
        delete_count: usize,
        items: impl IntoIterator<Item = Value>,
    ) -> Vec<Value> {
        let inserted: Vec<Value> = items.into_iter().collect();
        let removed: Vec<Value> = {
            let mut current = self.inner.items.borrow_mut();
            let start = start.min(current.len());
            let end = start + delete_count.min(current.len() - start);
            current.splice(start..end, inserted.iter().cloned()).collect()
        };
        self.intercept(&inserted);
        removed
    }

    /// Sort in place by the default ordering (string forms, `Undefined`
    /// last). Returns the array itself.
    pub fn sort(&self) -> Array {
        self.sort_by(Value::default_sort_cmp)
    }

    /// Sort in place with a comparator. Returns the array itself.
    ///
    /// A snapshot is sorted and swapped in afterwards, so the comparator may
    /// read this array freely. If the comparator panics the array is left as
    /// it was.
    pub fn sort_by(&self, mut compare: impl FnMut(&Value, &Value) -> Ordering) -> Array {
        let mut items = self.to_vec();
        items.sort_by(&mut compare);
        *self.inner.items.borrow_mut() = items;
        self.intercept(&[]);
        self.clone()
    }

    /// Reverse in place. Returns the array itself.
    pub fn reverse(&self) -> Array {
        self.inner.items.borrow_mut().reverse();
        self.intercept(&[]);
        self.clone()
    }

    /// Observe newly inserted elements and announce the structural change.
    /// No-op for unobserved arrays.
    fn intercept(&self, inserted: &[Value]) {
        let Some(ob) = self.observer() else {
            return;
        };
        ob.observe_array(inserted);
        ob.dep().notify();
    }

    /// Grow to at least `len` elements, padding with `Undefined`. Not a
    /// structural notification on its own.
    ///
    /// Fails without touching the array if the storage cannot be allocated.
    pub(crate) fn ensure_len(&self, len: usize) -> Result<(), TryReserveError> {
        let mut items = self.inner.items.borrow_mut();
        if items.len() < len {
            let additional = len - items.len();
            items.try_reserve_exact(additional)?;
            items.resize(len, Value::Undefined);
        }
        Ok(())
    }

    // =========================================================================
    // EXTENSIBILITY
    // =========================================================================

    pub fn is_extensible(&self) -> bool {
        self.inner.extensible.get()
    }

    /// Mark the array as non-extensible. Non-extensible arrays are never
    /// observed.
    pub fn prevent_extensions(&self) {
        self.inner.extensible.set(false);
    }

    // =========================================================================
    // OBSERVATION
    // =========================================================================

    /// The attached observer, if the array has been observed
    pub fn observer(&self) -> Option<Rc<Observer>> {
        self.inner.observer.borrow().clone()
    }

    pub(crate) fn attach_observer(&self, observer: Rc<Observer>) {
        *self.inner.observer.borrow_mut() = Some(observer);
    }

    /// Tracked read of the whole array, including every observable element.
    ///
    /// This is what a reactive property does when its value is an array; use
    /// it directly when the array is root data with no enclosing property.
    pub fn depend(&self) {
        if let Some(ob) = self.observer() {
            ob.dep().depend();
        }
        depend_array(self);
    }

    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Array {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.items.borrow().iter()).finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
