// ============================================================================
// spark-observe - Object
// A shared, ordered property map with data and accessor properties
// ============================================================================
//
// Plain properties behave like ordinary fields. Once an object is observed,
// each of its properties is replaced by a reactive slot (see
// `observer::define`) and reads/writes go through the slot's tracking paths.
// The object never holds a borrow of its property map while user code
// (getters, setters, subscribers) runs: the property is cloned out first.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::value::Value;
use crate::core::error::{ReactiveError, Result};
use crate::observer::define::ReactiveSlot;
use crate::observer::Observer;

/// Getter of an accessor property
pub type Getter = Rc<dyn Fn() -> Value>;

/// Setter of an accessor property
pub type Setter = Rc<dyn Fn(Value)>;

// =============================================================================
// PROPERTIES
// =============================================================================

#[derive(Clone)]
pub(crate) enum PropertyKind {
    Data { value: Value, writable: bool },
    Accessor { get: Option<Getter>, set: Option<Setter> },
    Reactive(Rc<ReactiveSlot>),
}

#[derive(Clone)]
pub(crate) struct Property {
    pub(crate) kind: PropertyKind,
    pub(crate) enumerable: bool,
    pub(crate) configurable: bool,
}

/// Describes a property for [`Object::define_property`].
///
/// ```
/// use spark_observe::{Object, PropertyDescriptor, Value};
///
/// let obj = Object::new();
/// obj.define_property("answer", PropertyDescriptor::getter(|| Value::from(42)))
///     .unwrap();
/// assert_eq!(obj.get("answer").as_number(), Some(42.0));
/// ```
#[derive(Clone)]
pub struct PropertyDescriptor {
    kind: DescriptorKind,
    enumerable: bool,
    configurable: bool,
}

#[derive(Clone)]
enum DescriptorKind {
    Data { value: Value, writable: bool },
    Accessor { get: Option<Getter>, set: Option<Setter> },
}

impl PropertyDescriptor {
    /// A writable, enumerable, configurable data property
    pub fn data(value: impl Into<Value>) -> Self {
        Self {
            kind: DescriptorKind::Data {
                value: value.into(),
                writable: true,
            },
            enumerable: true,
            configurable: true,
        }
    }

    /// An accessor property with both halves
    pub fn accessor(get: impl Fn() -> Value + 'static, set: impl Fn(Value) + 'static) -> Self {
        Self {
            kind: DescriptorKind::Accessor {
                get: Some(Rc::new(get)),
                set: Some(Rc::new(set)),
            },
            enumerable: true,
            configurable: true,
        }
    }

    /// A read-only accessor: writes are silently ignored
    pub fn getter(get: impl Fn() -> Value + 'static) -> Self {
        Self {
            kind: DescriptorKind::Accessor {
                get: Some(Rc::new(get)),
                set: None,
            },
            enumerable: true,
            configurable: true,
        }
    }

    pub fn enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = enumerable;
        self
    }

    pub fn configurable(mut self, configurable: bool) -> Self {
        self.configurable = configurable;
        self
    }

    /// Only meaningful for data properties
    pub fn writable(mut self, writable: bool) -> Self {
        if let DescriptorKind::Data { writable: w, .. } = &mut self.kind {
            *w = writable;
        }
        self
    }

    fn into_property(self) -> Property {
        let kind = match self.kind {
            DescriptorKind::Data { value, writable } => PropertyKind::Data { value, writable },
            DescriptorKind::Accessor { get, set } => PropertyKind::Accessor { get, set },
        };
        Property {
            kind,
            enumerable: self.enumerable,
            configurable: self.configurable,
        }
    }
}

// =============================================================================
// OBJECT
// =============================================================================

/// A plain data object: an insertion-ordered map of named properties.
///
/// `Object` is a handle; clones refer to the same object. Observing an object
/// attaches an [`Observer`] to it in place.
#[derive(Clone)]
pub struct Object {
    inner: Rc<ObjectInner>,
}

struct ObjectInner {
    props: RefCell<IndexMap<String, Property>>,
    /// The hidden observer marker. At most one observer is ever attached.
    observer: RefCell<Option<Rc<Observer>>>,
    extensible: Cell<bool>,
    component_instance: bool,
}

impl Object {
    pub fn new() -> Self {
        Self::with_kind(false)
    }

    /// An object standing for a component instance. Such objects are never
    /// observed, and `set`/`del` refuse to add or remove their properties.
    pub fn component_instance() -> Self {
        Self::with_kind(true)
    }

    fn with_kind(component_instance: bool) -> Self {
        Self {
            inner: Rc::new(ObjectInner {
                props: RefCell::new(IndexMap::new()),
                observer: RefCell::new(None),
                extensible: Cell::new(true),
                component_instance,
            }),
        }
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Read a property. Reactive properties register the active subscriber.
    /// Missing properties read as `Undefined`.
    pub fn get(&self, key: &str) -> Value {
        let kind = match self.inner.props.borrow().get(key) {
            Some(prop) => prop.kind.clone(),
            None => return Value::Undefined,
        };

        match kind {
            PropertyKind::Data { value, .. } => value,
            PropertyKind::Accessor { get, .. } => get.map_or(Value::Undefined, |get| get()),
            PropertyKind::Reactive(slot) => slot.get(),
        }
    }

    pub fn has_own(&self, key: &str) -> bool {
        self.inner.props.borrow().contains_key(key)
    }

    /// Own enumerable keys in insertion order
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .props
            .borrow()
            .iter()
            .filter(|(_, prop)| prop.enumerable)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of own properties, enumerable or not
    pub fn len(&self) -> usize {
        self.inner.props.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    /// Assign a property.
    ///
    /// Existing properties take the write through their setter (reactive
    /// properties notify); read-only properties ignore it. A missing key is
    /// added as a plain, untracked data property unless the object is not
    /// extensible. Use [`set`](crate::set) to add a reactive property.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        let kind = self
            .inner
            .props
            .borrow()
            .get(key)
            .map(|prop| prop.kind.clone());

        match kind {
            Some(PropertyKind::Data { writable: true, .. }) => {
                let previous = {
                    let mut props = self.inner.props.borrow_mut();
                    match props.get_mut(key).map(|prop| &mut prop.kind) {
                        Some(PropertyKind::Data { value: slot, .. }) => {
                            Some(std::mem::replace(slot, value))
                        }
                        _ => None,
                    }
                };
                drop(previous);
            }
            Some(PropertyKind::Data { writable: false, .. }) => {}
            Some(PropertyKind::Accessor { set, .. }) => {
                if let Some(set) = set {
                    set(value);
                }
            }
            Some(PropertyKind::Reactive(slot)) => slot.set(value),
            None => {
                if self.is_extensible() {
                    self.inner.props.borrow_mut().insert(
                        key.to_string(),
                        PropertyDescriptor::data(value).into_property(),
                    );
                }
            }
        }
    }

    /// Remove an own property. Returns false if the property is
    /// non-configurable; removing a missing key succeeds.
    pub fn delete(&self, key: &str) -> bool {
        let removed = {
            let mut props = self.inner.props.borrow_mut();
            match props.get(key) {
                None => return true,
                Some(prop) if !prop.configurable => return false,
                Some(_) => props.shift_remove(key),
            }
        };
        drop(removed);
        true
    }

    /// Define or redefine a property.
    ///
    /// Fails if the existing property is non-configurable, or the key is new
    /// and the object is not extensible.
    pub fn define_property(&self, key: &str, descriptor: PropertyDescriptor) -> Result<()> {
        match self.inner.props.borrow().get(key) {
            Some(prop) if !prop.configurable => {
                return Err(ReactiveError::NotConfigurable {
                    key: key.to_string(),
                })
            }
            None if !self.is_extensible() => {
                return Err(ReactiveError::NotExtensible {
                    key: key.to_string(),
                })
            }
            _ => {}
        }
        self.install(key, descriptor.into_property());
        Ok(())
    }

    pub(crate) fn own_property(&self, key: &str) -> Option<Property> {
        self.inner.props.borrow().get(key).cloned()
    }

    /// Insert or replace a property, keeping its position if it existed
    pub(crate) fn install(&self, key: &str, property: Property) {
        let previous = self
            .inner
            .props
            .borrow_mut()
            .insert(key.to_string(), property);
        drop(previous);
    }

    // =========================================================================
    // EXTENSIBILITY
    // =========================================================================

    pub fn is_extensible(&self) -> bool {
        self.inner.extensible.get()
    }

    /// Forbid adding new properties. Non-extensible objects are never observed.
    pub fn prevent_extensions(&self) {
        self.inner.extensible.set(false);
    }

    /// Prevent extensions and make every property non-configurable; data
    /// properties also become read-only.
    pub fn freeze(&self) {
        self.prevent_extensions();
        for prop in self.inner.props.borrow_mut().values_mut() {
            prop.configurable = false;
            if let PropertyKind::Data { writable, .. } = &mut prop.kind {
                *writable = false;
            }
        }
    }

    pub fn is_component_instance(&self) -> bool {
        self.inner.component_instance
    }

    // =========================================================================
    // OBSERVATION
    // =========================================================================

    /// The attached observer, if the object has been observed
    pub fn observer(&self) -> Option<Rc<Observer>> {
        self.inner.observer.borrow().clone()
    }

    pub(crate) fn attach_observer(&self, observer: Rc<Observer>) {
        *self.inner.observer.borrow_mut() = Some(observer);
    }

    /// Tracked read of the object as a whole: registers the active subscriber
    /// with the observer's Dep, so it hears about added and deleted keys.
    pub fn depend(&self) {
        if let Some(ob) = self.observer() {
            ob.dep().depend();
        }
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let obj = Object::new();
        {
            let mut props = obj.inner.props.borrow_mut();
            for (key, value) in iter {
                props.insert(key.into(), PropertyDescriptor::data(value).into_property());
            }
        }
        obj
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let props = self.inner.props.borrow();
        let mut map = f.debug_map();
        for (key, prop) in props.iter() {
            match &prop.kind {
                PropertyKind::Data { value, .. } => map.entry(key, value),
                PropertyKind::Accessor { .. } => map.entry(key, &format_args!("<accessor>")),
                PropertyKind::Reactive(slot) => match slot.peek() {
                    Some(value) => map.entry(key, &value),
                    None => map.entry(key, &format_args!("<accessor>")),
                },
            };
        }
        map.finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
