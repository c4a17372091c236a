// ============================================================================
// spark-observe - Value
// The dynamic value model: primitives plus shared Object/Array handles
// ============================================================================

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use super::array::Array;
use super::object::Object;
use crate::observer::Observer;

// =============================================================================
// VALUE
// =============================================================================

/// A dynamically typed value.
///
/// `Object` and `Array` are reference handles: cloning a `Value` shares the
/// underlying data, and equality between composites is identity.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Object(Object),
    Array(Array),
}

impl Value {
    /// The change-detection comparison used by every write path.
    ///
    /// Strict equality, except that NaN is the same as NaN so that assigning
    /// NaN over NaN does not count as a change.
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Name of the value's type, as used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) => "object",
            Value::Array(_) => "array",
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Array(_))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The observer attached to a composite value
    pub fn observer(&self) -> Option<Rc<Observer>> {
        match self {
            Value::Object(obj) => obj.observer(),
            Value::Array(arr) => arr.observer(),
            _ => None,
        }
    }

    pub fn has_observer(&self) -> bool {
        self.observer().is_some()
    }

    /// Default ordering of the array `sort` operation: compares string forms,
    /// with `Undefined` sorted last.
    pub fn default_sort_cmp(a: &Value, b: &Value) -> Ordering {
        match (a.is_undefined(), b.is_undefined()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.to_string().cmp(&b.to_string()),
        }
    }
}

// =============================================================================
// DISPLAY / DEBUG
// =============================================================================

fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        write!(f, "{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => fmt_number(*n, f),
            Value::String(s) => f.write_str(s),
            Value::Object(_) => f.write_str("[object Object]"),
            Value::Array(arr) => {
                for (i, item) in arr.to_vec().iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !matches!(item, Value::Undefined | Value::Null) {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("Undefined"),
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => {
                f.write_str("Number(")?;
                fmt_number(*n, f)?;
                f.write_str(")")
            }
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Object(obj) => fmt::Debug::fmt(obj, f),
            Value::Array(arr) => fmt::Debug::fmt(arr, f),
        }
    }
}

// =============================================================================
// CONVERSIONS
// =============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

impl_from_number!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(obj)
    }
}

impl From<Array> for Value {
    fn from(arr: Array) -> Self {
        Value::Array(arr)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Array::from_vec(items))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

// =============================================================================
// KEY
// =============================================================================

/// Upper bound on array length; valid indices are strictly below it.
pub const MAX_ARRAY_LENGTH: usize = u32::MAX as usize;

/// A property name or array index, as accepted by [`set`](crate::set) and
/// [`del`](crate::del).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Index(usize),
    Name(String),
}

impl Key {
    /// The key as a valid array index: a non-negative integer below
    /// [`MAX_ARRAY_LENGTH`], either given directly or as its decimal string
    /// form.
    pub fn as_index(&self) -> Option<usize> {
        let index = match self {
            Key::Index(i) => *i,
            Key::Name(name) => name.parse::<usize>().ok()?,
        };
        (index < MAX_ARRAY_LENGTH).then_some(index)
    }

    /// The key as a property name
    pub fn as_name(&self) -> String {
        match self {
            Key::Index(i) => i.to_string(),
            Key::Name(name) => name.clone(),
        }
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Index(i)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Name(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Name(s)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "{i}"),
            Key::Name(name) => f.write_str(name),
        }
    }
}

// =============================================================================
// SERDE_JSON INTEROP
// =============================================================================

#[cfg(feature = "serde")]
mod json {
    use super::{Array, Object, Value};

    impl From<serde_json::Value> for Value {
        fn from(json: serde_json::Value) -> Self {
            match json {
                serde_json::Value::Null => Value::Null,
                serde_json::Value::Bool(b) => Value::Bool(b),
                serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
                serde_json::Value::String(s) => Value::from(s),
                serde_json::Value::Array(items) => {
                    Value::Array(items.into_iter().map(Value::from).collect::<Array>())
                }
                serde_json::Value::Object(map) => Value::Object(Object::from_iter(map)),
            }
        }
    }

    impl Value {
        /// Snapshot as JSON without registering dependencies.
        ///
        /// `Undefined` and non-finite numbers become `null`; accessor
        /// properties are read through their getters.
        pub fn to_json(&self) -> serde_json::Value {
            crate::reactivity::tracking::untrack(|| self.to_json_untracked())
        }

        fn to_json_untracked(&self) -> serde_json::Value {
            match self {
                Value::Undefined | Value::Null => serde_json::Value::Null,
                Value::Bool(b) => serde_json::Value::Bool(*b),
                Value::Number(n) => serde_json::Number::from_f64(*n)
                    .map_or(serde_json::Value::Null, serde_json::Value::Number),
                Value::String(s) => serde_json::Value::String(s.to_string()),
                Value::Array(arr) => serde_json::Value::Array(
                    arr.to_vec().iter().map(Value::to_json_untracked).collect(),
                ),
                Value::Object(obj) => serde_json::Value::Object(
                    obj.keys()
                        .into_iter()
                        .map(|key| {
                            let value = obj.get(&key).to_json_untracked();
                            (key, value)
                        })
                        .collect(),
                ),
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_value_treats_nan_as_equal() {
        assert!(Value::Number(f64::NAN).same_value(&Value::Number(f64::NAN)));
        assert!(Value::Number(0.0).same_value(&Value::Number(-0.0)));
        assert!(!Value::Number(1.0).same_value(&Value::Number(2.0)));
    }

    #[test]
    fn same_value_compares_composites_by_identity() {
        let a = Object::new();
        let b = Object::new();
        assert!(Value::from(a.clone()).same_value(&Value::from(a)));
        assert!(!Value::from(b).same_value(&Value::from(Object::new())));
    }

    #[test]
    fn same_value_distinguishes_types() {
        assert!(!Value::Null.same_value(&Value::Undefined));
        assert!(!Value::from(1).same_value(&Value::from("1")));
        assert!(Value::from("a").same_value(&Value::from(String::from("a"))));
    }

    #[test]
    fn display_mirrors_string_conversion() {
        assert_eq!(Value::from(3).to_string(), "3");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Number(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(
            Value::from(vec![Value::from(1), Value::Null, Value::from("x")]).to_string(),
            "1,,x"
        );
        assert_eq!(Value::from(Object::new()).to_string(), "[object Object]");
    }

    #[test]
    fn default_sort_puts_undefined_last() {
        let mut items = vec![Value::Undefined, Value::from(10), Value::from(9)];
        items.sort_by(Value::default_sort_cmp);
        assert_eq!(items[0].as_number(), Some(10.0));
        assert_eq!(items[1].as_number(), Some(9.0));
        assert!(items[2].is_undefined());
    }

    #[test]
    fn key_index_parsing() {
        assert_eq!(Key::from(3).as_index(), Some(3));
        assert_eq!(Key::from("4").as_index(), Some(4));
        assert_eq!(Key::from("-1").as_index(), None);
        assert_eq!(Key::from("foo").as_index(), None);
        assert_eq!(Key::from(usize::MAX).as_index(), None);
        assert_eq!(Key::from(MAX_ARRAY_LENGTH).as_index(), None);
        assert_eq!(Key::from(MAX_ARRAY_LENGTH - 1).as_index(), Some(MAX_ARRAY_LENGTH - 1));
        assert_eq!(Key::from("18446744073709551615").as_index(), None);
        assert_eq!(Key::from(2).as_name(), "2");
    }

    #[test]
    fn option_converts_to_null() {
        assert!(matches!(Value::from(None::<i32>), Value::Null));
        assert_eq!(Value::from(Some(2)).as_number(), Some(2.0));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_round_trip_preserves_shape() {
        let json = serde_json::json!({"a": 1.5, "list": [true, null, "x"]});
        let value = Value::from(json.clone());
        assert_eq!(value.to_json(), json);
    }
}
