// ============================================================================
// spark-observe - Value Model
// Dynamic values, objects with properties, and intercepted arrays
// ============================================================================
//
// Objects and arrays are shared handles. Observation mutates them in place:
// an object's properties become reactive slots, an array's mutators start
// notifying. Code holding a handle from before observation sees the change.
// ============================================================================

pub mod array;
pub mod object;
pub mod value;

pub use array::Array;
pub use object::{Getter, Object, PropertyDescriptor, Setter};
pub use value::{Key, Value, MAX_ARRAY_LENGTH};
