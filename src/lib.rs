// ============================================================================
// spark-observe - Reactive Data Observation for Rust
// ============================================================================
//
// Plain objects and arrays are converted in place into reactive data: reads
// inside a tracked phase register the running subscriber, writes notify the
// subscribers of exactly the property that changed. Nested values, arrays and
// properties added later through `set` are covered too.
//
// Single-threaded by construction: values are `Rc` handles and the registry
// of the running subscriber is thread-local.
// ============================================================================

pub mod collections;
pub mod core;
mod macros;
pub mod observer;
pub mod primitives;
pub mod reactivity;

// Re-export core items at crate root for ergonomic access
pub use crate::core::config::{config, set_config, with_config, Config, WarnHandler};
pub use crate::core::context::{is_tracking, should_observe, with_context, ReactiveContext};
pub use crate::core::error::{NotObservable, ReactiveError, Result};
pub use crate::core::types::{DepId, Subscriber, SubscriberId};

// Value model
pub use collections::{
    Array, Getter, Key, Object, PropertyDescriptor, Setter, Value, MAX_ARRAY_LENGTH,
};

// Observation and the root API
pub use observer::{
    define_reactive, del, depend_array, observe, pause_observing, property_dep, set,
    toggle_observing, CustomSetter, Observer, ObservingGuard,
};

// Dependency tracking
pub use reactivity::dep::Dep;
pub use reactivity::tracking::{
    current_target, pop_target, push_target, track, untrack, untracked, with_tracking,
    TrackingGuard,
};

// Subscribers and typed fields
pub use primitives::{
    subscriber, watcher, Field, FnSubscriber, SameValue, Watcher, MAX_RERUNS,
};

// =============================================================================
// TESTS
// =============================================================================
