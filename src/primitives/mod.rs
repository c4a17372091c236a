// ============================================================================
// spark-observe - Primitives Module
// Ready-made subscribers and typed reactive fields
// ============================================================================

pub mod field;
pub mod subscriber;
pub mod watcher;

pub use field::{Field, SameValue};
pub use subscriber::{subscriber, FnSubscriber};
pub use watcher::{watcher, Watcher, MAX_RERUNS};
