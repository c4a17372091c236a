// ============================================================================
// spark-observe - Observer Module
// Converting plain data into reactive data
// ============================================================================

pub mod api;
pub mod define;
pub mod observe;

pub use api::{del, set};
pub use define::{define_reactive, depend_array, property_dep, CustomSetter};
pub use observe::{observe, pause_observing, toggle_observing, Observer, ObservingGuard};
