// ============================================================================
// spark-observe - Reactivity Module
// Dependency sets and the active-subscriber registry
// ============================================================================

pub mod dep;
pub mod tracking;

pub use dep::Dep;
pub use tracking::{
    current_target, pop_target, push_target, track, untrack, untracked, with_tracking,
    TrackingGuard,
};
