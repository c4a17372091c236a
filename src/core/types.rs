// ============================================================================
// spark-observe - Type Definitions
// The subscriber abstraction consumed from the render/compute layer
// ============================================================================

use std::any::Any;

use crate::reactivity::dep::Dep;

/// Stable identity of a subscriber. Allocated in creation order.
pub type SubscriberId = u64;

/// Stable identity of a dependency set.
pub type DepId = u64;

// =============================================================================
// SUBSCRIBER
// =============================================================================
//
// The core never decides when tracking starts or stops. A consumer pushes a
// subscriber onto the registry, performs reads, pops it again. Every read that
// goes through an intercepted property asks the active subscriber whether it
// wants to be registered with that property's Dep.
// =============================================================================

/// Anything that can be re-invoked to redo its tracked computation.
///
/// Subscribers are held weakly by the [`Dep`]s they register with, so the
/// consumer owns them and dropping the last `Rc` silently unsubscribes.
pub trait Subscriber: Any {
    /// Identity used for set semantics inside a [`Dep`] and notify ordering.
    fn id(&self) -> SubscriberId;

    /// Re-run the computation. Called synchronously from [`Dep::notify`].
    fn update(&self);

    /// Called when `dep` is read while this subscriber is active.
    ///
    /// Returning `false` skips registration. The default always registers;
    /// the `Dep` itself dedupes by [`id`](Subscriber::id).
    fn record_dep(&self, dep: &Dep) -> bool {
        let _ = dep;
        true
    }
}
