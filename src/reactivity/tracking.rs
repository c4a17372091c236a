// ============================================================================
// spark-observe - Dependency Tracking
// Scoped push/pop of the active subscriber
// ============================================================================
//
// The registry is a stack so that one subscriber's computation can trigger
// another's: the inner phase pushes, the outer occupant is restored on pop.
// Guards pop in Drop, so the stack is restored on every exit path including
// unwinding out of a panicking computation.
// ============================================================================

use std::marker::PhantomData;
use std::rc::Rc;

use crate::core::context::with_context;
use crate::core::types::Subscriber;

// =============================================================================
// RAW PUSH / POP
// =============================================================================

/// Begin a tracked read phase for `target` (`None` = untracked region).
///
/// Must be balanced by [`pop_target`]. Prefer [`track`] / [`untracked`],
/// which pop automatically.
pub fn push_target(target: Option<Rc<dyn Subscriber>>) {
    with_context(|ctx| ctx.push_target(target));
}

/// End the innermost tracked read phase, restoring the previous occupant.
pub fn pop_target() {
    let popped = with_context(|ctx| ctx.pop_target());
    debug_assert!(popped.is_some(), "pop_target without matching push_target");
}

/// The subscriber currently doing a tracked read, if any
pub fn current_target() -> Option<Rc<dyn Subscriber>> {
    with_context(|ctx| ctx.current_target())
}

// =============================================================================
// SCOPED GUARDS
// =============================================================================

/// Pops the tracked read phase it was created for when dropped.
#[must_use = "the tracked phase ends as soon as the guard is dropped"]
pub struct TrackingGuard {
    depth: usize,
    // The registry is thread-local; the guard must not leave the thread.
    _not_send: PhantomData<Rc<()>>,
}

impl TrackingGuard {
    fn push(target: Option<Rc<dyn Subscriber>>) -> Self {
        let depth = with_context(|ctx| ctx.push_target(target));
        Self {
            depth,
            _not_send: PhantomData,
        }
    }
}

impl Drop for TrackingGuard {
    fn drop(&mut self) {
        with_context(|ctx| {
            debug_assert_eq!(
                ctx.target_depth(),
                self.depth,
                "tracking guards dropped out of order"
            );
            ctx.pop_target();
        });
    }
}

/// Make `sub` the active subscriber until the guard is dropped.
///
/// # Example
///
/// ```
/// use spark_observe::{observe, subscriber, track, Object, Value};
///
/// let data = Object::from_iter([("a", Value::from(1))]);
/// observe(&Value::from(data.clone()), false).unwrap();
///
/// let render = subscriber(|| {});
/// {
///     let _tracking = track(render.clone());
///     data.get("a");
/// }
/// ```
pub fn track(sub: Rc<dyn Subscriber>) -> TrackingGuard {
    TrackingGuard::push(Some(sub))
}

/// Suspend tracking until the guard is dropped. Reads inside register nothing.
pub fn untracked() -> TrackingGuard {
    TrackingGuard::push(None)
}

/// Run `f` as a tracked read phase of `sub`.
pub fn with_tracking<R>(sub: Rc<dyn Subscriber>, f: impl FnOnce() -> R) -> R {
    let _guard = track(sub);
    f()
}

/// Run `f` without registering any dependencies.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let _guard = untracked();
    f()
}

// =============================================================================
// TESTS
// =============================================================================
