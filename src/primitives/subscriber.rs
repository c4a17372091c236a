// ============================================================================
// spark-observe - Closure Subscriber
// ============================================================================

use std::fmt;
use std::rc::Rc;

use crate::core::context::with_context;
use crate::core::types::{Subscriber, SubscriberId};

/// A subscriber that calls a closure on every notification.
///
/// It keeps every subscription it ever made; use [`Watcher`](crate::Watcher)
/// for a subscriber that re-tracks and drops stale dependencies.
pub struct FnSubscriber {
    id: SubscriberId,
    on_update: Box<dyn Fn()>,
}

impl FnSubscriber {
    pub fn new(on_update: impl Fn() + 'static) -> Self {
        Self {
            id: with_context(|ctx| ctx.allocate_subscriber_id()),
            on_update: Box::new(on_update),
        }
    }
}

impl Subscriber for FnSubscriber {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn update(&self) {
        (self.on_update)();
    }
}

impl fmt::Debug for FnSubscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSubscriber").field("id", &self.id).finish()
    }
}

/// Create a closure subscriber, ready to pass to [`track`](crate::track).
pub fn subscriber(on_update: impl Fn() + 'static) -> Rc<FnSubscriber> {
    Rc::new(FnSubscriber::new(on_update))
}
