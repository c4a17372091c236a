// ============================================================================
// spark-observe - Reactive Context
// Thread-local state: the active-subscriber stack, the observing switch,
// id allocation and configuration
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::config::Config;
use super::types::{DepId, Subscriber, SubscriberId};

// =============================================================================
// REACTIVE CONTEXT
// =============================================================================

/// Thread-local reactive context holding all shared state for the observer.
///
/// Nothing here is ever borrowed across a call into user code: accessors
/// clone what they need out of the cells and release the borrow first.
pub struct ReactiveContext {
    // =========================================================================
    // ACTIVE SUBSCRIBER REGISTRY
    // =========================================================================
    /// Stack of tracked read phases. The top entry is the active subscriber;
    /// `None` entries mark explicitly untracked regions.
    pub target_stack: RefCell<Vec<Option<Rc<dyn Subscriber>>>>,

    // =========================================================================
    // OBSERVATION
    // =========================================================================
    /// When false, `observe` refuses to attach new observers
    pub should_observe: Cell<bool>,

    // =========================================================================
    // ID ALLOCATION
    // =========================================================================
    pub next_dep_id: Cell<DepId>,

    pub next_subscriber_id: Cell<SubscriberId>,

    // =========================================================================
    // CONFIGURATION
    // =========================================================================
    pub config: RefCell<Config>,
}

impl ReactiveContext {
    /// Create a new reactive context with default values
    pub fn new() -> Self {
        Self {
            target_stack: RefCell::new(Vec::new()),
            should_observe: Cell::new(true),
            next_dep_id: Cell::new(0),
            next_subscriber_id: Cell::new(0),
            config: RefCell::new(Config::default()),
        }
    }

    // =========================================================================
    // ACTIVE SUBSCRIBER REGISTRY
    // =========================================================================

    /// Push a tracked read phase. Returns the new stack depth.
    pub fn push_target(&self, target: Option<Rc<dyn Subscriber>>) -> usize {
        let mut stack = self.target_stack.borrow_mut();
        stack.push(target);
        stack.len()
    }

    /// Pop the innermost phase, restoring the previous occupant.
    pub fn pop_target(&self) -> Option<Option<Rc<dyn Subscriber>>> {
        self.target_stack.borrow_mut().pop()
    }

    /// The subscriber currently doing a tracked read, if any
    pub fn current_target(&self) -> Option<Rc<dyn Subscriber>> {
        self.target_stack.borrow().last().cloned().flatten()
    }

    pub fn has_current_target(&self) -> bool {
        matches!(self.target_stack.borrow().last(), Some(Some(_)))
    }

    pub fn target_depth(&self) -> usize {
        self.target_stack.borrow().len()
    }

    // =========================================================================
    // OBSERVATION
    // =========================================================================

    /// Set the observing switch, returning the previous value
    pub fn set_should_observe(&self, value: bool) -> bool {
        self.should_observe.replace(value)
    }

    pub fn should_observe(&self) -> bool {
        self.should_observe.get()
    }

    // =========================================================================
    // ID ALLOCATION
    // =========================================================================

    pub fn allocate_dep_id(&self) -> DepId {
        let id = self.next_dep_id.get();
        self.next_dep_id.set(id + 1);
        id
    }

    pub fn allocate_subscriber_id(&self) -> SubscriberId {
        let id = self.next_subscriber_id.get();
        self.next_subscriber_id.set(id + 1);
        id
    }

    // =========================================================================
    // CONFIGURATION
    // =========================================================================

    /// Snapshot of the current configuration
    pub fn config(&self) -> Config {
        self.config.borrow().clone()
    }

    /// Replace the configuration, returning the previous one
    pub fn replace_config(&self, config: Config) -> Config {
        self.config.replace(config)
    }

    pub fn is_production(&self) -> bool {
        self.config.borrow().production
    }

    pub fn is_server_rendering(&self) -> bool {
        self.config.borrow().server_rendering
    }
}

impl Default for ReactiveContext {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// THREAD-LOCAL ACCESS
// =============================================================================

thread_local! {
    /// The thread-local reactive context
    static CONTEXT: ReactiveContext = ReactiveContext::new();
}

/// Access the thread-local reactive context.
pub fn with_context<R>(f: impl FnOnce(&ReactiveContext) -> R) -> R {
    CONTEXT.with(f)
}

// =============================================================================
// CONVENIENCE FUNCTIONS
// =============================================================================

/// Check if a subscriber is currently doing a tracked read
pub fn is_tracking() -> bool {
    with_context(|ctx| ctx.has_current_target())
}

/// Check if newly encountered values are currently auto-observed
pub fn should_observe() -> bool {
    with_context(|ctx| ctx.should_observe())
}

// =============================================================================
// TESTS
// =============================================================================
