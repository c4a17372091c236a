// ============================================================================
// spark-observe - Core Module
// Subscriber identity, thread-local context, configuration and errors
// ============================================================================

pub mod config;
pub mod context;
pub mod error;
pub mod types;

// Re-export commonly used items
pub use config::{config, set_config, with_config, Config, WarnHandler};
pub use context::{is_tracking, should_observe, with_context, ReactiveContext};
pub use error::{NotObservable, ReactiveError, Result};
pub use types::{DepId, Subscriber, SubscriberId};
