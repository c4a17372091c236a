// ============================================================================
// spark-observe - Errors
// ============================================================================

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReactiveError>;

/// Why [`observe`](crate::observe) declined to attach an observer.
///
/// None of these are failures of the caller's larger operation; they simply
/// mean the value stays plain and untracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NotObservable {
    #[error("not observable: primitive value")]
    Primitive,

    #[error("not observable: value is not extensible")]
    NotExtensible,

    #[error("not observable: component instance")]
    ComponentInstance,

    #[error("not observable: observing is toggled off")]
    ObservingDisabled,

    #[error("not observable: server rendering")]
    ServerRendering,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    #[error("cannot operate on {kind} target")]
    InvalidTarget { kind: &'static str },

    #[error("invalid key for {kind} target: {key}")]
    InvalidKey { kind: &'static str, key: String },

    #[error("cannot redefine non-configurable property: {key}")]
    NotConfigurable { key: String },

    #[error("cannot add property {key}: object is not extensible")]
    NotExtensible { key: String },

    #[error("cannot grow array to hold index {index}: allocation failed")]
    AllocationFailed { index: usize },
}

impl ReactiveError {
    #[must_use]
    pub fn invalid_key(kind: &'static str, key: impl Into<String>) -> Self {
        Self::InvalidKey {
            kind,
            key: key.into(),
        }
    }
}
