//! Error types for the navigation router.

use crate::types::{ContextKey, PageId, ReplyShape};
use thiserror::Error;

/// Route stack errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("Duplicate page id: {0}")]
    DuplicatePageId(PageId),

    #[error("Page not found in stack: {0}")]
    NotFound(PageId),

    #[error("No route stack for context {0}")]
    UnknownContext(ContextKey),
}

/// Router errors surfaced to the host
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    #[error("The \"no page\" sentinel cannot be used here")]
    InvalidPageId,

    #[error("No such page: {0}")]
    NoSuchPage(PageId),

    #[error("Duplicate page id: {0}")]
    DuplicatePageId(PageId),

    #[error("Context {0} is gone")]
    ContextGone(ContextKey),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Reply shape mismatch: expected {expected}, got {actual}")]
    ReplyShapeMismatch {
        expected: ReplyShape,
        actual: ReplyShape,
    },

    #[error("Engine launch failed: {0}")]
    Launch(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<RouteError> for RouterError {
    fn from(err: RouteError) -> Self {
        match err {
            RouteError::DuplicatePageId(id) => RouterError::DuplicatePageId(id),
            RouteError::NotFound(id) => RouterError::NoSuchPage(id),
            RouteError::UnknownContext(key) => RouterError::ContextGone(key),
        }
    }
}

impl From<config::ConfigError> for RouterError {
    fn from(err: config::ConfigError) -> Self {
        RouterError::Config(err.to_string())
    }
}

impl RouterError {
    /// Recoverable errors are delivered through completions; the rest indicate
    /// broken host wiring.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, RouterError::InvariantViolation(_))
    }
}
