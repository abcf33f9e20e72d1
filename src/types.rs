//! Core identifiers and value types shared by the router components.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Page identifier.
///
/// Issued by [`crate::identity::PageIdAllocator`]; `PageId::NONE` is the
/// reserved "no page" sentinel and is never handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(u64);

impl PageId {
    /// Sentinel meaning "whatever page is currently front-most".
    pub const NONE: PageId = PageId(0);

    pub const fn from_raw(raw: u64) -> Self {
        PageId(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page-{}", self.0)
    }
}

/// Opaque arena key of an execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextKey(u64);

impl ContextKey {
    pub const fn from_raw(raw: u64) -> Self {
        ContextKey(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

/// Correlates an outbound command with its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(u64);

impl CorrelationId {
    pub const fn from_raw(raw: u64) -> Self {
        CorrelationId(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Arguments payload attached to a command (string keys to JSON values).
pub type Arguments = serde_json::Map<String, serde_json::Value>;

/// Result carried by a reply from an execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplyValue {
    Bool(bool),
    Int(i64),
}

impl ReplyValue {
    pub fn shape(&self) -> ReplyShape {
        match self {
            ReplyValue::Bool(_) => ReplyShape::Bool,
            ReplyValue::Int(_) => ReplyShape::Int,
        }
    }
}

/// Result shape a pending call expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyShape {
    Bool,
    Int,
}

impl fmt::Display for ReplyShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplyShape::Bool => f.write_str("bool"),
            ReplyShape::Int => f.write_str("int"),
        }
    }
}

/// Conversion from a reply into the completion's typed value.
pub trait FromReply: Sized + Send + 'static {
    const SHAPE: ReplyShape;

    fn from_reply(value: ReplyValue) -> Option<Self>;
}

impl FromReply for bool {
    const SHAPE: ReplyShape = ReplyShape::Bool;

    fn from_reply(value: ReplyValue) -> Option<Self> {
        match value {
            ReplyValue::Bool(b) => Some(b),
            ReplyValue::Int(_) => None,
        }
    }
}

impl FromReply for i64 {
    const SHAPE: ReplyShape = ReplyShape::Int;

    fn from_reply(value: ReplyValue) -> Option<Self> {
        match value {
            ReplyValue::Int(n) => Some(n),
            ReplyValue::Bool(_) => None,
        }
    }
}
