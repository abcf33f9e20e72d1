//! Launcher port: how the router obtains and releases execution contexts.

use crate::channel::{ControlRequest, InboundMessage};
use crate::error::RouterError;
use crate::types::ContextKey;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// What the router asks the launcher to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSpec {
    pub key: ContextKey,
    pub entry_point: String,
    pub is_main: bool,
}

/// Both halves of an attached context's control channel.
///
/// The launcher keeps the opposite ends. Dropping its inbound sender is the
/// detach signal.
#[derive(Debug)]
pub struct EngineLink {
    pub outbound: mpsc::UnboundedSender<ControlRequest>,
    pub inbound: mpsc::UnboundedReceiver<InboundMessage>,
}

impl EngineLink {
    /// Create a link plus the engine-side ends.
    pub fn pair() -> (
        Self,
        mpsc::UnboundedReceiver<ControlRequest>,
        mpsc::UnboundedSender<InboundMessage>,
    ) {
        let (outbound, requests) = mpsc::unbounded_channel();
        let (replies, inbound) = mpsc::unbounded_channel();
        (Self { outbound, inbound }, requests, replies)
    }
}

#[async_trait]
pub trait EngineLauncher: Send + Sync {
    /// Start (or attach to) the context described by `spec`.
    async fn attach(&self, spec: &ContextSpec) -> Result<EngineLink, RouterError>;

    /// Release the context. Called once, after its pending calls are failed.
    ///
    /// Runs without the router lock held, so it may call back into the router.
    fn detach(&self, key: ContextKey);
}
