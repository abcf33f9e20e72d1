//! Context handle and its lifecycle state machine.
//!
//! The context's route stack lives in [`crate::route::RouteTable`] under the
//! same key.

use crate::channel::ControlRequest;
use crate::error::RouterError;
use crate::types::ContextKey;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Lifecycle: Creating -> Ready -> Destroying -> Destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextState {
    Creating,
    Ready,
    Destroying,
    Destroyed,
}

#[derive(Debug)]
pub struct ContextHandle {
    key: ContextKey,
    entry_point: String,
    is_main: bool,
    state: ContextState,
    outbound: Option<mpsc::UnboundedSender<ControlRequest>>,
}

impl ContextHandle {
    /// New handle in `Creating`; it has no control channel until attached.
    pub fn new(key: ContextKey, entry_point: impl Into<String>, is_main: bool) -> Self {
        Self {
            key,
            entry_point: entry_point.into(),
            is_main,
            state: ContextState::Creating,
            outbound: None,
        }
    }

    pub fn key(&self) -> ContextKey {
        self.key
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn is_main(&self) -> bool {
        self.is_main
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ContextState::Ready
    }

    /// Creating -> Ready once the control channel is attached.
    pub fn attach(&mut self, outbound: mpsc::UnboundedSender<ControlRequest>) -> bool {
        if self.state != ContextState::Creating {
            return false;
        }
        self.outbound = Some(outbound);
        self.state = ContextState::Ready;
        true
    }

    /// Ready (or Creating, when an attach fails) -> Destroying.
    ///
    /// The main context never leaves Ready.
    pub fn begin_teardown(&mut self) -> bool {
        if self.is_main {
            return false;
        }
        match self.state {
            ContextState::Creating | ContextState::Ready => {
                self.state = ContextState::Destroying;
                true
            }
            ContextState::Destroying | ContextState::Destroyed => false,
        }
    }

    /// Destroying -> Destroyed; releases the control channel.
    pub fn finish_teardown(&mut self) -> bool {
        if self.state != ContextState::Destroying {
            return false;
        }
        self.outbound = None;
        self.state = ContextState::Destroyed;
        true
    }

    /// The engine went away on its own; applies to the main context too.
    pub fn mark_detached(&mut self) {
        self.outbound = None;
        self.state = ContextState::Destroyed;
    }

    /// Queue a request on the control channel.
    pub fn send(&self, request: ControlRequest) -> Result<(), RouterError> {
        if self.state != ContextState::Ready {
            return Err(RouterError::ContextGone(self.key));
        }
        let outbound = self
            .outbound
            .as_ref()
            .ok_or(RouterError::ContextGone(self.key))?;
        outbound
            .send(request)
            .map_err(|_| RouterError::ContextGone(self.key))
    }
}
