//! Navrelay: Multi-Context Navigation Routing
//!
//! Routes page-level navigation commands from a host to the execution
//! contexts (engines) that render those pages. Each context keeps its own
//! route stack, page ids are unique across all of them, and commands travel
//! over per-context control channels with replies delivered back to the
//! caller exactly once.

pub mod back;
pub mod channel;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod identity;
pub mod logging;
pub mod route;
pub mod router;
pub mod stats;
pub mod types;

pub use back::{BackDecision, HostNavigator, IgnoreReason};
pub use config::RouterConfig;
pub use dispatch::Completion;
pub use engine::{ContextSpec, ContextState, EngineLauncher, EngineLink};
pub use error::RouterError;
pub use router::{BackOutcome, ContextEvent, ContextInfo, Router};
pub use types::{Arguments, ContextKey, PageId};
