//! Execution contexts (engines): handles with their lifecycle state, and the launcher
//! port through which the router attaches and detaches engines.

pub mod handle;
pub mod launcher;

pub use handle::{ContextHandle, ContextState};
pub use launcher::{ContextSpec, EngineLauncher, EngineLink};
