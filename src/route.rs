//! Route bookkeeping: per-context stacks and the page registry derived from them.

pub mod registry;
pub mod stack;
pub mod table;

pub use registry::PageRegistry;
pub use stack::{RouteEntry, RouteStack};
pub use table::RouteTable;
