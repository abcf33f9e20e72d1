//! Property-based tests for route bookkeeping invariants

mod page_identity;
mod route_table;
