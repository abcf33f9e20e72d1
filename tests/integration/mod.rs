//! Integration tests for the navigation router

mod back_navigation;
mod config_integration;
mod logging_file;
pub mod test_utils;
