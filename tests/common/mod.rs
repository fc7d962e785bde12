//! Common test utilities for repo-drop integration tests

#[allow(dead_code)]
pub mod app;
#[allow(dead_code)]
pub mod provider;

pub use app::*;
pub use provider::*;
