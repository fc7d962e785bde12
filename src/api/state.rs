//! Application state for the API server

use crate::Config;
use crate::flow::FlowController;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// Runs flows and owns the task registry
    pub flow: Arc<FlowController>,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(flow: Arc<FlowController>, config: Arc<Config>) -> Self {
        Self { flow, config }
    }
}
