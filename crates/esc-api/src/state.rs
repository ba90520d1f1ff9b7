//! # Application State
//!
//! Shared state for the Axum application: the reconciliation engine and
//! the admin capability token.

use std::sync::Arc;

use esc_engine::Engine;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// The reconciliation engine; all handlers delegate here.
    pub engine: Arc<Engine>,
    /// Bearer token granting the admin capability. `None` disables every
    /// admin endpoint.
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(engine: Arc<Engine>, admin_token: Option<String>) -> Self {
        Self {
            engine,
            admin_token,
        }
    }
}
