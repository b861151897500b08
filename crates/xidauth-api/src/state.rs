//! # Application State
//!
//! Shared state handed to every handler. The [`AuthService`] is immutable
//! after startup, so the state is a cheap `Arc` clone.

use std::sync::Arc;

use xidauth_verify::AuthService;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: Arc<AuthService>,
}

impl AppState {
    pub fn new(service: AuthService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
