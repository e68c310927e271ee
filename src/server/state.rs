//! Server state.

use crate::Engine;

/// Application state shared across handlers.
pub struct AppState {
    pub engine: Engine,
}

impl AppState {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }
}
