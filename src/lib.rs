pub mod config;
pub mod error;
pub mod web;
pub mod websocket;

use std::sync::Arc;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use crate::config::Settings;

pub use websocket::{Channel, ChannelId, ConnectionDriver, ConnectionRegistry};

/// Application state shared across all workers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub registry: Arc<ConnectionRegistry>,
}

impl AppState {
    pub fn new(config: Settings) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(ConnectionRegistry::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_clone() {
        let config = Settings::new_for_test().expect("Failed to load test config");
        let state = AppState::new(config);

        let cloned = state.clone();

        // Every worker must see the same registry
        assert!(Arc::ptr_eq(&state.config, &cloned.config));
        assert!(Arc::ptr_eq(&state.registry, &cloned.registry));
    }

    #[test]
    fn test_app_states_are_isolated() {
        let a = AppState::new(Settings::new_for_test().unwrap());
        let b = AppState::new(Settings::new_for_test().unwrap());
        assert!(!Arc::ptr_eq(&a.registry, &b.registry));
    }
}
