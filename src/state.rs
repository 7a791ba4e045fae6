// src/state.rs

use std::sync::Arc;

use crate::{
    config::Config,
    session::SessionStore,
    storage::JsonStore,
    utils::clock::{Clock, SystemClock},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JsonStore>,
    pub sessions: Arc<SessionStore>,
    pub clock: Arc<dyn Clock>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Arc::new(JsonStore::new(config.data_file.clone())),
            sessions: Arc::new(SessionStore::new(config.session_ttl)),
            clock,
            config,
        }
    }
}
