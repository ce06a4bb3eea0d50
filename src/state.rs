// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::{
    config::Config,
    services::result_recorder::ResultRecorder,
    session::{SessionRegistry, SubmissionEndpoint},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub sessions: SessionRegistry,
    pub endpoint: Arc<dyn SubmissionEndpoint>,
}

impl AppState {
    /// State wired to the database-backed result recorder.
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let endpoint = Arc::new(ResultRecorder::new(pool.clone()));
        Self {
            pool,
            config,
            sessions: SessionRegistry::new(),
            endpoint,
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for SessionRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
