use std::{fmt, sync::Arc};

use tracing_appender::non_blocking::WorkerGuard;

use crate::{
    domain::session::Session,
    infra::config::AppConfig,
    usecases::contracts::{MessageStore, RelayClient},
};

pub struct AppContext {
    pub config: AppConfig,
    pub store: Arc<dyn MessageStore>,
    pub relay: Arc<dyn RelayClient>,
    _log_guard: Option<WorkerGuard>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn MessageStore>,
        relay: Arc<dyn RelayClient>,
    ) -> Self {
        Self {
            config,
            store,
            relay,
            _log_guard: None,
        }
    }

    pub fn with_log_guard(mut self, guard: Option<WorkerGuard>) -> Self {
        self._log_guard = guard;
        self
    }

    /// Session identity from config, if a user is configured.
    pub fn session(&self) -> Option<Session> {
        Session::from_parts(
            self.config.session.user_id.as_deref(),
            self.config.session.display_name.as_deref(),
        )
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
