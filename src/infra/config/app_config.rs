use serde::{Deserialize, Serialize};

use crate::usecases::chat_session::ChatSessionConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub logging: LogConfig,
    pub session: SessionConfig,
    pub relay: RelayConfig,
    pub batching: BatchingConfig,
}

impl AppConfig {
    pub fn chat_session(&self) -> ChatSessionConfig {
        ChatSessionConfig {
            quiet_period: std::time::Duration::from_millis(self.batching.quiet_period_ms),
            relay_base_url: self.relay.base_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    /// Write logs to a file under the data directory instead of stderr.
    pub file: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            file: false,
        }
    }
}

/// Identity of the signed-in user. Leaving `user_id` unset runs the client
/// without a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SessionConfig {
    pub user_id: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelayConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://testing2.ittc.ku.edu".to_owned(),
            timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchingConfig {
    pub quiet_period_ms: u64,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            quiet_period_ms: 7_000,
        }
    }
}
