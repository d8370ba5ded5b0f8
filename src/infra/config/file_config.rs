use serde::Deserialize;

use crate::infra::config::{AppConfig, BatchingConfig, LogConfig, RelayConfig, SessionConfig};

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub logging: Option<FileLogConfig>,
    pub session: Option<FileSessionConfig>,
    pub relay: Option<FileRelayConfig>,
    pub batching: Option<FileBatchingConfig>,
}

impl FileConfig {
    pub fn merge_into(self, config: &mut AppConfig) {
        if let Some(logging) = self.logging {
            logging.merge_into(&mut config.logging);
        }

        if let Some(session) = self.session {
            session.merge_into(&mut config.session);
        }

        if let Some(relay) = self.relay {
            relay.merge_into(&mut config.relay);
        }

        if let Some(batching) = self.batching {
            batching.merge_into(&mut config.batching);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileLogConfig {
    pub level: Option<String>,
    pub file: Option<bool>,
}

impl FileLogConfig {
    fn merge_into(self, config: &mut LogConfig) {
        if let Some(level) = self.level {
            config.level = level;
        }

        if let Some(file) = self.file {
            config.file = file;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileSessionConfig {
    pub user_id: Option<String>,
    pub display_name: Option<String>,
}

impl FileSessionConfig {
    fn merge_into(self, config: &mut SessionConfig) {
        if self.user_id.is_some() {
            config.user_id = self.user_id;
        }

        if self.display_name.is_some() {
            config.display_name = self.display_name;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileRelayConfig {
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
}

impl FileRelayConfig {
    fn merge_into(self, config: &mut RelayConfig) {
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }

        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileBatchingConfig {
    pub quiet_period_ms: Option<u64>,
}

impl FileBatchingConfig {
    fn merge_into(self, config: &mut BatchingConfig) {
        if let Some(quiet_period_ms) = self.quiet_period_ms {
            config.quiet_period_ms = quiet_period_ms;
        }
    }
}
