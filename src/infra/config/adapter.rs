use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::Result;

use crate::infra::{
    config::{load, AppConfig},
    contracts::ConfigAdapter,
};

const USER_ID_ENV: &str = "RELAYCHAT_USER_ID";
const DISPLAY_NAME_ENV: &str = "RELAYCHAT_DISPLAY_NAME";
const RELAY_URL_ENV: &str = "RELAYCHAT_RELAY_URL";

/// Loads the TOML config file, then lets `RELAYCHAT_*` environment variables
/// override the session identity and relay address.
#[derive(Debug, Clone, Default)]
pub struct FileConfigAdapter {
    path: Option<PathBuf>,
}

impl FileConfigAdapter {
    pub fn new(path: Option<&Path>) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
        }
    }
}

impl ConfigAdapter for FileConfigAdapter {
    fn load(&self) -> Result<AppConfig> {
        let mut config = load(self.path.as_deref())?;
        apply_env_overrides(&mut config);
        Ok(config)
    }
}

fn apply_env_overrides(config: &mut AppConfig) {
    if let Some(user_id) = non_empty_var(USER_ID_ENV) {
        config.session.user_id = Some(user_id);
    }

    if let Some(display_name) = non_empty_var(DISPLAY_NAME_ENV) {
        config.session.display_name = Some(display_name);
    }

    if let Some(base_url) = non_empty_var(RELAY_URL_ENV) {
        config.relay.base_url = base_url;
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
