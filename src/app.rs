use std::io;

use anyhow::{Context, Result};
use tokio::runtime::{self, Runtime};

use crate::{
    cli::{Cli, Command},
    domain,
    infra::{
        self,
        config::{AppConfig, FileConfigAdapter},
        contracts::ConfigAdapter,
    },
    ui::{self, input_source::StdinInputSource},
    usecases::{self, bootstrap},
};

const APP_RUNTIME_BUILD_FAILED: &str = "APP_RUNTIME_BUILD_FAILED";

pub fn run(cli: Cli) -> Result<()> {
    tracing::debug!(
        ui = ui::module_name(),
        domain = domain::module_name(),
        usecases = usecases::module_name(),
        infra = infra::module_name(),
        "module boundaries loaded"
    );

    match cli.command_or_default() {
        Command::Run => {
            let context = bootstrap::bootstrap(cli.config.as_deref())?;
            let runtime = build_runtime()?;
            let mut input = StdinInputSource::new();
            let mut out = io::stdout();

            runtime.block_on(ui::shell::start(&context, &mut input, &mut out))?;
        }
        Command::Config => {
            let config = FileConfigAdapter::new(cli.config.as_deref()).load()?;
            print!("{}", render_config(&config)?);
        }
    }

    Ok(())
}

fn render_config(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(config).context("effective config could not be rendered as TOML")
}

fn build_runtime() -> Result<Runtime> {
    runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("relaychat-worker")
        .build()
        .with_context(|| format!("{APP_RUNTIME_BUILD_FAILED}: tokio runtime could not start"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_drives_timers_and_io() {
        let runtime = build_runtime().expect("runtime should build");

        let value = runtime.block_on(async {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            tokio::spawn(async { 7 }).await.expect("task should join")
        });

        assert_eq!(value, 7);
    }

    #[test]
    fn rendered_config_reads_back_unchanged() {
        let mut config = AppConfig::default();
        config.session.user_id = Some("u-7".to_owned());
        config.batching.quiet_period_ms = 1_500;

        let text = render_config(&config).expect("config should render");
        let parsed: AppConfig = toml::from_str(&text).expect("rendered config should parse");

        assert!(text.contains("[relay]"));
        assert_eq!(parsed, config);
    }
}
