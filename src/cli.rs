use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Terminal chat client that batches typed lines and hands them to a relay.
#[derive(Debug, Parser)]
#[command(name = "relaychat", version)]
pub struct Cli {
    /// Config file to read (default: ./config.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Open the chat shell (default)
    Run,
    /// Print the effective configuration after file and environment overrides
    Config,
}

impl Cli {
    pub fn command_or_default(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn bare_invocation_opens_the_shell() {
        let cli = Cli::parse_from(["relaychat"]);

        assert_eq!(cli.command_or_default(), Command::Run);
        assert_eq!(cli.config, None);
    }

    #[test]
    fn config_flag_is_accepted_after_the_subcommand() {
        let cli = Cli::parse_from(["relaychat", "config", "-c", "chat.toml"]);

        assert_eq!(cli.command_or_default(), Command::Config);
        assert_eq!(cli.config.as_deref(), Some(Path::new("chat.toml")));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["relaychat", "logout"]).is_err());
    }
}
