/// One line of user input, classified for the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    Submit(String),
    DismissError,
    /// `/relay <url>`: point later flushes at another relay.
    ChangeRelay(String),
    QuitRequested,
}

const RELAY_COMMAND: &str = "/relay";

impl ShellInput {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if let Some(url) = relay_argument(trimmed) {
            return Self::ChangeRelay(url.to_owned());
        }

        match trimmed {
            "/quit" | "/exit" => Self::QuitRequested,
            "/ok" | "/dismiss" => Self::DismissError,
            _ => Self::Submit(line.trim_end_matches(['\r', '\n']).to_owned()),
        }
    }
}

fn relay_argument(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(RELAY_COMMAND)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    Some(rest.trim()).filter(|url| !url.is_empty())
}
