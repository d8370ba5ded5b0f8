use std::{io::Write, sync::Arc};

use anyhow::Result;

use crate::{
    domain::events::ShellInput,
    usecases::{
        chat_session::{ChatSession, ChatSessionHandle},
        context::AppContext,
        contracts::ShellInputSource,
    },
};

use super::transcript::TranscriptPrinter;

const SHELL_GREETING: &str =
    "Type a message and press Enter. /ok dismisses an error, /relay <url> switches relay, /quit exits.";

pub async fn start<W: Write>(
    context: &AppContext,
    input: &mut dyn ShellInputSource,
    out: &mut W,
) -> Result<()> {
    let session = context.session();
    tracing::info!(
        log_level = %context.config.logging.level,
        signed_in = session.is_some(),
        relay_base_url = %context.config.relay.base_url,
        "starting chat shell"
    );

    let handle = ChatSession::start(
        Arc::clone(&context.store),
        Arc::clone(&context.relay),
        session,
        context.config.chat_session(),
    );

    let outcome = run(&handle, input, out).await;
    handle.shutdown().await;
    outcome
}

async fn run<W: Write>(
    handle: &ChatSessionHandle,
    input: &mut dyn ShellInputSource,
    out: &mut W,
) -> Result<()> {
    let mut printer = TranscriptPrinter::default();
    let mut state_rx = handle.watch_state();

    writeln!(out, "{SHELL_GREETING}")?;

    loop {
        tokio::select! {
            next = input.next_input() => match next? {
                None | Some(ShellInput::QuitRequested) => break,
                Some(ShellInput::DismissError) => handle.dismiss_error(),
                Some(ShellInput::ChangeRelay(base_url)) => {
                    tracing::info!(relay_base_url = %base_url, "relay address changed from shell");
                    handle.set_relay_base_url(base_url);
                }
                Some(ShellInput::Submit(text)) => handle.submit(text),
            },
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }

                let state = state_rx.borrow_and_update().clone();
                for line in printer.render_changes(&state) {
                    writeln!(out, "{line}")?;
                }
                out.flush()?;
            }
        }
    }

    Ok(())
}
