//! Plain-text transcript of a conversation.
//!
//! The shell prints one line per message when it first appears and again
//! whenever its status changes, so the transcript reads as a log of the
//! conversation rather than a redrawn screen.

use std::collections::HashMap;

use chrono::Local;

use crate::domain::{
    conversation_state::ConversationState,
    message::{Message, MessageStatus},
};

const OUTBOUND_FALLBACK_NAME: &str = "You";
const INBOUND_FALLBACK_NAME: &str = "Assistant";
const SENDING_NOTICE: &str = "-- delivering batch --";

/// Formats one message as `[HH:MM] sender: content (status)`.
pub fn render_message(message: &Message) -> String {
    format!(
        "[{}] {}: {} ({})",
        message.created_at().with_timezone(&Local).format("%H:%M"),
        effective_sender_name(message),
        message.content(),
        message.status().display_label()
    )
}

pub fn render_relay_error(text: &str) -> String {
    format!("There Was An Issue: {text} (type /ok to dismiss)")
}

fn effective_sender_name(message: &Message) -> &str {
    match message.author() {
        Some(name) if !name.trim().is_empty() => name,
        _ if message.is_outbound() => OUTBOUND_FALLBACK_NAME,
        _ => INBOUND_FALLBACK_NAME,
    }
}

/// Tracks what has already been printed and yields only new lines.
#[derive(Debug, Default)]
pub struct TranscriptPrinter {
    printed: HashMap<String, MessageStatus>,
    history_announced: bool,
    was_sending: bool,
    shown_error: Option<String>,
}

impl TranscriptPrinter {
    pub fn render_changes(&mut self, state: &ConversationState) -> Vec<String> {
        let mut lines = Vec::new();

        if state.messages_loaded() && !self.history_announced {
            self.history_announced = true;
            lines.push(format!(
                "-- history loaded ({} messages) --",
                state.messages().len()
            ));
        }

        for message in state.messages() {
            let keys = message_keys(message);
            let already_printed = keys
                .iter()
                .any(|key| self.printed.get(key) == Some(&message.status()));

            if !already_printed {
                lines.push(render_message(message));
            }

            for key in keys {
                self.printed.insert(key, message.status());
            }
        }

        if state.is_sending() && !self.was_sending {
            lines.push(SENDING_NOTICE.to_owned());
        }
        self.was_sending = state.is_sending();

        let shown = self.shown_error.clone();
        match (state.relay_error(), shown.as_deref()) {
            (Some(current), shown) if shown != Some(current) => {
                lines.push(render_relay_error(current));
                self.shown_error = Some(current.to_owned());
            }
            (None, Some(_)) => self.shown_error = None,
            _ => {}
        }

        lines
    }
}

/// A message is known by its local id and, once saved, by its store key, so
/// an optimistic message and its persisted copy print only once.
fn message_keys(message: &Message) -> Vec<String> {
    let mut keys = vec![message.id().to_string()];
    if let Some(key) = message.persisted_id() {
        keys.push(format!("doc:{key}"));
    }
    keys
}
