use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    events::ShellInput,
    message::{NewMessageRecord, StoredMessage},
};

use super::subscription::Subscription;

const UNKNOWN_RELAY_ERROR: &str = "Unknown error";

/// Failures reported by the message store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("message store rejected the write: {0}")]
    Rejected(String),
    #[error("subscription closed by the message store")]
    SubscriptionClosed,
}

/// Failures reported by the relay endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// The request never produced a response.
    #[error("{0}")]
    Transport(String),
    /// The endpoint answered with a non-success status.
    #[error("{reason}")]
    Rejected { status: u16, reason: String },
}

impl RelayError {
    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        let text = self.to_string();
        if text.trim().is_empty() {
            UNKNOWN_RELAY_ERROR.to_owned()
        } else {
            text
        }
    }
}

/// Realtime document store holding per-user message collections and the
/// assistant typing flag.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Appends a message document to the user's collection and returns the
    /// key the store assigned.
    async fn append_message(
        &self,
        user_id: &str,
        record: NewMessageRecord,
    ) -> Result<String, StoreError>;

    /// Subscribes to the user's collection ordered by creation time. The
    /// current contents arrive first, then one snapshot per change.
    fn subscribe_messages(&self, user_id: &str)
        -> Result<Subscription<Vec<StoredMessage>>, StoreError>;

    /// Subscribes to the assistant typing flag for the user.
    fn subscribe_typing(&self, user_id: &str) -> Result<Subscription<bool>, StoreError>;

    /// Base address of the relay endpoint, if the store publishes one.
    async fn relay_base_url(&self) -> Result<Option<String>, StoreError>;
}

/// HTTP relay that forwards a batched message to the backend.
#[async_trait]
pub trait RelayClient: Send + Sync {
    async fn post_batch(&self, base_url: &str, user_id: &str, message: &str)
        -> Result<(), RelayError>;
}

#[async_trait]
pub trait ShellInputSource: Send {
    /// Next line of input, or `None` once input is exhausted.
    async fn next_input(&mut self) -> Result<Option<ShellInput>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_relay_error_shows_reason() {
        let error = RelayError::Rejected {
            status: 503,
            reason: "Service Unavailable".to_owned(),
        };

        assert_eq!(error.user_message(), "Service Unavailable");
    }

    #[test]
    fn blank_relay_error_falls_back_to_unknown() {
        let error = RelayError::Transport(String::new());

        assert_eq!(error.user_message(), "Unknown error");
    }
}
