use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Process-local message identity, used as the list key.
///
/// Unrelated to the document key the message store assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Delivery status of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageStatus {
    #[default]
    Sent,
    Processing,
    Read,
}

impl MessageStatus {
    pub fn display_label(self) -> &'static str {
        match self {
            Self::Sent => "Sent",
            Self::Processing => "Responding",
            Self::Read => "Read",
        }
    }
}

/// Message document as written by this client. The store assigns the key
/// and the creation timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessageRecord {
    pub is_outbound: bool,
    pub content: String,
    pub author: Option<String>,
}

/// Message document as delivered by a collection snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub key: String,
    pub is_outbound: bool,
    pub content: String,
    pub author: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub sequence_hint: Option<i64>,
    pub completion_hint: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    persisted_id: Option<String>,
    is_outbound: bool,
    content: String,
    author: Option<String>,
    status: MessageStatus,
    created_at: DateTime<Utc>,
    sequence_hint: Option<i64>,
    completion_hint: Option<bool>,
}

impl Message {
    /// Builds a locally authored message for optimistic display.
    pub fn outbound(content: impl Into<String>, author: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: MessageId::new(),
            persisted_id: None,
            is_outbound: true,
            content: content.into(),
            author,
            status: MessageStatus::Sent,
            created_at: now,
            sequence_hint: None,
            completion_hint: None,
        }
    }

    /// Builds a message from a snapshot document. Outbound entries start as
    /// `Sent`, inbound ones as `Read`; a missing server timestamp falls back
    /// to `fallback_now`.
    pub fn from_stored(stored: &StoredMessage, fallback_now: DateTime<Utc>) -> Self {
        let status = if stored.is_outbound {
            MessageStatus::Sent
        } else {
            MessageStatus::Read
        };

        Self {
            id: MessageId::new(),
            persisted_id: Some(stored.key.clone()),
            is_outbound: stored.is_outbound,
            content: stored.content.clone(),
            author: stored.author.clone(),
            status,
            created_at: stored.created_at.unwrap_or(fallback_now),
            sequence_hint: stored.sequence_hint,
            completion_hint: stored.completion_hint,
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn persisted_id(&self) -> Option<&str> {
        self.persisted_id.as_deref()
    }

    pub fn is_outbound(&self) -> bool {
        self.is_outbound
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn status(&self) -> MessageStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn sequence_hint(&self) -> Option<i64> {
        self.sequence_hint
    }

    pub fn completion_hint(&self) -> Option<bool> {
        self.completion_hint
    }

    /// Record written to the store when this message is persisted.
    pub fn to_record(&self) -> NewMessageRecord {
        NewMessageRecord {
            is_outbound: self.is_outbound,
            content: self.content.clone(),
            author: self.author.clone(),
        }
    }

    /// Moves the message to `status`. A message that has left `Sent` never
    /// goes back to it; returns whether the transition was applied.
    pub fn transition_to(&mut self, status: MessageStatus) -> bool {
        if status == MessageStatus::Sent && self.status != MessageStatus::Sent {
            return false;
        }

        self.status = status;
        true
    }

    /// Records the store key once the write is acknowledged. The key is
    /// assigned at most once.
    pub fn attach_persisted_id(&mut self, key: impl Into<String>) -> bool {
        if self.persisted_id.is_some() {
            return false;
        }

        self.persisted_id = Some(key.into());
        true
    }
}
