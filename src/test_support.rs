use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::Notify;

use crate::{
    domain::{message::StoredMessage, session::Session},
    usecases::contracts::{RelayClient, RelayError},
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

pub fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn test_session() -> Session {
    Session {
        user_id: "user-1".to_owned(),
        display_name: Some("Ada".to_owned()),
    }
}

/// Snapshot document created `secs` seconds after the epoch.
pub fn stored(key: &str, is_outbound: bool, content: &str, secs: i64) -> StoredMessage {
    StoredMessage {
        key: key.to_owned(),
        is_outbound,
        content: content.to_owned(),
        author: Some(if is_outbound { "Ada" } else { "Assistant" }.to_owned()),
        created_at: Utc.timestamp_opt(secs, 0).single(),
        sequence_hint: None,
        completion_hint: None,
    }
}

/// Lets every ready task run. With a paused clock the runtime only moves
/// time forward once nothing else can make progress.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayCall {
    pub base_url: String,
    pub user_id: String,
    pub message: String,
}

/// Relay double that records every request and answers with a fixed outcome,
/// optionally holding each answer until the gate is notified.
#[derive(Debug)]
pub struct RecordingRelay {
    outcome: Result<(), RelayError>,
    gate: Option<Arc<Notify>>,
    calls: Mutex<Vec<RelayCall>>,
}

impl RecordingRelay {
    pub fn succeeding() -> Self {
        Self::with_outcome(Ok(()))
    }

    pub fn failing(error: RelayError) -> Self {
        Self::with_outcome(Err(error))
    }

    pub fn gated(outcome: Result<(), RelayError>) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let relay = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::with_outcome(outcome)
        };
        (relay, gate)
    }

    fn with_outcome(outcome: Result<(), RelayError>) -> Self {
        Self {
            outcome,
            gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RelayCall> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl RelayClient for RecordingRelay {
    async fn post_batch(
        &self,
        base_url: &str,
        user_id: &str,
        message: &str,
    ) -> Result<(), RelayError> {
        self.calls.lock().expect("calls lock").push(RelayCall {
            base_url: base_url.to_owned(),
            user_id: user_id.to_owned(),
            message: message.to_owned(),
        });

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.outcome.clone()
    }
}
