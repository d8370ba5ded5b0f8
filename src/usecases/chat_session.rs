//! A chat session: one task that owns the conversation state and applies
//! every change to it in order.
//!
//! Store writes, relay calls, timer expiries and realtime snapshots all run
//! elsewhere and only post [`SessionEvent`]s back to the session task, so the
//! conversation state and the pending batch have a single writer.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::domain::{
    conversation_state::ConversationState,
    message::{MessageId, StoredMessage},
    session::Session,
};

use super::{
    batching::{BatchingCoordinator, DEFAULT_QUIET_PERIOD},
    contracts::{MessageStore, RelayClient, RelayError, StoreError},
    realtime_sync::{self, RealtimeSync},
    subscription::SnapshotResult,
};

const CHAT_SESSION_IDENTITY_ABSENT: &str = "CHAT_SESSION_IDENTITY_ABSENT";
const CHAT_SESSION_PERSIST_FAILED: &str = "CHAT_SESSION_PERSIST_FAILED";
const CHAT_SESSION_RELAY_FAILED: &str = "CHAT_SESSION_RELAY_FAILED";
const CHAT_SESSION_RELAY_ADDRESS_FETCH_FAILED: &str = "CHAT_SESSION_RELAY_ADDRESS_FETCH_FAILED";
const CHAT_SESSION_STARTED: &str = "CHAT_SESSION_STARTED";
const CHAT_SESSION_STOPPED: &str = "CHAT_SESSION_STOPPED";
const CHAT_SESSION_WORKER_JOIN_FAILED: &str = "CHAT_SESSION_WORKER_JOIN_FAILED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSessionConfig {
    pub quiet_period: Duration,
    pub relay_base_url: String,
}

impl Default for ChatSessionConfig {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
            relay_base_url: "https://testing2.ittc.ku.edu".to_owned(),
        }
    }
}

#[derive(Debug)]
pub enum SessionEvent {
    Submit(String),
    QuietPeriodElapsed {
        generation: u64,
    },
    Persisted {
        message_id: MessageId,
        outcome: Result<String, StoreError>,
    },
    RelayCompleted(Result<(), RelayError>),
    MessagesSnapshot(SnapshotResult<Vec<StoredMessage>>),
    TypingChanged(SnapshotResult<bool>),
    RelayAddressFetched(String),
    RelayAddressChanged(String),
    DismissError,
    Shutdown,
}

/// UI-facing side of a running chat session.
#[derive(Debug)]
pub struct ChatSessionHandle {
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    state_rx: watch::Receiver<ConversationState>,
    worker: Option<JoinHandle<()>>,
}

impl ChatSessionHandle {
    pub fn submit(&self, text: impl Into<String>) {
        self.send(SessionEvent::Submit(text.into()));
    }

    pub fn dismiss_error(&self) {
        self.send(SessionEvent::DismissError);
    }

    /// Points later flushes at a different relay without restarting.
    pub fn set_relay_base_url(&self, base_url: impl Into<String>) {
        self.send(SessionEvent::RelayAddressChanged(base_url.into()));
    }

    #[cfg(test)]
    pub fn state(&self) -> ConversationState {
        self.state_rx.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConversationState> {
        self.state_rx.clone()
    }

    /// Stops the session and waits until its timer and subscriptions are
    /// released.
    pub async fn shutdown(mut self) {
        self.send(SessionEvent::Shutdown);

        if let Some(worker) = self.worker.take() {
            if let Err(error) = worker.await {
                tracing::warn!(
                    code = CHAT_SESSION_WORKER_JOIN_FAILED,
                    error = %error,
                    "chat session worker ended abnormally"
                );
            }
        }
    }

    fn send(&self, event: SessionEvent) {
        if self.events_tx.send(event).is_err() {
            tracing::debug!("chat session already stopped; event dropped");
        }
    }
}

impl Drop for ChatSessionHandle {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.events_tx.send(SessionEvent::Shutdown);
        }
    }
}

pub struct ChatSession {
    store: Arc<dyn MessageStore>,
    relay: Arc<dyn RelayClient>,
    session: Option<Session>,
    relay_base_url: String,
    relay_address_pinned: bool,
    state: ConversationState,
    coordinator: BatchingCoordinator,
    realtime: RealtimeSync,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    state_tx: watch::Sender<ConversationState>,
}

impl ChatSession {
    /// Spawns the session task on the current runtime.
    pub fn start(
        store: Arc<dyn MessageStore>,
        relay: Arc<dyn RelayClient>,
        session: Option<Session>,
        config: ChatSessionConfig,
    ) -> ChatSessionHandle {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConversationState::default());

        let chat = Self {
            store,
            relay,
            session,
            relay_base_url: config.relay_base_url,
            relay_address_pinned: false,
            state: ConversationState::default(),
            coordinator: BatchingCoordinator::new(config.quiet_period),
            realtime: RealtimeSync::default(),
            events_tx: events_tx.clone(),
            state_tx,
        };
        let worker = tokio::spawn(chat.run(events_rx));

        ChatSessionHandle {
            events_tx,
            state_rx,
            worker: Some(worker),
        }
    }

    async fn run(mut self, mut events_rx: mpsc::UnboundedReceiver<SessionEvent>) {
        self.connect();

        while let Some(event) = events_rx.recv().await {
            if matches!(event, SessionEvent::Shutdown) {
                break;
            }

            self.handle(event);
            self.publish();
        }

        self.coordinator.cancel();
        self.realtime.stop();
        tracing::info!(code = CHAT_SESSION_STOPPED, "chat session stopped");
    }

    fn connect(&mut self) {
        self.spawn_relay_address_fetch();

        match &self.session {
            Some(session) => {
                self.realtime = RealtimeSync::start(self.store.as_ref(), session, &self.events_tx);
                tracing::info!(
                    code = CHAT_SESSION_STARTED,
                    user_id = %session.user_id,
                    "chat session started"
                );
            }
            None => tracing::warn!(
                code = CHAT_SESSION_IDENTITY_ABSENT,
                "no signed-in user; realtime sync skipped"
            ),
        }
    }

    fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Submit(text) => self.submit(&text),
            SessionEvent::QuietPeriodElapsed { generation } => self.flush(generation),
            SessionEvent::Persisted {
                message_id,
                outcome,
            } => match outcome {
                Ok(key) => {
                    self.state.attach_persisted_id(message_id, &key);
                }
                Err(error) => tracing::warn!(
                    code = CHAT_SESSION_PERSIST_FAILED,
                    message_id = %message_id,
                    error = %error,
                    "saving outbound message failed"
                ),
            },
            SessionEvent::RelayCompleted(outcome) => {
                if let Err(error) = &outcome {
                    tracing::warn!(
                        code = CHAT_SESSION_RELAY_FAILED,
                        error = %error,
                        "relay request failed"
                    );
                }
                self.coordinator.complete(&mut self.state, outcome);
            }
            SessionEvent::MessagesSnapshot(snapshot) => {
                realtime_sync::apply_messages_snapshot(&mut self.state, snapshot);
            }
            SessionEvent::TypingChanged(snapshot) => {
                realtime_sync::apply_typing_update(&mut self.state, snapshot);
            }
            SessionEvent::RelayAddressFetched(base_url) if self.relay_address_pinned => {
                tracing::debug!(
                    relay_base_url = %base_url,
                    "stored relay address ignored; address was set explicitly"
                );
            }
            SessionEvent::RelayAddressFetched(base_url) => {
                tracing::debug!(relay_base_url = %base_url, "relay address loaded from store");
                self.relay_base_url = base_url;
            }
            SessionEvent::RelayAddressChanged(base_url) => {
                tracing::debug!(relay_base_url = %base_url, "relay address updated");
                self.relay_base_url = base_url;
                self.relay_address_pinned = true;
            }
            SessionEvent::DismissError => self.state.dismiss_relay_error(),
            SessionEvent::Shutdown => {}
        }
    }

    fn submit(&mut self, text: &str) {
        let author = self
            .session
            .as_ref()
            .and_then(|session| session.display_name.clone());
        let events_tx = self.events_tx.clone();
        let on_quiet = move |generation| {
            let _ = events_tx.send(SessionEvent::QuietPeriodElapsed { generation });
        };

        let Some(message) = self
            .coordinator
            .submit(&mut self.state, text, author, Utc::now(), on_quiet)
        else {
            return;
        };

        let Some(session) = &self.session else {
            tracing::warn!(
                code = CHAT_SESSION_IDENTITY_ABSENT,
                message_id = %message.id(),
                "no signed-in user; outbound message not saved"
            );
            return;
        };

        let store = Arc::clone(&self.store);
        let events_tx = self.events_tx.clone();
        let user_id = session.user_id.clone();
        let message_id = message.id();
        let record = message.to_record();
        tokio::spawn(async move {
            let outcome = store.append_message(&user_id, record).await;
            let _ = events_tx.send(SessionEvent::Persisted {
                message_id,
                outcome,
            });
        });
    }

    fn flush(&mut self, generation: u64) {
        let Some(combined) = self.coordinator.flush(&mut self.state, generation) else {
            return;
        };

        let user_id = self
            .session
            .as_ref()
            .map(|session| session.user_id.clone())
            .unwrap_or_default();
        let base_url = self.relay_base_url.clone();
        let relay = Arc::clone(&self.relay);
        let events_tx = self.events_tx.clone();

        tracing::debug!(
            relay_base_url = %base_url,
            chars = combined.chars().count(),
            "flushing pending batch"
        );

        tokio::spawn(async move {
            let outcome = relay.post_batch(&base_url, &user_id, &combined).await;
            let _ = events_tx.send(SessionEvent::RelayCompleted(outcome));
        });
    }

    fn spawn_relay_address_fetch(&self) {
        let store = Arc::clone(&self.store);
        let events_tx = self.events_tx.clone();

        tokio::spawn(async move {
            match store.relay_base_url().await {
                Ok(Some(base_url)) => {
                    let _ = events_tx.send(SessionEvent::RelayAddressFetched(base_url));
                }
                Ok(None) => {}
                Err(error) => tracing::warn!(
                    code = CHAT_SESSION_RELAY_ADDRESS_FETCH_FAILED,
                    error = %error,
                    "relay address lookup failed; keeping configured address"
                ),
            }
        });
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}
