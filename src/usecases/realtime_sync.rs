//! Keeps the conversation in step with the store's message collection and
//! the assistant typing flag.

use chrono::Utc;
use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};

use crate::domain::{
    conversation_state::ConversationState,
    message::{Message, StoredMessage},
    session::Session,
};

use super::{
    chat_session::SessionEvent,
    contracts::MessageStore,
    subscription::{SnapshotResult, Subscription},
};

const REALTIME_MESSAGES_SUBSCRIBE_FAILED: &str = "REALTIME_MESSAGES_SUBSCRIBE_FAILED";
const REALTIME_TYPING_SUBSCRIBE_FAILED: &str = "REALTIME_TYPING_SUBSCRIBE_FAILED";
const REALTIME_MESSAGES_SNAPSHOT_FAILED: &str = "REALTIME_MESSAGES_SNAPSHOT_FAILED";
const REALTIME_TYPING_SNAPSHOT_FAILED: &str = "REALTIME_TYPING_SNAPSHOT_FAILED";

/// Owns the two live subscriptions of a chat session. Stopping or dropping
/// it unsubscribes both.
#[derive(Debug, Default)]
pub struct RealtimeSync {
    forwarders: Vec<JoinHandle<()>>,
}

impl RealtimeSync {
    /// Subscribes to the session's message collection and typing flag and
    /// forwards every snapshot to `events_tx`. A failed subscribe is logged
    /// and leaves that signal silent.
    pub fn start(
        store: &dyn MessageStore,
        session: &Session,
        events_tx: &UnboundedSender<SessionEvent>,
    ) -> Self {
        let mut forwarders = Vec::with_capacity(2);

        match store.subscribe_messages(&session.user_id) {
            Ok(subscription) => forwarders.push(tokio::spawn(forward(
                subscription,
                events_tx.clone(),
                SessionEvent::MessagesSnapshot,
            ))),
            Err(error) => tracing::warn!(
                code = REALTIME_MESSAGES_SUBSCRIBE_FAILED,
                error = %error,
                "message collection subscription failed"
            ),
        }

        match store.subscribe_typing(&session.user_id) {
            Ok(subscription) => forwarders.push(tokio::spawn(forward(
                subscription,
                events_tx.clone(),
                SessionEvent::TypingChanged,
            ))),
            Err(error) => tracing::warn!(
                code = REALTIME_TYPING_SUBSCRIBE_FAILED,
                error = %error,
                "typing status subscription failed"
            ),
        }

        Self { forwarders }
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.forwarders.iter().any(|f| !f.is_finished())
    }

    pub fn stop(&mut self) {
        for forwarder in self.forwarders.drain(..) {
            forwarder.abort();
        }
    }
}

impl Drop for RealtimeSync {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn forward<T, F>(
    mut subscription: Subscription<T>,
    events_tx: UnboundedSender<SessionEvent>,
    wrap: F,
) where
    F: Fn(SnapshotResult<T>) -> SessionEvent,
{
    while let Some(snapshot) = subscription.next().await {
        if events_tx.send(wrap(snapshot)).is_err() {
            break;
        }
    }

    subscription.unsubscribe();
}

/// Rebuilds the message list from a collection snapshot. Failed snapshots
/// leave the state untouched.
pub fn apply_messages_snapshot(
    state: &mut ConversationState,
    snapshot: SnapshotResult<Vec<StoredMessage>>,
) -> bool {
    match snapshot {
        Ok(stored) => {
            let now = Utc::now();
            let messages = stored
                .iter()
                .map(|record| Message::from_stored(record, now))
                .collect();
            state.replace_with_snapshot(messages);
            true
        }
        Err(error) => {
            tracing::warn!(
                code = REALTIME_MESSAGES_SNAPSHOT_FAILED,
                error = %error,
                "message collection snapshot failed"
            );
            false
        }
    }
}

/// Applies a typing flag snapshot to the most recent inbound message.
pub fn apply_typing_update(state: &mut ConversationState, snapshot: SnapshotResult<bool>) -> bool {
    match snapshot {
        Ok(is_typing) => state.apply_typing(is_typing).is_some(),
        Err(error) => {
            tracing::warn!(
                code = REALTIME_TYPING_SNAPSHOT_FAILED,
                error = %error,
                "typing status snapshot failed"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::message::MessageStatus,
        infra::memory_store::InMemoryMessageStore,
        test_support::{stored, test_session},
        usecases::contracts::StoreError,
    };

    #[test]
    fn snapshot_replaces_state_in_delivered_order_with_default_statuses() {
        let mut state = ConversationState::default();
        state.push_outbound(Message::outbound("optimistic", None, Utc::now()));

        let applied = apply_messages_snapshot(
            &mut state,
            Ok(vec![
                stored("a", true, "hi", 1),
                stored("b", false, "hello!", 2),
                stored("c", true, "how are you", 3),
            ]),
        );

        assert!(applied);
        assert!(state.messages_loaded());
        let view: Vec<_> = state
            .messages()
            .iter()
            .map(|m| (m.persisted_id(), m.content(), m.status()))
            .collect();
        assert_eq!(
            view,
            vec![
                (Some("a"), "hi", MessageStatus::Sent),
                (Some("b"), "hello!", MessageStatus::Read),
                (Some("c"), "how are you", MessageStatus::Sent),
            ]
        );
    }

    #[test]
    fn empty_snapshot_still_marks_loaded() {
        let mut state = ConversationState::default();

        apply_messages_snapshot(&mut state, Ok(vec![]));

        assert!(state.messages_loaded());
        assert!(state.messages().is_empty());
    }

    #[test]
    fn failed_snapshot_keeps_existing_state() {
        let mut state = ConversationState::default();
        apply_messages_snapshot(&mut state, Ok(vec![stored("a", false, "hello", 1)]));
        let before = state.clone();

        let applied = apply_messages_snapshot(
            &mut state,
            Err(StoreError::SubscriptionClosed),
        );

        assert!(!applied);
        assert_eq!(state, before);
    }

    #[test]
    fn typing_flag_moves_latest_inbound_between_processing_and_read() {
        let mut state = ConversationState::default();
        apply_messages_snapshot(
            &mut state,
            Ok(vec![stored("a", false, "hello", 1), stored("b", true, "hi", 2)]),
        );

        assert!(apply_typing_update(&mut state, Ok(true)));
        assert_eq!(state.messages()[0].status(), MessageStatus::Processing);

        assert!(apply_typing_update(&mut state, Ok(false)));
        assert_eq!(state.messages()[0].status(), MessageStatus::Read);
        assert_eq!(state.messages()[1].status(), MessageStatus::Sent);
    }

    #[test]
    fn typing_flag_without_inbound_message_is_noop() {
        let mut state = ConversationState::default();
        apply_messages_snapshot(&mut state, Ok(vec![stored("a", true, "hi", 1)]));
        let before = state.clone();

        assert!(!apply_typing_update(&mut state, Ok(true)));
        assert_eq!(state, before);
    }

    #[tokio::test]
    async fn forwards_store_snapshots_as_session_events() {
        let store = InMemoryMessageStore::new();
        let session = test_session();
        let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();

        let _sync = RealtimeSync::start(&store, &session, &events_tx);

        let mut saw_messages = false;
        let mut saw_typing = false;
        while !(saw_messages && saw_typing) {
            match events_rx.recv().await.expect("event") {
                SessionEvent::MessagesSnapshot(Ok(messages)) => {
                    assert!(messages.is_empty());
                    saw_messages = true;
                }
                SessionEvent::TypingChanged(Ok(is_typing)) => {
                    assert!(!is_typing);
                    saw_typing = true;
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn stopping_releases_both_subscriptions() {
        let store = InMemoryMessageStore::new();
        let session = test_session();
        let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();

        let mut sync = RealtimeSync::start(&store, &session, &events_tx);
        let _ = events_rx.recv().await;
        let _ = events_rx.recv().await;
        assert_eq!(store.active_subscriptions(), 2);

        sync.stop();
        store.wait_for_subscriptions(0).await;

        assert!(!sync.is_active());
        assert_eq!(store.active_subscriptions(), 0);
    }
}
