//! In-process message store with realtime subscriptions.
//!
//! Each user has a message collection kept in creation order and a typing
//! flag; both live in `watch` channels so every subscriber gets the current
//! value first and a fresh snapshot on each change.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;

use crate::{
    domain::message::{NewMessageRecord, StoredMessage},
    usecases::{
        contracts::{MessageStore, StoreError},
        subscription::{SnapshotFeed, Subscription},
    },
};

const MEMORY_STORE_FEED_STARTED: &str = "MEMORY_STORE_FEED_STARTED";
const MEMORY_STORE_FEED_STOPPED: &str = "MEMORY_STORE_FEED_STOPPED";

#[derive(Debug, Clone, Default)]
pub struct InMemoryMessageStore {
    inner: Arc<Mutex<StoreState>>,
}

#[derive(Debug, Default)]
struct StoreState {
    users: HashMap<String, UserDocuments>,
    relay_base_url: Option<String>,
    next_key: u64,
    fail_appends: bool,
}

#[derive(Debug)]
struct UserDocuments {
    messages: watch::Sender<Vec<StoredMessage>>,
    typing: watch::Sender<bool>,
}

impl UserDocuments {
    fn new() -> Self {
        let (messages, _) = watch::channel(Vec::new());
        let (typing, _) = watch::channel(false);
        Self { messages, typing }
    }
}

impl StoreState {
    fn user(&mut self, user_id: &str) -> &UserDocuments {
        self.users
            .entry(user_id.to_owned())
            .or_insert_with(UserDocuments::new)
    }

    fn insert(&mut self, user_id: &str, record: NewMessageRecord) -> String {
        self.next_key += 1;
        let key = format!("msg-{:06}", self.next_key);
        let stored = StoredMessage {
            key: key.clone(),
            is_outbound: record.is_outbound,
            content: record.content,
            author: record.author,
            created_at: Some(Utc::now()),
            sequence_hint: None,
            completion_hint: None,
        };

        self.user(user_id).messages.send_modify(|messages| {
            messages.push(stored);
            messages.sort_by_key(|message| message.created_at);
        });

        key
    }
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes later `append_message` calls fail, for exercising persist errors.
    #[cfg(test)]
    pub fn fail_appends(&self, fail: bool) {
        self.lock().fail_appends = fail;
    }

    #[cfg(test)]
    pub fn set_relay_base_url(&self, base_url: impl Into<String>) {
        self.lock().relay_base_url = Some(base_url.into());
    }

    /// Adds an assistant-authored message to the user's collection.
    #[cfg(test)]
    pub fn push_inbound(&self, user_id: &str, content: &str, author: Option<&str>) -> String {
        self.lock().insert(
            user_id,
            NewMessageRecord {
                is_outbound: false,
                content: content.to_owned(),
                author: author.map(ToOwned::to_owned),
            },
        )
    }

    #[cfg(test)]
    pub fn set_typing(&self, user_id: &str, is_typing: bool) {
        self.lock().user(user_id).typing.send_replace(is_typing);
    }

    #[cfg(test)]
    pub fn messages(&self, user_id: &str) -> Vec<StoredMessage> {
        self.lock()
            .users
            .get(user_id)
            .map(|docs| docs.messages.borrow().clone())
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub fn total_messages(&self) -> usize {
        self.lock()
            .users
            .values()
            .map(|docs| docs.messages.borrow().len())
            .sum()
    }

    /// Number of live subscriptions across all users.
    #[cfg(test)]
    pub fn active_subscriptions(&self) -> usize {
        self.lock()
            .users
            .values()
            .map(|docs| docs.messages.receiver_count() + docs.typing.receiver_count())
            .sum()
    }

    #[cfg(test)]
    pub async fn wait_for_subscriptions(&self, expected: usize) {
        while self.active_subscriptions() != expected {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append_message(
        &self,
        user_id: &str,
        record: NewMessageRecord,
    ) -> Result<String, StoreError> {
        let mut state = self.lock();
        if state.fail_appends {
            return Err(StoreError::Rejected("appends disabled".to_owned()));
        }

        Ok(state.insert(user_id, record))
    }

    fn subscribe_messages(
        &self,
        user_id: &str,
    ) -> Result<Subscription<Vec<StoredMessage>>, StoreError> {
        let source = self.lock().user(user_id).messages.subscribe();
        let (feed, subscription) = Subscription::channel();
        tokio::spawn(run_feed(source, feed, "messages"));

        Ok(subscription)
    }

    fn subscribe_typing(&self, user_id: &str) -> Result<Subscription<bool>, StoreError> {
        let source = self.lock().user(user_id).typing.subscribe();
        let (feed, subscription) = Subscription::channel();
        tokio::spawn(run_feed(source, feed, "typing"));

        Ok(subscription)
    }

    async fn relay_base_url(&self) -> Result<Option<String>, StoreError> {
        Ok(self.lock().relay_base_url.clone())
    }
}

async fn run_feed<T>(mut source: watch::Receiver<T>, mut feed: SnapshotFeed<T>, kind: &'static str)
where
    T: Clone + Send + Sync + 'static,
{
    tracing::debug!(code = MEMORY_STORE_FEED_STARTED, kind, "store feed started");

    let initial = source.borrow_and_update().clone();
    if feed.publish(Ok(initial)) {
        loop {
            tokio::select! {
                _ = feed.cancelled() => break,
                changed = source.changed() => {
                    if changed.is_err() {
                        let _ = feed.publish(Err(StoreError::SubscriptionClosed));
                        break;
                    }

                    let snapshot = source.borrow_and_update().clone();
                    if !feed.publish(Ok(snapshot)) {
                        break;
                    }
                }
            }
        }
    }

    tracing::debug!(code = MEMORY_STORE_FEED_STOPPED, kind, "store feed stopped");
}
