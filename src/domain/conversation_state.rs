use super::message::{Message, MessageId, MessageStatus};

/// In-memory view of one chat session: the ordered message list plus the
/// flags the UI renders from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConversationState {
    messages: Vec<Message>,
    messages_loaded: bool,
    is_sending: bool,
    relay_error: Option<String>,
}

impl ConversationState {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn messages_loaded(&self) -> bool {
        self.messages_loaded
    }

    pub fn is_sending(&self) -> bool {
        self.is_sending
    }

    /// Failure text of the last relay call, shown as a blocking dialog until
    /// dismissed.
    pub fn relay_error(&self) -> Option<&str> {
        self.relay_error.as_deref()
    }

    #[cfg(test)]
    pub fn last_outbound(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.is_outbound())
    }

    #[cfg(test)]
    pub fn last_inbound(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| !m.is_outbound())
    }

    pub fn push_outbound(&mut self, message: Message) -> MessageId {
        let id = message.id();
        self.messages.push(message);
        id
    }

    /// Replaces the whole list with a snapshot, trusting its order.
    pub fn replace_with_snapshot(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.messages_loaded = true;
    }

    pub fn attach_persisted_id(&mut self, id: MessageId, key: &str) -> bool {
        self.messages
            .iter_mut()
            .find(|m| m.id() == id)
            .is_some_and(|m| m.attach_persisted_id(key))
    }

    /// Sets the status of whichever outbound message is currently last.
    pub fn mark_last_outbound(&mut self, status: MessageStatus) -> Option<MessageId> {
        let message = self.messages.iter_mut().rev().find(|m| m.is_outbound())?;
        message.transition_to(status).then(|| message.id())
    }

    /// Reflects the assistant typing flag on the most recent inbound message.
    pub fn apply_typing(&mut self, is_typing: bool) -> Option<MessageId> {
        let status = if is_typing {
            MessageStatus::Processing
        } else {
            MessageStatus::Read
        };

        let message = self.messages.iter_mut().rev().find(|m| !m.is_outbound())?;
        message.transition_to(status).then(|| message.id())
    }

    pub fn begin_sending(&mut self) {
        self.is_sending = true;
    }

    pub fn finish_sending(&mut self) {
        self.is_sending = false;
    }

    pub fn report_relay_error(&mut self, text: impl Into<String>) {
        self.relay_error = Some(text.into());
    }

    pub fn dismiss_relay_error(&mut self) {
        self.relay_error = None;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::test_support::stored;

    fn inbound(content: &str) -> Message {
        Message::from_stored(&stored("in", false, content, 10), Utc::now())
    }

    #[test]
    fn default_state_is_empty_and_not_loaded() {
        let state = ConversationState::default();

        assert!(state.messages().is_empty());
        assert!(!state.messages_loaded());
        assert!(!state.is_sending());
        assert_eq!(state.relay_error(), None);
    }

    #[test]
    fn push_outbound_appends_in_order() {
        let mut state = ConversationState::default();
        let now = Utc::now();

        let first = state.push_outbound(Message::outbound("a", None, now));
        let second = state.push_outbound(Message::outbound("b", None, now));

        let ids: Vec<_> = state.messages().iter().map(Message::id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn snapshot_replaces_everything_and_marks_loaded() {
        let mut state = ConversationState::default();
        state.push_outbound(Message::outbound("optimistic", None, Utc::now()));

        state.replace_with_snapshot(vec![inbound("hello")]);

        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.messages()[0].content(), "hello");
        assert!(state.messages_loaded());
    }

    #[test]
    fn mark_last_outbound_targets_the_latest_outbound_only() {
        let mut state = ConversationState::default();
        let now = Utc::now();
        let older = state.push_outbound(Message::outbound("a", None, now));
        let newer = state.push_outbound(Message::outbound("b", None, now));

        let marked = state.mark_last_outbound(MessageStatus::Processing);

        assert_eq!(marked, Some(newer));
        let statuses: Vec<_> = state.messages().iter().map(|m| (m.id(), m.status())).collect();
        assert_eq!(
            statuses,
            vec![(older, MessageStatus::Sent), (newer, MessageStatus::Processing)]
        );
    }

    #[test]
    fn mark_last_outbound_skips_trailing_inbound_messages() {
        let mut state = ConversationState::default();
        let now = Utc::now();
        state.replace_with_snapshot(vec![
            Message::from_stored(&stored("q", true, "question", 1), now),
            Message::from_stored(&stored("a", false, "answer", 2), now),
        ]);

        let marked = state.mark_last_outbound(MessageStatus::Processing);

        assert_eq!(marked, state.last_outbound().map(Message::id));
        assert_eq!(
            state.last_outbound().map(Message::content),
            Some("question")
        );
        assert_eq!(
            state.last_outbound().map(Message::status),
            Some(MessageStatus::Processing)
        );
        assert_eq!(
            state.last_inbound().map(Message::status),
            Some(MessageStatus::Read)
        );
    }

    #[test]
    fn mark_last_outbound_without_outbound_is_noop() {
        let mut state = ConversationState::default();
        state.replace_with_snapshot(vec![inbound("hello")]);

        assert_eq!(state.mark_last_outbound(MessageStatus::Processing), None);
    }

    #[test]
    fn typing_toggles_latest_inbound_message() {
        let mut state = ConversationState::default();
        state.replace_with_snapshot(vec![inbound("first"), inbound("second")]);

        state.apply_typing(true);
        assert_eq!(state.messages()[1].status(), MessageStatus::Processing);
        assert_eq!(state.messages()[0].status(), MessageStatus::Read);

        state.apply_typing(false);
        assert_eq!(state.messages()[1].status(), MessageStatus::Read);
    }

    #[test]
    fn typing_without_inbound_message_does_nothing() {
        let mut state = ConversationState::default();
        state.push_outbound(Message::outbound("hi", None, Utc::now()));
        let before = state.clone();

        assert_eq!(state.apply_typing(true), None);
        assert_eq!(state, before);
    }

    #[test]
    fn persisted_id_is_attached_by_local_id() {
        let mut state = ConversationState::default();
        let id = state.push_outbound(Message::outbound("hi", None, Utc::now()));

        assert!(state.attach_persisted_id(id, "doc-9"));
        assert_eq!(state.messages()[0].persisted_id(), Some("doc-9"));
        assert!(!state.attach_persisted_id(MessageId::new(), "doc-10"));
    }

    #[test]
    fn relay_error_is_reported_and_dismissed() {
        let mut state = ConversationState::default();

        state.report_relay_error("Service Unavailable");
        assert_eq!(state.relay_error(), Some("Service Unavailable"));

        state.dismiss_relay_error();
        assert_eq!(state.relay_error(), None);
    }

    #[test]
    fn sending_flag_follows_begin_and_finish() {
        let mut state = ConversationState::default();

        state.begin_sending();
        assert!(state.is_sending());

        state.finish_sending();
        assert!(!state.is_sending());
    }
}
