//! Turns a rapid stream of user sends into one relay request per quiet
//! period and tracks the delivery status of the latest outbound message.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::{
    conversation_state::ConversationState,
    message::{Message, MessageStatus},
    pending_batch::PendingBatch,
};

use super::{contracts::RelayError, quiet_timer::QuietTimer};

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(7_000);

#[derive(Debug)]
pub struct BatchingCoordinator {
    pending: PendingBatch,
    timer: QuietTimer,
}

impl BatchingCoordinator {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            pending: PendingBatch::default(),
            timer: QuietTimer::new(quiet_period),
        }
    }

    #[cfg(test)]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    #[cfg(test)]
    pub fn is_timer_armed(&self) -> bool {
        self.timer.is_armed()
    }

    /// Records a user send. Blank text is ignored. Otherwise the message is
    /// inserted optimistically, its text joins the pending batch and the
    /// quiet period restarts; `on_quiet` runs with the timer generation when
    /// it elapses. Returns the inserted message so the caller can persist it.
    pub fn submit<F>(
        &mut self,
        state: &mut ConversationState,
        text: &str,
        author: Option<String>,
        now: DateTime<Utc>,
        on_quiet: F,
    ) -> Option<Message>
    where
        F: FnOnce(u64) + Send + 'static,
    {
        if text.trim().is_empty() {
            return None;
        }

        let message = Message::outbound(text, author, now);
        state.push_outbound(message.clone());
        self.pending.push(text);
        self.timer.rearm(on_quiet);

        Some(message)
    }

    /// Handles a timer expiry. Stale generations and an empty batch yield
    /// nothing; otherwise the batch is drained, the latest outbound message
    /// moves to `Processing` and the combined text is returned for the relay.
    pub fn flush(&mut self, state: &mut ConversationState, generation: u64) -> Option<String> {
        if !self.timer.expire(generation) {
            tracing::debug!(generation, "ignoring stale quiet period expiry");
            return None;
        }

        let combined = self.pending.take_joined()?;
        state.mark_last_outbound(MessageStatus::Processing);
        state.begin_sending();

        Some(combined)
    }

    /// Applies the relay outcome. On failure the latest outbound message is
    /// left at `Processing`.
    pub fn complete(&mut self, state: &mut ConversationState, outcome: Result<(), RelayError>) {
        state.finish_sending();

        match outcome {
            Ok(()) => {
                state.mark_last_outbound(MessageStatus::Read);
            }
            Err(error) => state.report_relay_error(error.user_message()),
        }
    }

    pub fn cancel(&mut self) {
        self.timer.cancel();
    }
}

impl Default for BatchingCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}
