use std::time::Duration;

use tokio::task::JoinHandle;

/// Single-slot debounce timer. Arming it cancels whatever was scheduled
/// before; each arming gets a new generation so an expiry that was already
/// queued when the timer was re-armed can be told apart and dropped.
#[derive(Debug)]
pub struct QuietTimer {
    delay: Duration,
    slot: Option<JoinHandle<()>>,
    generation: u64,
}

impl QuietTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            slot: None,
            generation: 0,
        }
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.slot.is_some()
    }

    /// Cancels the running timer, if any, and schedules `on_elapsed` to run
    /// with the new generation after the quiet period.
    pub fn rearm<F>(&mut self, on_elapsed: F) -> u64
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.cancel();
        self.generation += 1;

        let generation = self.generation;
        let delay = self.delay;
        self.slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_elapsed(generation);
        }));

        generation
    }

    /// Accepts an expiry for `generation`. Returns `false` for a stale one.
    pub fn expire(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.slot.is_none() {
            return false;
        }

        self.slot = None;
        true
    }

    pub fn cancel(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.abort();
        }
    }
}

impl Drop for QuietTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
