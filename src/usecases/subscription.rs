//! Cancellable snapshot streams handed out by the message store.
//!
//! A [`Subscription`] is the consumer side: it yields snapshots until the
//! producer stops or the subscriber unsubscribes. The producer holds the
//! paired [`SnapshotFeed`] and watches it to learn when to stop delivering.

use tokio::sync::{mpsc, watch};

use super::contracts::StoreError;

pub type SnapshotResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<SnapshotResult<T>>,
    stop_tx: Option<watch::Sender<bool>>,
}

#[derive(Debug)]
pub struct SnapshotFeed<T> {
    tx: mpsc::UnboundedSender<SnapshotResult<T>>,
    stop_rx: watch::Receiver<bool>,
}

impl<T> Subscription<T> {
    pub fn channel() -> (SnapshotFeed<T>, Subscription<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);

        (
            SnapshotFeed { tx, stop_rx },
            Subscription {
                rx,
                stop_tx: Some(stop_tx),
            },
        )
    }

    /// Waits for the next snapshot. Returns `None` once the producer is gone.
    pub async fn next(&mut self) -> Option<SnapshotResult<T>> {
        self.rx.recv().await
    }

    /// Stops delivery. Dropping the subscription has the same effect.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(true);
        }
        self.rx.close();
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl<T> SnapshotFeed<T> {
    /// Delivers a snapshot; returns `false` once the subscriber is gone.
    pub fn publish(&self, snapshot: SnapshotResult<T>) -> bool {
        !self.is_cancelled() && self.tx.send(snapshot).is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        *self.stop_rx.borrow() || self.tx.is_closed()
    }

    /// Resolves once the subscriber unsubscribes or is dropped.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.stop_rx.borrow_and_update() {
                return;
            }

            if self.stop_rx.changed().await.is_err() {
                return;
            }
        }
    }
}
