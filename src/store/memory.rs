//! In-memory [`RecordStore`] for tests and offline demos.

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;

use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::warn;

use super::{RecordStore, StoreError};
use crate::chat::{Message, MessageStatus};

const DEFAULT_FEED_BUFFER: usize = 64;

#[derive(Default)]
struct MemoryInner {
    rows: Vec<Message>,
    subscribers: Vec<(String, mpsc::Sender<Message>)>,
    fail_inserts: bool,
    fail_selects: bool,
}

/// Messages held in a `Vec`, inserts fanned out to channel subscribers.
pub struct InMemoryRecordStore {
    inner: Mutex<MemoryInner>,
    feed_buffer: usize,
}

impl InMemoryRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_feed_buffer(DEFAULT_FEED_BUFFER)
    }

    /// Capacity of each subscriber's queue. Deliveries beyond it are dropped.
    #[must_use]
    pub fn with_feed_buffer(feed_buffer: usize) -> Self {
        Self { inner: Mutex::new(MemoryInner::default()), feed_buffer: feed_buffer.max(1) }
    }

    /// Add history rows without notifying subscribers.
    pub fn seed(&self, messages: impl IntoIterator<Item = Message>) {
        self.lock().rows.extend(messages);
    }

    /// Store a row written by another client and notify subscribers.
    pub fn publish(&self, message: Message) {
        let mut inner = self.lock();
        inner.rows.push(message.clone());
        fan_out(&mut inner, &message);
    }

    /// Push a notification without storing anything, e.g. a duplicate or late
    /// delivery from the realtime service.
    pub fn deliver(&self, message: Message) {
        fan_out(&mut self.lock(), &message);
    }

    /// Make subsequent inserts fail with [`StoreError::Unavailable`].
    pub fn set_fail_inserts(&self, fail: bool) {
        self.lock().fail_inserts = fail;
    }

    /// Make subsequent selects fail with [`StoreError::Unavailable`].
    pub fn set_fail_selects(&self, fail: bool) {
        self.lock().fail_selects = fail;
    }

    /// Live subscribers for `channel_id`. Closed receivers are pruned on the
    /// next delivery, not here.
    #[must_use]
    pub fn subscriber_count(&self, channel_id: &str) -> usize {
        self.lock().subscribers.iter().filter(|(channel, tx)| channel == channel_id && !tx.is_closed()).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

fn fan_out(inner: &mut MemoryInner, message: &Message) {
    inner.subscribers.retain(|(channel, tx)| {
        if *channel != message.channel_id {
            return !tx.is_closed();
        }
        match tx.try_send(message.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(id = %message.id, channel_id = %channel, "feed queue full; dropping delivery");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    });
}

#[async_trait::async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn select_messages(&self, channel_id: &str) -> Result<Vec<Message>, StoreError> {
        let inner = self.lock();
        if inner.fail_selects {
            return Err(StoreError::Unavailable("select rejected".into()));
        }
        let mut rows = inner.rows.iter().filter(|m| m.channel_id == channel_id).cloned().collect::<Vec<_>>();
        rows.sort_by_key(|m| m.created_at);
        Ok(rows)
    }

    async fn insert_message(&self, message: &Message) -> Result<Message, StoreError> {
        let mut inner = self.lock();
        if inner.fail_inserts {
            return Err(StoreError::Unavailable("insert rejected".into()));
        }
        if inner.rows.iter().any(|m| m.id == message.id) {
            return Err(StoreError::Unavailable(format!("duplicate id {}", message.id)));
        }
        let stored = Message { status: MessageStatus::Sent, ..message.clone() };
        inner.rows.push(stored.clone());
        fan_out(&mut inner, &stored);
        Ok(stored)
    }

    async fn subscribe_inserts(&self, channel_id: &str) -> Result<mpsc::Receiver<Message>, StoreError> {
        let (tx, rx) = mpsc::channel(self.feed_buffer);
        self.lock().subscribers.push((channel_id.to_owned(), tx));
        Ok(rx)
    }
}
