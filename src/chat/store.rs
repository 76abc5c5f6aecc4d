//! Optimistic message store for one chat panel.
//!
//! ARCHITECTURE
//! ============
//! The message list sits behind a `std::sync::Mutex` that is never held
//! across an `.await`. That keeps `send` synchronous up to the optimistic
//! append, so the placeholder is visible before the write is even spawned.
//!
//! Three paths mutate the list:
//! - `load_initial` replaces it wholesale.
//! - `send` appends a placeholder, then a detached task resolves its status.
//! - The feed task merges realtime inserts.
//!
//! Every revision is published on a `watch` channel so a view can re-render.
//!
//! TRADE-OFFS
//! ==========
//! Each subscription gets a generation number. The feed task checks it under
//! the lock before applying a delivery, so a notification that was already
//! queued when the channel was torn down is discarded instead of leaking into
//! the next channel's list. Writes are never cancelled: a send issued before a
//! channel switch still resolves, and finding its placeholder gone is fine.

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{Message, MessageContent, MessageStatus, chronological, merge, resolve_status};
use crate::store::{ErrorCode, RecordStore, StoreError};

// =============================================================================
// SHARED STATE
// =============================================================================

/// Message list plus the identity of the live subscription.
#[derive(Debug, Default)]
struct ChatState {
    messages: Vec<Message>,
    channel: Option<String>,
    generation: u64,
}

struct Shared {
    state: Mutex<ChatState>,
    revision: watch::Sender<u64>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

/// What happened to one realtime delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Appended,
    Duplicate,
    OtherChannel,
    Stale,
}

fn apply_delivery(shared: &Shared, generation: u64, incoming: Message) -> Delivery {
    let outcome = {
        let mut state = shared.lock();
        if state.generation != generation {
            Delivery::Stale
        } else if state.channel.as_deref() != Some(incoming.channel_id.as_str()) {
            Delivery::OtherChannel
        } else if merge(&mut state.messages, incoming) {
            Delivery::Appended
        } else {
            Delivery::Duplicate
        }
    };
    if outcome == Delivery::Appended {
        shared.bump();
    }
    outcome
}

async fn run_feed(shared: Arc<Shared>, generation: u64, mut feed: mpsc::Receiver<Message>) {
    while let Some(incoming) = feed.recv().await {
        let id = incoming.id.clone();
        match apply_delivery(&shared, generation, incoming) {
            Delivery::Appended => debug!(%id, "realtime message appended"),
            Delivery::Duplicate => debug!(%id, "realtime message already present"),
            Delivery::OtherChannel => debug!(%id, "realtime message for another channel ignored"),
            Delivery::Stale => {
                debug!(%id, generation, "feed superseded; stopping");
                return;
            }
        }
    }
    debug!(generation, "realtime feed ended");
}

/// Live feed task. Dropping it stops deliveries.
struct FeedTask {
    generation: u64,
    task: JoinHandle<()>,
}

impl Drop for FeedTask {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// =============================================================================
// PENDING SEND
// =============================================================================

/// Handle to an in-flight write. Dropping it does not cancel the write.
#[derive(Debug)]
pub struct PendingSend {
    id: String,
    task: JoinHandle<MessageStatus>,
}

impl PendingSend {
    /// Id of the local placeholder. It stays the message id after the write.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wait for the write and return the placeholder's final status.
    pub async fn resolved(self) -> MessageStatus {
        match self.task.await {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, id = %self.id, "send task did not complete");
                MessageStatus::Error
            }
        }
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Chat message list with optimistic sends and a deduplicated realtime feed.
pub struct OptimisticMessageStore<S> {
    remote: Arc<S>,
    shared: Arc<Shared>,
    feed: Mutex<Option<FeedTask>>,
}

impl<S: RecordStore> OptimisticMessageStore<S> {
    pub fn new(remote: Arc<S>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            remote,
            shared: Arc::new(Shared { state: Mutex::new(ChatState::default()), revision }),
            feed: Mutex::new(None),
        }
    }

    /// Snapshot of the current list.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.shared.lock().messages.clone()
    }

    /// Revision counter, bumped on every visible change.
    #[must_use]
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// Channel of the live subscription, if any.
    #[must_use]
    pub fn active_channel(&self) -> Option<String> {
        self.shared.lock().channel.clone()
    }

    /// Fetch a channel's history and replace the list with it, oldest first.
    ///
    /// A live feed for a different channel is torn down before the list is
    /// replaced, so its inserts never land in this channel's history.
    ///
    /// # Errors
    ///
    /// Returns the store error unchanged; the list is not touched on failure.
    pub async fn load_initial(&self, channel_id: &str) -> Result<Vec<Message>, StoreError> {
        let history = match self.remote.select_messages(channel_id).await {
            Ok(history) => chronological(history),
            Err(e) => {
                warn!(error = %e, code = e.error_code(), retryable = e.retryable(), %channel_id, "history load failed");
                return Err(e);
            }
        };
        if self.active_channel().is_some_and(|active| active != channel_id) {
            self.unsubscribe();
        }
        self.shared.lock().messages.clone_from(&history);
        self.shared.bump();
        info!(%channel_id, count = history.len(), "history loaded");
        Ok(history)
    }

    /// Follow realtime inserts for `channel_id`, replacing any previous feed.
    ///
    /// # Errors
    ///
    /// Returns the store error if the feed cannot be opened; any previous
    /// feed is still torn down.
    pub async fn subscribe(&self, channel_id: &str) -> Result<(), StoreError> {
        self.unsubscribe();
        let feed = self.remote.subscribe_inserts(channel_id).await?;

        let generation = {
            let mut state = self.shared.lock();
            state.generation += 1;
            state.channel = Some(channel_id.to_owned());
            state.generation
        };
        let task = tokio::spawn(run_feed(Arc::clone(&self.shared), generation, feed));
        *self.feed_slot() = Some(FeedTask { generation, task });
        info!(%channel_id, generation, "subscribed");
        Ok(())
    }

    /// Stop the realtime feed. Deliveries already queued are discarded.
    pub fn unsubscribe(&self) {
        let previous = {
            let mut state = self.shared.lock();
            state.generation += 1;
            state.channel.take()
        };
        if let Some(feed) = self.feed_slot().take() {
            debug!(generation = feed.generation, "feed task stopped");
        }
        if let Some(channel_id) = previous {
            info!(%channel_id, "unsubscribed");
        }
    }

    /// Tear down the current channel, load `channel_id`, and follow it.
    ///
    /// # Errors
    ///
    /// Returns the first store error. On failure the list is empty and no
    /// feed is active.
    pub async fn switch_channel(&self, channel_id: &str) -> Result<Vec<Message>, StoreError> {
        self.unsubscribe();
        self.shared.lock().messages.clear();
        self.shared.bump();
        let history = self.load_initial(channel_id).await?;
        self.subscribe(channel_id).await?;
        Ok(history)
    }

    /// Append a `Sending` placeholder now and write it in the background.
    ///
    /// The placeholder keeps its id for good; the remote row is written under
    /// the same id so the feed's copy merges away as a duplicate.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn send(&self, channel_id: &str, sender_id: i64, content: impl Into<MessageContent>) -> PendingSend {
        let placeholder = Message::placeholder(channel_id, sender_id, content.into());
        let id = placeholder.id.clone();

        merge(&mut self.shared.lock().messages, placeholder.clone());
        self.shared.bump();
        debug!(%id, %channel_id, "placeholder appended");

        let remote = Arc::clone(&self.remote);
        let shared = Arc::clone(&self.shared);
        let task = tokio::spawn(async move {
            let status = match remote.insert_message(&placeholder).await {
                Ok(_) => MessageStatus::Sent,
                Err(e) => {
                    warn!(error = %e, code = e.error_code(), id = %placeholder.id, "send failed");
                    MessageStatus::Error
                }
            };
            let changed = resolve_status(&mut shared.lock().messages, &placeholder.id, status);
            if changed {
                shared.bump();
            } else {
                debug!(id = %placeholder.id, "placeholder gone before write resolved");
            }
            status
        });

        PendingSend { id, task }
    }

    /// Manually retry a failed message: drop it and send its content again as
    /// a new placeholder. Returns `None` unless `id` names an `Error` message.
    pub fn resend(&self, id: &str) -> Option<PendingSend> {
        let failed = {
            let mut state = self.shared.lock();
            let index = state.messages.iter().position(|m| m.id == id && m.status == MessageStatus::Error)?;
            state.messages.remove(index)
        };
        self.shared.bump();
        Some(self.send(&failed.channel_id, failed.sender_id, failed.content))
    }

    fn feed_slot(&self) -> MutexGuard<'_, Option<FeedTask>> {
        self.feed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
