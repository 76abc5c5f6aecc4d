//! Remote record store boundary for chat messages.
//!
//! ARCHITECTURE
//! ============
//! The chat panel talks to a managed backend that can select a channel's
//! history, insert a row, and push insert notifications. [`RecordStore`]
//! captures exactly that contract so the optimistic message store can run
//! against Postgres in production and an in-memory store in tests.
//!
//! Implementations must keep the `id` supplied on insert. The realtime copy
//! of a message then carries the same id as the sender's placeholder, which
//! is what lets the deduplicating merge drop it.

pub mod memory;
pub mod postgres;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

use tokio::sync::mpsc;

use crate::chat::Message;

pub use memory::InMemoryRecordStore;
pub use postgres::PgRecordStore;

// =============================================================================
// ERRORS
// =============================================================================

/// Errors produced by record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database driver reported a failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A row or notification payload did not match the message shape.
    #[error("record decode failed: {0}")]
    Decode(String),

    /// The backend refused or could not serve the request.
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    /// The realtime feed ended before it was torn down.
    #[error("subscription closed")]
    SubscriptionClosed,
}

/// Grepable error code and retryable hint surfaced to the UI.
///
/// Nothing in this crate retries on its own; the hint only decides whether a
/// "try again" affordance is offered.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Database(_) => "E_DATABASE",
            Self::Decode(_) => "E_DECODE",
            Self::Unavailable(_) => "E_UNAVAILABLE",
            Self::SubscriptionClosed => "E_SUBSCRIPTION_CLOSED",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Database(e) => {
                matches!(e, sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed)
            }
            Self::Unavailable(_) | Self::SubscriptionClosed => true,
            Self::Decode(_) => false,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

// =============================================================================
// CONTRACT
// =============================================================================

/// Select / insert / subscribe over persisted chat messages.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// All messages in `channel_id`, ordered by `created_at` ascending.
    async fn select_messages(&self, channel_id: &str) -> Result<Vec<Message>, StoreError>;

    /// Durably write `message` under its own id. The stored row has status
    /// `sent` regardless of the status on the input.
    async fn insert_message(&self, message: &Message) -> Result<Message, StoreError>;

    /// Stream of messages inserted into `channel_id` from now on. The feed
    /// stops when the returned receiver is dropped.
    async fn subscribe_inserts(&self, channel_id: &str) -> Result<mpsc::Receiver<Message>, StoreError>;
}
