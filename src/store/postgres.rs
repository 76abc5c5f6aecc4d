//! `PostgreSQL` [`RecordStore`] with a `LISTEN/NOTIFY` realtime feed.
//!
//! SYSTEM CONTEXT
//! ==============
//! The schema is owned by the backend, not this crate. Reads and writes go to
//!
//! ```sql
//! messages(id text primary key, channel_id text, content jsonb, sender_id bigint,
//!          created_at timestamptz, status text, type text)
//! ```
//!
//! and the backend's insert trigger publishes `row_to_json(NEW)` on the
//! configured notify channel. Notifications for other chat channels share the
//! same notify channel and are filtered here.

#[cfg(test)]
#[path = "postgres_test.rs"]
mod tests;

use sqlx::postgres::{PgListener, PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::{RecordStore, StoreError};
use crate::chat::{Message, MessageContent, MessageStatus};
use crate::config::StoreConfig;

const SELECT_COLUMNS: &str = "id, channel_id, content, sender_id, created_at, status, type";

/// Record store backed by a shared SQLx pool.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
    notify_channel: String,
    subscribe_buffer: usize,
}

impl PgRecordStore {
    #[must_use]
    pub fn new(pool: PgPool, notify_channel: impl Into<String>, subscribe_buffer: usize) -> Self {
        Self { pool, notify_channel: notify_channel.into(), subscribe_buffer: subscribe_buffer.max(1) }
    }

    /// Open a pool from config.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial connection fails.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new().max_connections(config.max_connections).connect(&config.database_url).await?;
        info!(max_connections = config.max_connections, notify_channel = %config.notify_channel, "record store connected");
        Ok(Self::new(pool, config.notify_channel.clone(), config.subscribe_buffer))
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl RecordStore for PgRecordStore {
    async fn select_messages(&self, channel_id: &str) -> Result<Vec<Message>, StoreError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM messages WHERE channel_id = $1 ORDER BY created_at ASC");
        let rows = sqlx::query(&sql).bind(channel_id).fetch_all(&self.pool).await?;
        rows.iter().map(message_from_row).collect()
    }

    async fn insert_message(&self, message: &Message) -> Result<Message, StoreError> {
        let sql = format!(
            "INSERT INTO messages ({SELECT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {SELECT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&message.id)
            .bind(&message.channel_id)
            .bind(message.content.to_value())
            .bind(message.sender_id)
            .bind(message.created_at)
            .bind(MessageStatus::Sent.as_str())
            .bind(message.kind.as_str())
            .fetch_one(&self.pool)
            .await?;
        message_from_row(&row)
    }

    async fn subscribe_inserts(&self, channel_id: &str) -> Result<mpsc::Receiver<Message>, StoreError> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(&self.notify_channel).await?;

        let (tx, rx) = mpsc::channel(self.subscribe_buffer);
        let channel_id = channel_id.to_owned();
        info!(%channel_id, notify_channel = %self.notify_channel, "realtime feed listening");

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = tx.closed() => {
                        debug!(%channel_id, "realtime feed receiver dropped");
                        break;
                    }
                    received = listener.recv() => {
                        let notification = match received {
                            Ok(n) => n,
                            Err(e) => {
                                error!(error = %e, %channel_id, "realtime feed failed");
                                break;
                            }
                        };
                        let message = match serde_json::from_str::<Message>(notification.payload()) {
                            Ok(m) => m,
                            Err(e) => {
                                warn!(error = %e, %channel_id, "undecodable insert notification");
                                continue;
                            }
                        };
                        if message.channel_id != channel_id {
                            continue;
                        }
                        if tx.send(message).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Ok(rx)
    }
}

fn message_from_row(row: &PgRow) -> Result<Message, StoreError> {
    let status: String = row.try_get("status")?;
    let kind: String = row.try_get("type")?;
    Ok(Message {
        id: row.try_get("id")?,
        channel_id: row.try_get("channel_id")?,
        content: MessageContent::from_value(row.try_get("content")?),
        sender_id: row.try_get("sender_id")?,
        created_at: row.try_get("created_at")?,
        status: status.parse().map_err(StoreError::Decode)?,
        kind: kind.parse().map_err(StoreError::Decode)?,
    })
}
