//! PostgreSQL implementation of MessageLog.
//!
//! Persists routed messages to the `chat_messages` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::domain::chat::{ChatMessage, Identity};
use crate::domain::foundation::{MessageId, Timestamp};
use crate::ports::{MessageLog, MessageLogError};

/// PostgreSQL implementation of MessageLog.
#[derive(Clone)]
pub struct PostgresMessageLog {
    pool: PgPool,
}

impl PostgresMessageLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), MessageLogError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| MessageLogError::Database(format!("Migration failed: {}", e)))
    }
}

#[async_trait]
impl MessageLog for PostgresMessageLog {
    async fn append(&self, message: &ChatMessage) -> Result<(), MessageLogError> {
        sqlx::query(
            r#"
            INSERT INTO chat_messages (id, sender, text, recipient, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(*message.id().as_uuid())
        .bind(message.sender().as_str())
        .bind(message.text())
        .bind(message.recipient().map(Identity::as_str))
        .bind(*message.sent_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| MessageLogError::Database(format!("Failed to insert message: {}", e)))?;

        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ChatMessage>, MessageLogError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            r#"
            SELECT id, sender, text, recipient, created_at
            FROM (
                SELECT id, sender, text, recipient, created_at
                FROM chat_messages
                ORDER BY created_at DESC
                LIMIT $1
            ) newest
            ORDER BY created_at ASC
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MessageLogError::Database(format!("Failed to fetch messages: {}", e)))?;

        rows.into_iter().map(row_to_message).collect()
    }
}

fn row_to_message(row: PgRow) -> Result<ChatMessage, MessageLogError> {
    let id: Uuid = row.try_get("id").map_err(corrupt)?;
    let sender: String = row.try_get("sender").map_err(corrupt)?;
    let text: String = row.try_get("text").map_err(corrupt)?;
    let recipient: Option<String> = row.try_get("recipient").map_err(corrupt)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(corrupt)?;

    // Stored names were valid when written; only blankness is re-checked.
    let sender = Identity::parse(sender, usize::MAX)
        .map_err(|e| MessageLogError::Corrupt(format!("sender: {}", e)))?;
    let recipient = recipient
        .map(|r| Identity::parse(r, usize::MAX))
        .transpose()
        .map_err(|e| MessageLogError::Corrupt(format!("recipient: {}", e)))?;

    Ok(ChatMessage::restore(
        MessageId::from_uuid(id),
        sender,
        text,
        recipient,
        Timestamp::from_datetime(created_at),
    ))
}

fn corrupt(e: sqlx::Error) -> MessageLogError {
    MessageLogError::Corrupt(e.to_string())
}
