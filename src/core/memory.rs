//! Durable conversation and feedback storage using SQLite
//!
//! Mirrors the document-store shape the front-end expects: one record per
//! conversation carrying `title`, `userId`, `timestamp`, and an append-only
//! `chats` list of `{role, message, references}` entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::conversation::{Message, Paper, Role};

/// One persisted chat entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChat {
    pub role: Role,
    pub message: String,
    #[serde(default)]
    pub references: Vec<Paper>,
}

impl StoredChat {
    pub fn new(role: Role, message: impl Into<String>, references: Vec<Paper>) -> Self {
        Self {
            role,
            message: message.into(),
            references,
        }
    }
}

impl From<StoredChat> for Message {
    fn from(stored: StoredChat) -> Self {
        Message {
            role: stored.role,
            content: stored.message,
            references: (!stored.references.is_empty()).then_some(stored.references),
        }
    }
}

/// A conversation record with its full history
#[derive(Debug, Clone, Serialize)]
pub struct ChatRecord {
    pub id: String,
    pub title: Option<String>,
    pub user_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub chats: Vec<StoredChat>,
}

/// History entry for a user's conversation list
#[derive(Debug, Clone, Serialize)]
pub struct ChatSummary {
    pub id: String,
    pub title: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A recorded feedback judgment
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackRecord {
    pub id: i64,
    pub user_id: String,
    pub content: String,
    pub comment: String,
    pub positivity: bool,
    pub is_reviewed: bool,
    pub timestamp: DateTime<Utc>,
}

/// Memory store for conversation persistence
pub struct MemoryStore {
    pool: SqlitePool,
}

impl MemoryStore {
    /// Create a new memory store with the given SQLite database path
    pub async fn new(db_path: &Path) -> Result<Self, sqlx::Error> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create an in-memory store asynchronously
    pub async fn new_in_memory_async() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chats (
                id TEXT PRIMARY KEY,
                title TEXT,
                user_id TEXT,
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chat_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id TEXT NOT NULL,
                role TEXT NOT NULL,
                message TEXT NOT NULL,
                refs TEXT NOT NULL DEFAULT '[]',
                FOREIGN KEY (chat_id) REFERENCES chats(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_chat_entries_chat
            ON chat_entries(chat_id, id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS feedbacks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                content TEXT NOT NULL,
                comment TEXT NOT NULL,
                positivity INTEGER NOT NULL,
                is_reviewed INTEGER NOT NULL DEFAULT 0,
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Create a conversation record with empty history; returns its identifier
    pub async fn create_chat(&self, user_id: &str, title: &str) -> Result<String, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO chats (id, title, user_id, timestamp) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(title)
            .bind(user_id)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(id)
    }

    /// Append an entry to a conversation's history.
    ///
    /// Identical entries are stored again; history is append-only per turn.
    /// Fails with `RowNotFound` when the conversation record does not exist.
    pub async fn append_chat(&self, chat_id: &str, chat: &StoredChat) -> Result<i64, sqlx::Error> {
        let refs = serde_json::to_string(&chat.references)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        let result = sqlx::query(
            r#"
            INSERT INTO chat_entries (chat_id, role, message, refs)
            SELECT ?, ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM chats WHERE id = ?)
            "#,
        )
        .bind(chat_id)
        .bind(chat.role.as_str())
        .bind(&chat.message)
        .bind(refs)
        .bind(chat_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(result.last_insert_rowid())
    }

    pub async fn set_title(&self, chat_id: &str, title: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE chats SET title = ? WHERE id = ?")
            .bind(title)
            .bind(chat_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Load a conversation record with its history, if it exists
    pub async fn get_chat(&self, chat_id: &str) -> Result<Option<ChatRecord>, sqlx::Error> {
        let row: Option<(String, Option<String>, Option<String>, String)> =
            sqlx::query_as("SELECT id, title, user_id, timestamp FROM chats WHERE id = ?")
                .bind(chat_id)
                .fetch_optional(&self.pool)
                .await?;

        let Some((id, title, user_id, timestamp)) = row else {
            return Ok(None);
        };

        let entries: Vec<(String, String, String)> = sqlx::query_as(
            r#"
            SELECT role, message, refs
            FROM chat_entries
            WHERE chat_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;

        let chats = entries
            .into_iter()
            .map(|(role, message, refs)| StoredChat {
                role: Role::parse(&role),
                message,
                references: serde_json::from_str(&refs).unwrap_or_default(),
            })
            .collect();

        Ok(Some(ChatRecord {
            id,
            title,
            user_id,
            timestamp: parse_timestamp(&timestamp),
            chats,
        }))
    }

    /// Conversations owned by `user_id`, newest first
    pub async fn list_chats(&self, user_id: &str) -> Result<Vec<ChatSummary>, sqlx::Error> {
        let rows: Vec<(String, Option<String>, String)> = sqlx::query_as(
            r#"
            SELECT id, title, timestamp FROM chats
            WHERE user_id = ?
            ORDER BY timestamp DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, title, timestamp)| ChatSummary {
                id,
                title,
                timestamp: parse_timestamp(&timestamp),
            })
            .collect())
    }

    /// Empty a conversation's history, keeping the record
    pub async fn clear_chats(&self, chat_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM chat_entries WHERE chat_id = ?")
            .bind(chat_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete a conversation and all its entries
    pub async fn delete_chat(&self, chat_id: &str) -> Result<(), sqlx::Error> {
        self.clear_chats(chat_id).await?;

        sqlx::query("DELETE FROM chats WHERE id = ?")
            .bind(chat_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn add_feedback(
        &self,
        user_id: &str,
        positivity: bool,
        comment: &str,
        content: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO feedbacks (user_id, content, comment, positivity, is_reviewed, timestamp)
            VALUES (?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(user_id)
        .bind(content)
        .bind(comment)
        .bind(positivity as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// All feedback, newest first
    pub async fn list_feedback(&self) -> Result<Vec<FeedbackRecord>, sqlx::Error> {
        let rows: Vec<(i64, String, String, String, i64, i64, String)> = sqlx::query_as(
            r#"
            SELECT id, user_id, content, comment, positivity, is_reviewed, timestamp
            FROM feedbacks
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, user_id, content, comment, positivity, is_reviewed, timestamp)| {
                    FeedbackRecord {
                        id,
                        user_id,
                        content,
                        comment,
                        positivity: positivity != 0,
                        is_reviewed: is_reviewed != 0,
                        timestamp: parse_timestamp(&timestamp),
                    }
                },
            )
            .collect())
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
