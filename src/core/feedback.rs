//! Feedback capture for assistant messages

use std::sync::Arc;

use serde::Deserialize;

use super::memory::{FeedbackRecord, MemoryStore};
use crate::identity::Identity;

/// A thumbs-up/down judgment on one assistant message
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackInput {
    pub positivity: bool,
    #[serde(default)]
    pub comment: String,
    /// Snapshot of the judged message content
    pub content: String,
}

#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    #[error("Feedback must reference a message")]
    EmptyContent,

    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),
}

pub struct FeedbackService {
    memory: Arc<MemoryStore>,
}

impl FeedbackService {
    pub fn new(memory: Arc<MemoryStore>) -> Self {
        Self { memory }
    }

    /// Store a judgment as unreviewed, tagged with the caller's identity.
    ///
    /// Failures are logged and returned; nothing is retried.
    pub async fn record(
        &self,
        identity: &Identity,
        input: &FeedbackInput,
    ) -> Result<i64, FeedbackError> {
        if input.content.trim().is_empty() {
            return Err(FeedbackError::EmptyContent);
        }

        match self
            .memory
            .add_feedback(
                &identity.user_id,
                input.positivity,
                input.comment.trim(),
                &input.content,
            )
            .await
        {
            Ok(id) => {
                tracing::info!(
                    feedback_id = id,
                    positive = input.positivity,
                    "Recorded feedback"
                );
                Ok(id)
            }
            Err(e) => {
                tracing::error!("Failed to record feedback: {}", e);
                Err(e.into())
            }
        }
    }

    pub async fn list(&self) -> Result<Vec<FeedbackRecord>, FeedbackError> {
        Ok(self.memory.list_feedback().await?)
    }
}
