//! Local replies while the backend is unreachable

use std::time::Duration;

use crate::config::prompts_builtin::OFFLINE_NOTICE;
use crate::config::settings::{CannedAnswer, OfflineSettings};

#[derive(Debug, Clone)]
pub struct OfflineResponder {
    delay: Duration,
    answers: Vec<CannedAnswer>,
}

impl OfflineResponder {
    pub fn new(delay: Duration, answers: Vec<CannedAnswer>) -> Self {
        Self { delay, answers }
    }

    pub fn from_settings(settings: &OfflineSettings) -> Self {
        let answers = if settings.answers.is_empty() {
            CannedAnswer::builtin()
        } else {
            settings.answers.clone()
        };
        Self::new(Duration::from_millis(settings.delay_ms), answers)
    }

    /// Canned answer for the first matching topic, otherwise the offline notice
    pub fn answer(&self, question: &str) -> &str {
        let question = question.to_lowercase();
        self.answers
            .iter()
            .find(|canned| {
                canned
                    .topics
                    .iter()
                    .any(|topic| question.contains(&topic.to_lowercase()))
            })
            .map(|canned| canned.answer.as_str())
            .unwrap_or(OFFLINE_NOTICE)
    }

    /// Wait the fixed delay, then produce the reply
    pub async fn respond(&self, question: &str) -> String {
        tokio::time::sleep(self.delay).await;
        self.answer(question).to_string()
    }
}

impl Default for OfflineResponder {
    fn default() -> Self {
        Self::from_settings(&OfflineSettings::default())
    }
}
