//! Research backend integration
//!
//! The backend exposes three endpoints the pipeline calls in order (keyword
//! extraction, paper search, streamed generation) plus a root endpoint used
//! as a reachability probe.

mod http;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;
use thiserror::Error;

use crate::conversation::Paper;

pub use http::HttpBackend;

/// Raw body fragments of a streamed generation
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, BackendError>>;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Readable stream not supported")]
    NoStream,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Other(String),
}

/// Closed classification of backend failures, resolved to user-facing text in one place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Cors,
    RateLimited,
    Unknown,
}

impl ErrorKind {
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::Network => {
                "Connection error: Unable to reach the research API server. Please make sure the backend is running."
            }
            ErrorKind::Cors => {
                "CORS error: The research API server is not accepting requests from this origin."
            }
            ErrorKind::RateLimited => {
                "Rate limit reached: The paper search service has temporarily limited requests. Please wait a moment and try again."
            }
            ErrorKind::Unknown => {
                "I'm sorry, I encountered an error while researching. Please try again."
            }
        }
    }

    fn from_message(message: &str) -> Self {
        if message.contains("NetworkError") || message.contains("Failed to fetch") {
            ErrorKind::Network
        } else if message.contains("CORS") {
            ErrorKind::Cors
        } else if message.contains("429") {
            ErrorKind::RateLimited
        } else {
            ErrorKind::Unknown
        }
    }
}

impl BackendError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BackendError::RequestFailed(e) => {
                if e.status().map(|s| s.as_u16()) == Some(429) {
                    ErrorKind::RateLimited
                } else if e.is_connect() || e.is_timeout() || e.is_request() {
                    ErrorKind::Network
                } else {
                    ErrorKind::Unknown
                }
            }
            BackendError::Status { status: 429, .. } => ErrorKind::RateLimited,
            BackendError::Status { status: 403, body } if is_origin_rejection(body) => {
                ErrorKind::Cors
            }
            BackendError::Status { .. } | BackendError::NoStream => ErrorKind::Unknown,
            BackendError::InvalidResponse(message) | BackendError::Other(message) => {
                ErrorKind::from_message(message)
            }
        }
    }
}

fn is_origin_rejection(body: &str) -> bool {
    let body = body.to_ascii_lowercase();
    body.contains("cors") || body.contains("origin")
}

/// The remote services a research turn depends on
#[async_trait]
pub trait ResearchBackend: Send + Sync {
    /// Reachability check against the backend root
    async fn probe(&self) -> Result<(), BackendError>;

    /// Derive a search keyword string from the user's question
    async fn extract_keywords(&self, model: &str, content: &str) -> Result<String, BackendError>;

    /// Find papers matching a free-text query
    async fn search_papers(&self, query: &str) -> Result<Vec<Paper>, BackendError>;

    /// Open a streamed generation for the (augmented) prompt
    async fn generate(&self, model: &str, content: &str) -> Result<ByteStream, BackendError>;
}
