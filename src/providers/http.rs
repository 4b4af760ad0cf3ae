//! HTTP research backend

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{header, Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::conversation::Paper;

use super::{BackendError, ByteStream, ResearchBackend};

pub struct HttpBackend {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct BackendRequest<'a> {
    role: &'static str,
    model: &'a str,
    content: &'a str,
}

/// Paper search answers either with a bare list or a `{ "data": [...] }` page.
///
/// Entries are kept raw so one malformed paper does not reject the rest.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    List(Vec<serde_json::Value>),
    Page {
        #[serde(default)]
        data: Vec<serde_json::Value>,
    },
}

impl SearchResponse {
    fn into_papers(self) -> Vec<Paper> {
        let entries = match self {
            SearchResponse::List(entries) => entries,
            SearchResponse::Page { data } => data,
        };

        entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<Paper>(entry) {
                Ok(paper) => Some(paper),
                Err(e) => {
                    tracing::warn!("Skipping malformed paper: {}", e);
                    None
                }
            })
            .collect()
    }
}

impl HttpBackend {
    /// Generation streams are unbounded in length, so only connecting is timed out
    pub fn new(
        base_url: impl Into<String>,
        connect_timeout: Option<Duration>,
    ) -> Result<Self, BackendError> {
        let mut builder = Client::builder();
        if let Some(timeout) = connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn ensure_success(response: Response) -> Result<Response, BackendError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status { status, body })
    }
}

#[async_trait]
impl ResearchBackend for HttpBackend {
    async fn probe(&self) -> Result<(), BackendError> {
        let response = self
            .client
            .get(&self.base_url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        Self::ensure_success(response).await.map(|_| ())
    }

    async fn extract_keywords(&self, model: &str, content: &str) -> Result<String, BackendError> {
        let response = self
            .client
            .post(self.url("/api/source"))
            .header(header::ACCEPT, "application/json")
            .json(&BackendRequest {
                role: "user",
                model,
                content,
            })
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        Ok(response.text().await?)
    }

    async fn search_papers(&self, query: &str) -> Result<Vec<Paper>, BackendError> {
        let response = self
            .client
            .get(self.url("/api/paper/search"))
            .query(&[("query", query.trim())])
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let body = response.text().await?;
        let parsed: SearchResponse = serde_json::from_str(&body)
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse papers: {}", e)))?;

        Ok(parsed.into_papers())
    }

    async fn generate(&self, model: &str, content: &str) -> Result<ByteStream, BackendError> {
        let response = self
            .client
            .post(self.url("/api/generate"))
            .header(header::ACCEPT, "text/event-stream")
            .json(&BackendRequest {
                role: "user",
                model,
                content,
            })
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        if response.content_length() == Some(0) {
            return Err(BackendError::NoStream);
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(BackendError::from))
            .boxed())
    }
}
