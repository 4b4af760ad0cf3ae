//! Scripted backend for exercising the pipeline without a network

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::conversation::Paper;

use super::{BackendError, ByteStream, ResearchBackend};

/// How the generation endpoint behaves
pub enum Generation {
    /// Stream these chunks, then close
    Chunks(Vec<Vec<u8>>),
    /// Refuse before any bytes are sent
    Reject(String),
    /// Send these chunks, then fail mid-stream
    BreakAfter(Vec<Vec<u8>>, String),
}

pub struct FakeBackend {
    pub online: AtomicBool,
    keywords: Mutex<Result<String, String>>,
    papers: Mutex<Result<Vec<Paper>, String>>,
    generation: Mutex<Generation>,
    gate: Option<Arc<Notify>>,
    pub probes: AtomicUsize,
    pub keyword_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
    pub generate_calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            online: AtomicBool::new(true),
            keywords: Mutex::new(Ok(String::new())),
            papers: Mutex::new(Ok(Vec::new())),
            generation: Mutex::new(Generation::Chunks(Vec::new())),
            gate: None,
            probes: AtomicUsize::new(0),
            keyword_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
            generate_calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_keywords(self, keywords: &str) -> Self {
        *self.keywords.lock().unwrap() = Ok(keywords.to_string());
        self
    }

    pub fn failing_keywords(self, message: &str) -> Self {
        *self.keywords.lock().unwrap() = Err(message.to_string());
        self
    }

    pub fn with_papers(self, papers: Vec<Paper>) -> Self {
        *self.papers.lock().unwrap() = Ok(papers);
        self
    }

    pub fn failing_search(self, message: &str) -> Self {
        *self.papers.lock().unwrap() = Err(message.to_string());
        self
    }

    pub fn streaming(self, chunks: &[&str]) -> Self {
        *self.generation.lock().unwrap() =
            Generation::Chunks(chunks.iter().map(|c| c.as_bytes().to_vec()).collect());
        self
    }

    pub fn with_generation(self, generation: Generation) -> Self {
        *self.generation.lock().unwrap() = generation;
        self
    }

    /// Hold the generated stream until the gate is notified
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn network_calls(&self) -> usize {
        self.keyword_calls.load(Ordering::SeqCst)
            + self.search_calls.load(Ordering::SeqCst)
            + self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ResearchBackend for FakeBackend {
    async fn probe(&self) -> Result<(), BackendError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Status {
                status: 503,
                body: "unavailable".into(),
            })
        }
    }

    async fn extract_keywords(&self, _model: &str, _content: &str) -> Result<String, BackendError> {
        self.keyword_calls.fetch_add(1, Ordering::SeqCst);
        self.keywords
            .lock()
            .unwrap()
            .clone()
            .map_err(BackendError::Other)
    }

    async fn search_papers(&self, _query: &str) -> Result<Vec<Paper>, BackendError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.papers.lock().unwrap().clone().map_err(BackendError::Other)
    }

    async fn generate(&self, _model: &str, content: &str) -> Result<ByteStream, BackendError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(content.to_string());

        let (chunks, failure) = match &*self.generation.lock().unwrap() {
            Generation::Reject(message) => return Err(BackendError::Other(message.clone())),
            Generation::Chunks(chunks) => (chunks.clone(), None),
            Generation::BreakAfter(chunks, message) => (chunks.clone(), Some(message.clone())),
        };
        let gate = self.gate.clone();

        let stream = async_stream::stream! {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            for chunk in chunks {
                // give observers a chance to run between chunks
                tokio::task::yield_now().await;
                yield Ok(chunk);
            }
            if let Some(message) = failure {
                yield Err(BackendError::Other(message));
            }
        };
        Ok(stream.boxed())
    }
}
