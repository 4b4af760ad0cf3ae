//! API routes

mod chats;
mod feedback;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::ModelEntry;
use crate::conversation::{ConversationStore, StoreError};
use crate::core::{FeedbackError, FeedbackService, MemoryStore, ResearchPipeline};
use crate::export::ExportError;
use crate::monitor::ApiStatus;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ResearchPipeline>,
    pub sessions: Arc<SessionRegistry>,
    pub feedback: Arc<FeedbackService>,
}

impl AppState {
    pub fn new(pipeline: Arc<ResearchPipeline>) -> Self {
        let memory = pipeline.memory().clone();
        Self {
            sessions: Arc::new(SessionRegistry::new(memory.clone())),
            feedback: Arc::new(FeedbackService::new(memory)),
            pipeline,
        }
    }
}

/// Idle conversations kept open before the least recently used are evicted
pub const SESSION_CAPACITY: usize = 256;

struct OpenSession {
    store: Arc<ConversationStore>,
    last_used: AtomicU64,
}

impl OpenSession {
    /// Nothing but the registry references the store, and no turn is running
    fn is_idle(&self) -> bool {
        Arc::strong_count(&self.store) == 1
            && self.store.observer_count() == 0
            && !self.store.is_loading()
    }
}

/// Open conversations, keyed by conversation id
pub struct SessionRegistry {
    memory: Arc<MemoryStore>,
    capacity: usize,
    clock: AtomicU64,
    stores: RwLock<HashMap<String, OpenSession>>,
}

impl SessionRegistry {
    pub fn new(memory: Arc<MemoryStore>) -> Self {
        Self::with_capacity(memory, SESSION_CAPACITY)
    }

    pub fn with_capacity(memory: Arc<MemoryStore>, capacity: usize) -> Self {
        Self {
            memory,
            capacity,
            clock: AtomicU64::new(0),
            stores: RwLock::new(HashMap::new()),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// The open store for `id`, hydrating it from durable storage on first access
    pub async fn open(&self, id: &str) -> Result<Arc<ConversationStore>, StoreError> {
        if let Some(session) = self.stores.read().await.get(id) {
            session.last_used.store(self.tick(), Ordering::Relaxed);
            return Ok(session.store.clone());
        }

        let store = Arc::new(ConversationStore::new());
        store.hydrate(&self.memory, id).await?;

        let mut stores = self.stores.write().await;
        // another request may have hydrated it meanwhile
        let store = stores
            .entry(id.to_string())
            .or_insert_with(|| OpenSession {
                store,
                last_used: AtomicU64::new(self.tick()),
            })
            .store
            .clone();
        self.evict_idle(&mut stores);
        Ok(store)
    }

    pub async fn insert(&self, id: String, store: Arc<ConversationStore>) {
        let mut stores = self.stores.write().await;
        stores.insert(
            id,
            OpenSession {
                store,
                last_used: AtomicU64::new(self.tick()),
            },
        );
        self.evict_idle(&mut stores);
    }

    pub async fn remove(&self, id: &str) -> Option<Arc<ConversationStore>> {
        self.stores.write().await.remove(id).map(|session| session.store)
    }

    /// Drop the least recently used idle stores while over capacity
    fn evict_idle(&self, stores: &mut HashMap<String, OpenSession>) {
        let Some(excess) = stores.len().checked_sub(self.capacity).filter(|n| *n > 0) else {
            return;
        };

        let mut idle: Vec<(u64, String)> = stores
            .iter()
            .filter(|(_, session)| session.is_idle())
            .map(|(id, session)| (session.last_used.load(Ordering::Relaxed), id.clone()))
            .collect();
        idle.sort_unstable();

        for (_, id) in idle.into_iter().take(excess) {
            stores.remove(&id);
            tracing::debug!(conversation_id = %id, "Evicted idle conversation");
        }
    }

    #[cfg(test)]
    async fn is_open(&self, id: &str) -> bool {
        self.stores.read().await.contains_key(id)
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.stores.read().await.len()
    }
}

/// Errors returned by handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Conversation belongs to another user")]
    Forbidden,

    #[error("{0}")]
    BadRequest(String),

    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error("A research turn is already in progress")]
    Conflict,

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Feedback(#[from] FeedbackError),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ApiError::NotFound(id),
            StoreError::Persistence(e) => ApiError::Storage(e),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Export(ExportError::Pdf(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Export(_) => StatusCode::BAD_REQUEST,
            ApiError::Feedback(FeedbackError::EmptyContent) => StatusCode::BAD_REQUEST,
            ApiError::Feedback(_) | ApiError::Storage(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    api: ApiStatus,
}

#[derive(Debug, Serialize)]
struct ModelsResponse<'a> {
    default: &'a str,
    models: &'a [ModelEntry],
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        api: state.pipeline.status(),
    })
}

async fn models(State(state): State<AppState>) -> Response {
    let catalog = state.pipeline.catalog();
    Json(ModelsResponse {
        default: catalog.default_id(),
        models: catalog.entries(),
    })
    .into_response()
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/v1/status", get(status))
        .route("/v1/models", get(models))
        .route("/v1/chats", get(chats::list).post(chats::create))
        .route("/v1/chats/:id", get(chats::show).delete(chats::delete))
        .route(
            "/v1/chats/:id/messages",
            post(chats::submit).delete(chats::clear),
        )
        .route("/v1/chats/:id/events", get(chats::events))
        .route("/v1/chats/:id/export", get(chats::export))
        .route("/v1/chats/:id/citations", get(chats::citations))
        .route("/v1/feedback", get(feedback::list).post(feedback::create))
}
