//! Conversation endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::conversation::store::TurnGuard;
use crate::conversation::{ConversationSnapshot, ConversationStore};
use crate::core::ChatSummary;
use crate::export::{self, ExportFile, ExportFormat};
use crate::identity::{Identity, OptionalIdentity};

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub message: String,
    /// Catalog model id; unknown ids fall back to the default model
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Accepted {
    pub conversation_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
}

fn require_message(request: &SubmitRequest) -> Result<(), ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Message must not be empty".into()));
    }
    Ok(())
}

/// Open a conversation for the caller; another user's conversation is refused
async fn open_for(
    state: &AppState,
    id: &str,
    identity: Option<&Identity>,
) -> Result<Arc<ConversationStore>, ApiError> {
    let store = state.sessions.open(id).await?;
    if let (Some(identity), Some(owner)) = (identity, store.owner()) {
        if owner != identity.user_id {
            tracing::warn!(conversation_id = id, user_id = %identity.user_id, "Refused access to conversation");
            return Err(ApiError::Forbidden);
        }
    }
    Ok(store)
}

/// Run a claimed turn in the background; observers follow it through the store
fn spawn_turn(
    state: &AppState,
    turn: TurnGuard<Arc<ConversationStore>>,
    identity: Option<Identity>,
    request: SubmitRequest,
) -> tokio::task::JoinHandle<()> {
    let pipeline = state.pipeline.clone();
    tokio::spawn(async move {
        let outcome = pipeline
            .submit_claimed(
                turn,
                identity.as_ref(),
                &request.message,
                request.model.as_deref(),
            )
            .await;
        tracing::debug!(?outcome, "Turn finished");
    })
}

pub async fn list(
    State(state): State<AppState>,
    OptionalIdentity(identity): OptionalIdentity,
) -> Result<Json<Vec<ChatSummary>>, ApiError> {
    let identity = identity.ok_or(ApiError::Unauthorized)?;
    let chats = state.pipeline.memory().list_chats(&identity.user_id).await?;
    Ok(Json(chats))
}

/// Start a conversation; answers once its durable record exists
pub async fn create(
    State(state): State<AppState>,
    OptionalIdentity(identity): OptionalIdentity,
    Json(request): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<Accepted>), ApiError> {
    let identity = identity.ok_or(ApiError::Unauthorized)?;
    require_message(&request)?;

    let store = Arc::new(ConversationStore::fresh());
    let turn = ConversationStore::try_claim_turn(&store).ok_or(ApiError::Conflict)?;
    let mut rx = store.subscribe();
    let mut task = spawn_turn(&state, turn, Some(identity), request);

    let adopted = tokio::select! {
        biased;
        snapshot = rx.wait_for(|s| s.conversation_id.is_some()) => {
            snapshot.ok().and_then(|s| s.conversation_id.clone())
        }
        _ = &mut task => store.conversation_id(),
    };

    let conversation_id = adopted
        .ok_or_else(|| ApiError::Internal("Failed to create conversation".into()))?;
    state
        .sessions
        .insert(conversation_id.clone(), store)
        .await;

    Ok((StatusCode::ACCEPTED, Json(Accepted { conversation_id })))
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
    OptionalIdentity(identity): OptionalIdentity,
) -> Result<Json<ConversationSnapshot>, ApiError> {
    let store = open_for(&state, &id, identity.as_ref()).await?;
    Ok(Json(store.snapshot()))
}

/// Delete a conversation; refused while a turn is running so it cannot write back
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    OptionalIdentity(identity): OptionalIdentity,
) -> Result<StatusCode, ApiError> {
    let store = open_for(&state, &id, identity.as_ref()).await?;
    let _turn = store.try_begin_turn().ok_or(ApiError::Conflict)?;

    state.pipeline.memory().delete_chat(&id).await?;
    state.sessions.remove(&id).await;
    tracing::info!(conversation_id = %id, "Deleted conversation");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn submit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    OptionalIdentity(identity): OptionalIdentity,
    Json(request): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<Accepted>), ApiError> {
    require_message(&request)?;

    let store = open_for(&state, &id, identity.as_ref()).await?;
    let turn = ConversationStore::try_claim_turn(&store).ok_or(ApiError::Conflict)?;

    spawn_turn(&state, turn, identity, request);
    Ok((StatusCode::ACCEPTED, Json(Accepted { conversation_id: id })))
}

pub async fn clear(
    State(state): State<AppState>,
    Path(id): Path<String>,
    OptionalIdentity(identity): OptionalIdentity,
) -> Result<StatusCode, ApiError> {
    let store = open_for(&state, &id, identity.as_ref()).await?;
    let _turn = store.try_begin_turn().ok_or(ApiError::Conflict)?;

    state.pipeline.memory().clear_chats(&id).await?;
    store.clear();

    Ok(StatusCode::NO_CONTENT)
}

/// Stream every snapshot of the conversation as it changes
pub async fn events(
    State(state): State<AppState>,
    Path(id): Path<String>,
    OptionalIdentity(identity): OptionalIdentity,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let store = open_for(&state, &id, identity.as_ref()).await?;
    let mut rx = store.subscribe();
    drop(store);

    tracing::info!(conversation_id = %id, "📡 SSE connection established");

    let stream = async_stream::stream! {
        loop {
            let snapshot = rx.borrow_and_update().clone();
            match Event::default().event("snapshot").json_data(&snapshot) {
                Ok(event) => yield Ok(event),
                Err(e) => tracing::warn!("Failed to encode snapshot: {}", e),
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

pub async fn export(
    State(state): State<AppState>,
    Path(id): Path<String>,
    OptionalIdentity(identity): OptionalIdentity,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let store = open_for(&state, &id, identity.as_ref()).await?;
    let file = export::export_transcript(&store.messages(), query.format)?;
    Ok(download(file))
}

pub async fn citations(
    State(state): State<AppState>,
    Path(id): Path<String>,
    OptionalIdentity(identity): OptionalIdentity,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let store = open_for(&state, &id, identity.as_ref()).await?;
    let messages = store.messages();
    let papers = export::latest_references(&messages).unwrap_or(&[]);
    let file = export::export_citations(papers, query.format)?;
    Ok(download(file))
}

fn download(file: ExportFile) -> Response {
    (
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.filename),
            ),
        ],
        file.bytes,
    )
        .into_response()
}
