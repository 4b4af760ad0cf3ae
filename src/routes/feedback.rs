//! Feedback endpoints

use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;

use super::{ApiError, AppState};
use crate::core::{FeedbackInput, FeedbackRecord};
use crate::identity::OptionalIdentity;

#[derive(Debug, Serialize)]
pub struct Recorded {
    pub id: i64,
}

pub async fn create(
    State(state): State<AppState>,
    OptionalIdentity(identity): OptionalIdentity,
    Json(input): Json<FeedbackInput>,
) -> Result<(StatusCode, Json<Recorded>), ApiError> {
    let identity = identity.ok_or(ApiError::Unauthorized)?;
    let id = state.feedback.record(&identity, &input).await?;
    Ok((StatusCode::CREATED, Json(Recorded { id })))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<FeedbackRecord>>, ApiError> {
    Ok(Json(state.feedback.list().await?))
}
