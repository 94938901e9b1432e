//! Ask AI API handler

use super::models::{AskRequest, AssistantReply};
use super::service::AssistantService;
use crate::api::models::{error_response, ApiError};
use crate::api::error_codes;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::warn;

/// Application state for the Ask AI endpoint
#[derive(Clone)]
pub struct AskState {
    pub service: Arc<AssistantService>,
}

/// Answer a question about the user's todos
///
/// POST /api/ask-ai
pub async fn ask_ai(
    State(state): State<AskState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AssistantReply>, (StatusCode, Json<ApiError>)> {
    // configuration problems win over a bad body
    state.service.ensure_ready().map_err(error_response)?;

    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected Ask AI body: {}", rejection.body_text());
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(
                error_codes::INVALID_REQUEST,
                format!("Invalid request body: {}", rejection.body_text()),
            )),
        )
    })?;

    state
        .service
        .ask(request)
        .await
        .map(Json)
        .map_err(error_response)
}
