use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::services::conversation::{self, TurnReply};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct TurnRequest {
    pub call_id: String,
    pub utterance: String,
}

/// One dialogue turn: the voice layer hands over the caller's transcribed
/// utterance and gets back the text to speak next.
pub async fn turn(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TurnRequest>,
) -> Result<Json<TurnReply>, AppError> {
    let call_id = payload.call_id.trim();
    let utterance = payload.utterance.trim();
    if call_id.is_empty() {
        return Err(AppError::BadRequest("call_id must not be empty".to_string()));
    }

    let reply = conversation::process_turn(&state, call_id, utterance).await?;
    Ok(Json(reply))
}

pub async fn end_call(
    State(state): State<Arc<AppState>>,
    Path(call_id): Path<String>,
) -> Json<serde_json::Value> {
    let discarded = conversation::end_call(&state, &call_id);
    Json(serde_json::json!({ "discarded": discarded }))
}
