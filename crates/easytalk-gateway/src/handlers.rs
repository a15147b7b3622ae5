use crate::error::ApiError;
use crate::server::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use easytalk_core::{EasytalkError, UserProfile};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInputRequest {
    #[serde(default)]
    pub user_id: String,
    pub caller_input: Option<String>,
    pub keyword_input: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInputResponse {
    pub suggestions: Vec<String>,
    /// `null` once the disclaimer has been delivered.
    pub disclaimer: Option<String>,
    /// Base64-encoded audio, only under the `with_suggestions` policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disclaimer_audio: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChooseSuggestionRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub chosen_suggestion: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerRequest {
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /api/chat/process-input
pub async fn process_input(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProcessInputRequest>, JsonRejection>,
) -> Result<Json<ProcessInputResponse>, ApiError> {
    let Json(req) = payload?;
    let outcome = state
        .orchestrator
        .submit_turn(
            &req.user_id,
            req.caller_input.as_deref(),
            req.keyword_input.as_deref(),
        )
        .await?;

    Ok(Json(ProcessInputResponse {
        suggestions: outcome.suggestions,
        disclaimer: outcome.disclaimer_text,
        disclaimer_audio: outcome.disclaimer_audio.map(|audio| STANDARD.encode(audio)),
    }))
}

/// POST /api/chat/choose-suggestion
///
/// Responds with the audio itself as an attachment.
pub async fn choose_suggestion(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChooseSuggestionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let reply = state
        .orchestrator
        .choose_suggestion(&req.user_id, &req.chosen_suggestion)
        .await?;

    let disposition = format!(
        "attachment; filename=\"response.{}\"",
        reply.encoding.file_extension()
    );
    Ok((
        [
            (header::CONTENT_TYPE, reply.encoding.mime_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        reply.audio,
    )
        .into_response())
}

/// POST /api/chat/end-call
pub async fn end_call(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CallerRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    state.orchestrator.end_call(&req.user_id).await?;
    Ok(Json(MessageResponse {
        message: "Call ended and conversation context reset.".to_string(),
    }))
}

/// GET /api/chat/user-profile?userId=
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    query: Result<Query<CallerRequest>, QueryRejection>,
) -> Result<Json<UserProfile>, ApiError> {
    let Query(req) = query?;
    let id = req.user_id.trim();
    if id.is_empty() {
        return Err(EasytalkError::MissingInput("userId".to_string()).into());
    }
    let profile = state
        .orchestrator
        .profiles()
        .get(id)
        .await?
        .ok_or_else(|| EasytalkError::ProfileNotFound(id.to_string()))?;
    Ok(Json(profile))
}

/// POST /api/chat/user-profile
pub async fn put_profile(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UserProfile>, JsonRejection>,
) -> Result<Json<UserProfile>, ApiError> {
    let Json(profile) = payload?;
    state.orchestrator.profiles().put(&profile).await?;
    Ok(Json(profile))
}
