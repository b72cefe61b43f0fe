//! Conversation endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderName, HeaderValue, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiState};
use crate::session::{ConversationTurn, UserProfile};

/// Response header naming the conversation an audio reply belongs to (percent-encoded)
pub const CONVERSATION_ID_HEADER: &str = "x-conversation-id";

/// Build conversation router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", post(converse))
        .route("/audio", post(converse_audio))
        .route("/{user_id}", get(history))
        .with_state(state)
}

/// Conversation request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub voice_id: Option<String>,
}

/// Text reply
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub success: bool,
    pub response: String,
    pub conversation_id: String,
}

/// Stored conversation for one user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub success: bool,
    pub conversation_id: String,
    pub history: Vec<ConversationTurn>,
    pub profile: UserProfile,
}

/// Answer an utterance with text
async fn converse(
    State(state): State<Arc<ApiState>>,
    body: Result<Json<ConversationRequest>, JsonRejection>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let Json(req) = body?;

    let reply = state
        .conversation
        .respond(req.user_id.as_deref(), req.text.as_deref().unwrap_or_default())
        .await?;

    Ok(Json(ConversationResponse {
        success: true,
        response: reply.text,
        conversation_id: reply.conversation_id,
    }))
}

/// Answer an utterance with MP3 audio
async fn converse_audio(
    State(state): State<Arc<ApiState>>,
    body: Result<Json<ConversationRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = body?;

    let spoken = state
        .conversation
        .respond_with_audio(
            req.user_id.as_deref(),
            req.text.as_deref().unwrap_or_default(),
            req.voice_id.as_deref(),
        )
        .await?;

    let mut response = (
        [(header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"))],
        spoken.audio,
    )
        .into_response();

    // Percent-encoded so any user id fits in a header value
    let encoded = urlencoding::encode(&spoken.reply.conversation_id);
    if let Ok(conversation_id) = HeaderValue::from_str(&encoded) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(CONVERSATION_ID_HEADER), conversation_id);
    }

    Ok(response)
}

/// Fetch the stored conversation for a user
async fn history(
    State(state): State<Arc<ApiState>>,
    Path(user_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let session = state.conversation.session(&user_id).await?;

    Ok(Json(HistoryResponse {
        success: true,
        conversation_id: user_id,
        history: session.history,
        profile: session.profile,
    }))
}
