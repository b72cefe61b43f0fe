//! Voice listing endpoint

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use super::ApiState;
use crate::voice::Voice;

/// Build voice router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new().route("/", get(list_voices)).with_state(state)
}

/// Voices the client may request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoicesResponse {
    pub success: bool,
    pub voices: Vec<Voice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_voice: Option<String>,
}

/// List configured voices; empty when speech output is disabled
async fn list_voices(State(state): State<Arc<ApiState>>) -> Json<VoicesResponse> {
    let catalog = state.conversation.voices();

    Json(VoicesResponse {
        success: true,
        voices: catalog.map(|c| c.list().to_vec()).unwrap_or_default(),
        default_voice: catalog.map(|c| c.default_voice().to_string()),
    })
}
