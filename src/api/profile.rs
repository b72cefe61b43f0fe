//! Profile endpoint

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiState};
use crate::Error;
use crate::session::{ProfileUpdate, UserProfile};

/// Build profile router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new().route("/", post(update_profile)).with_state(state)
}

/// Profile update request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub profile: Option<ProfileUpdate>,
}

/// Merged profile
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub profile: UserProfile,
}

/// Merge a partial profile into the user's session
async fn update_profile(
    State(state): State<Arc<ApiState>>,
    body: Result<Json<ProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let Json(req) = body?;

    let (Some(user_id), Some(update)) = (req.user_id, req.profile) else {
        return Err(Error::InvalidInput("userId and profile are required".to_string()).into());
    };

    let profile = state.conversation.update_profile(&user_id, update).await?;

    Ok(Json(ProfileResponse {
        success: true,
        profile,
    }))
}
