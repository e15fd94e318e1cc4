// Tracked profile handlers.
//
// GET  /profiles       — the caller's tracked profiles
// POST /profiles/track — add one (LinkedIn URLs only, at most 20)

use axum::extract::State;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::CoreError;
use crate::profiles;
use crate::web::{ApiJson, AppState, AuthUser};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    pub profile_url: Option<String>,
}

pub async fn list_profiles(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<Value>, CoreError> {
    let pipeline = &state.pipeline;
    let profiles = profiles::list(pipeline.store().as_ref(), pipeline.policy(), &user_id).await?;
    Ok(Json(json!({ "profiles": profiles })))
}

pub async fn track_profile(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    ApiJson(body): ApiJson<TrackRequest>,
) -> Result<Json<Value>, CoreError> {
    let pipeline = &state.pipeline;
    let profile = profiles::track(
        pipeline.store().as_ref(),
        pipeline.policy(),
        &user_id,
        body.profile_url.as_deref().unwrap_or_default(),
        Utc::now(),
    )
    .await?;
    Ok(Json(json!({ "success": true, "profile": profile })))
}
