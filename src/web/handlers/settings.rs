// Preference handlers.
//
// GET /settings/preferences — stored preferences or sign-up defaults
// PUT /settings/preferences — validate and replace; goals < 1 are a 400

use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::analytics::UserPreferences;
use crate::error::CoreError;
use crate::web::{ApiJson, AppState, AuthUser};

#[derive(Debug, Deserialize)]
pub struct PreferencesRequest {
    pub preferences: Option<UserPreferences>,
}

pub async fn get_preferences(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<Value>, CoreError> {
    let preferences = state.pipeline.preferences(&user_id).await?;
    Ok(Json(json!({ "preferences": preferences })))
}

pub async fn update_preferences(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    ApiJson(body): ApiJson<PreferencesRequest>,
) -> Result<Json<Value>, CoreError> {
    let preferences = body
        .preferences
        .ok_or_else(|| CoreError::validation("Preferences object required"))?;
    let saved = state
        .pipeline
        .update_preferences(&user_id, preferences)
        .await?;
    Ok(Json(json!({ "success": true, "preferences": saved })))
}
