// GET /analytics/user — the caller's snapshot, rolled forward to today.

use axum::extract::State;
use axum::{Extension, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::error::CoreError;
use crate::web::{AppState, AuthUser};

/// Returns `{ analytics }`: the snapshot plus derived `goalCompletion` and
/// `approvedToday`.
pub async fn get_user_analytics(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<Value>, CoreError> {
    let snapshot = state.pipeline.snapshot(&user_id, Utc::now()).await?;

    let mut analytics = serde_json::to_value(&snapshot)?;
    if let Some(fields) = analytics.as_object_mut() {
        fields.insert("goalCompletion".into(), json!(snapshot.goal_completion()));
        fields.insert("approvedToday".into(), json!(snapshot.approved_today()));
    }

    Ok(Json(json!({ "analytics": analytics })))
}
