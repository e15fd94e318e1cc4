// Comment handlers.
//
// POST /comments/generate — template drafts for a post (timing starts here)
// POST /comments/approve  — record an approval and update analytics
// POST /comments/skip     — record a skip (counts toward the approval rate)

use axum::extract::State;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::analytics::RawAction;
use crate::comments::generate_variants;
use crate::error::CoreError;
use crate::web::{ApiJson, AppState, AuthUser};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub post_id: Option<String>,
    pub post_content: Option<String>,
    pub author_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    pub post_id: Option<String>,
    pub comment_content: Option<String>,
    pub variant_type: Option<String>,
    pub was_edited: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipRequest {
    pub post_id: Option<String>,
    pub variant_type: Option<String>,
}

/// POST /comments/generate — returns `{ variants }`.
pub async fn generate(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    ApiJson(body): ApiJson<GenerateRequest>,
) -> Result<Json<Value>, CoreError> {
    let generated = generate_variants(
        body.post_id.as_deref().unwrap_or_default(),
        body.post_content.as_deref().unwrap_or_default(),
        body.author_name.as_deref(),
        Utc::now(),
    )?;
    state.pipeline.store_generated(&user_id, &generated).await?;
    Ok(Json(json!({ "variants": generated.variants })))
}

/// POST /comments/approve — returns `{ success, approvalRecord }`.
pub async fn approve(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    ApiJson(body): ApiJson<ApproveRequest>,
) -> Result<Json<Value>, CoreError> {
    let action = RawAction {
        post_id: body.post_id,
        comment_content: body.comment_content,
        variant_type: body.variant_type,
        was_edited: body.was_edited,
        outcome: Some("approved".to_string()),
        minutes_to_comment: None,
    };
    let recorded = state
        .pipeline
        .record_action(&user_id, action, Utc::now())
        .await?;
    Ok(Json(json!({
        "success": true,
        "approvalRecord": recorded.approval,
    })))
}

/// POST /comments/skip — returns `{ success }`.
pub async fn skip(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    ApiJson(body): ApiJson<SkipRequest>,
) -> Result<Json<Value>, CoreError> {
    let action = RawAction {
        post_id: body.post_id,
        variant_type: body.variant_type,
        outcome: Some("skipped".to_string()),
        ..RawAction::default()
    };
    state
        .pipeline
        .record_action(&user_id, action, Utc::now())
        .await?;
    Ok(Json(json!({ "success": true })))
}
