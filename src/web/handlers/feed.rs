// Feed handlers.
//
// GET  /posts/feed    — the caller's stored feed (or the sample feed), ranked
// POST /posts/analyze — turn a pasted LinkedIn post URL into a Fast Lane entry

use axum::extract::State;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::CoreError;
use crate::feed::{self, rank, sample_feed, FeedPost};
use crate::pipeline::retry::retry_store;
use crate::store::{self, keys};
use crate::web::{ApiJson, AppState, AuthUser};

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub url: Option<String>,
}

pub async fn get_feed(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<Value>, CoreError> {
    let key = keys::feed_posts(&user_id);
    let kv = state.pipeline.store().as_ref();
    let stored: Option<(i64, Vec<FeedPost>)> =
        retry_store(state.pipeline.policy(), "get_feed", || store::get_typed(kv, &key)).await?;

    let posts = rank(
        stored
            .map(|(_, posts)| posts)
            .unwrap_or_else(|| sample_feed(Utc::now())),
    );
    Ok(Json(json!({ "totalCount": posts.len(), "posts": posts })))
}

/// POST /posts/analyze — returns `{ post }`.
pub async fn analyze_post(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    ApiJson(body): ApiJson<AnalyzeRequest>,
) -> Result<Json<Value>, CoreError> {
    let pipeline = &state.pipeline;
    let post = feed::analyze(
        pipeline.store().as_ref(),
        pipeline.policy(),
        &user_id,
        body.url.as_deref().unwrap_or_default(),
        Utc::now(),
    )
    .await?;
    Ok(Json(json!({ "post": post })))
}
