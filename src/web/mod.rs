// Web server — Axum JSON API behind bearer-token auth.
//
// Every route except /health requires `Authorization: Bearer <token>`,
// checked by the `auth::require_auth` middleware against the configured
// IdentityProvider. Errors are always `{ "error": "..." }`.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Router;
use serde::de::DeserializeOwned;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::CoreError;
use crate::identity::IdentityProvider;
use crate::pipeline::ApprovalPipeline;

pub mod auth;
pub mod handlers;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: ApprovalPipeline,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(pipeline: ApprovalPipeline, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { pipeline, identity }
    }
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(state: AppState, port: u16, bind: &str) -> Result<()> {
    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    info!("InGrow API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    // Authenticated API routes (require a valid bearer token)
    let protected_api = Router::new()
        .route("/comments/generate", post(handlers::comments::generate))
        .route("/comments/approve", post(handlers::comments::approve))
        .route("/comments/skip", post(handlers::comments::skip))
        .route("/analytics/user", get(handlers::analytics::get_user_analytics))
        .route(
            "/settings/preferences",
            put(handlers::settings::update_preferences).get(handlers::settings::get_preferences),
        )
        .route("/posts/feed", get(handlers::feed::get_feed))
        .route("/posts/analyze", post(handlers::feed::analyze_post))
        .route("/profiles", get(handlers::profiles::list_profiles))
        .route("/profiles/track", post(handlers::profiles::track_profile))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    // Public routes (no auth)
    let public_api = Router::new().route("/health", get(handlers::health));

    Router::new()
        .merge(protected_api)
        .merge(public_api)
        .fallback(not_found)
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> Response {
    api_error(StatusCode::NOT_FOUND, "Not found")
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        match self {
            CoreError::Validation(msg) | CoreError::Config(msg) => {
                api_error(StatusCode::BAD_REQUEST, &msg)
            }
            CoreError::Auth(msg) => api_error(StatusCode::UNAUTHORIZED, &msg),
            CoreError::Persistence(msg) => {
                error!(error = %msg, "Store failure");
                api_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not save your changes, please retry",
                )
            }
            CoreError::Internal(msg) => {
                error!(error = %msg, "Internal error");
                api_error(StatusCode::INTERNAL_SERVER_ERROR, &msg)
            }
        }
    }
}

/// `axum::Json` with rejections reported in the `{ "error": ... }` shape.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> Response {
    api_error(StatusCode::BAD_REQUEST, &rejection.body_text())
}

/// The authenticated user id, inserted into request extensions by
/// `require_auth`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);
