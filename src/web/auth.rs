// Auth middleware — bearer token validation.
//
// Auth check:
//   Authorization: Bearer <token> → IdentityProvider::authenticate → user id
//     missing header: 401 "Authorization required"
//     rejected token: 401 "Invalid authorization"
//     provider down:  500
//
// On success the user id is inserted as `AuthUser` for handlers to extract.

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use super::{AppState, AuthUser};

/// Axum middleware: reject requests without a valid bearer token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&request) else {
        return super::api_error(StatusCode::UNAUTHORIZED, "Authorization required");
    };

    let user_id = match state.identity.authenticate(token).await {
        Ok(id) => id,
        Err(e) => {
            debug!(error = %e, "Rejected bearer token");
            return e.into_response();
        }
    };

    request.extensions_mut().insert(AuthUser(user_id));
    next.run(request).await
}

/// Extract the token from `Authorization: Bearer <token>`.
fn bearer_token(request: &Request) -> Option<&str> {
    let value = request.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
