//! OAuth redirect target.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use dissic_core::{auth::CallbackParams, AuthError};
use tracing::warn;

use crate::metrics::AUTH_CALLBACKS_TOTAL;
use crate::state::AppState;

/// `GET /spotifyAuth?code=...&state=...`
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    match state.auth().complete(&params).await {
        Ok(()) => {
            AUTH_CALLBACKS_TOTAL.with_label_values(&["success"]).inc();
            Html("<p>dissic is authenticated, you can close this window.</p>").into_response()
        }
        Err(e) => {
            let (status, result) = match &e {
                AuthError::Denied(_) => (StatusCode::FORBIDDEN, "denied"),
                AuthError::MissingCode | AuthError::StateMismatch => {
                    (StatusCode::BAD_REQUEST, "invalid")
                }
                AuthError::AlreadyCompleted => (StatusCode::CONFLICT, "already_completed"),
                _ => (StatusCode::BAD_GATEWAY, "error"),
            };
            AUTH_CALLBACKS_TOTAL.with_label_values(&[result]).inc();
            warn!(error = %e, "Authentication callback rejected");
            (status, format!("Authentication failed: {}", e)).into_response()
        }
    }
}
