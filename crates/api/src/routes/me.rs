//! The caller's own split views.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde_json::json;

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the per-tenant view routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me/splits/to-pay", get(to_pay))
        .route("/me/splits/to-receive", get(to_receive))
        .route("/me/splits/history", get(history))
        .route("/me/splits/summary", get(summary))
}

/// GET `/me/splits/to-pay` - Open splits the caller owes.
async fn to_pay(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let splits = state.aggregation.to_pay(auth.user_id()).await?;
    Ok(Json(json!({ "splits": splits })))
}

/// GET `/me/splits/to-receive` - Open splits owed to the caller.
async fn to_receive(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let splits = state.aggregation.to_receive(auth.user_id()).await?;
    Ok(Json(json!({ "splits": splits })))
}

/// GET `/me/splits/history` - Settled splits on either side.
async fn history(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let splits = state.aggregation.history(auth.user_id()).await?;
    Ok(Json(json!({ "splits": splits })))
}

/// GET `/me/splits/summary`
async fn summary(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.aggregation.summary(auth.user_id()).await?))
}
