//! Split routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use roomie_core::types::{
    CreateSplitInput, SplitLine, SplitStatus, SplitStatusUpdate, UpdateSplitInput,
};

use crate::{AppState, error::ApiError};

/// Creates the split routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/splits", axum::routing::post(create_split))
        .route(
            "/splits/{split_id}",
            get(get_split).put(update_split).delete(delete_split),
        )
        .route("/splits/{split_id}/status", patch(update_status))
        .route("/tenants/{tenant_id}/splits", get(list_by_tenant))
        .route(
            "/expenses/{expense_id}/splits",
            get(list_by_expense).post(bulk_create),
        )
        .route(
            "/expenses/{expense_id}/splits/status/{status}",
            get(list_by_status),
        )
        .route(
            "/expenses/{expense_id}/splits/status/{status}/total",
            get(total_by_status),
        )
}

/// Request body for adding splits to an existing expense.
#[derive(Debug, Deserialize)]
pub struct BulkCreateSplitsRequest {
    /// Splits to add.
    pub splits: Vec<SplitLine>,
}

fn parse_status(status: &str) -> Result<SplitStatus, ApiError> {
    SplitStatus::parse(status).ok_or_else(|| {
        ApiError::bad_request(
            "INVALID_STATUS",
            "Invalid split status. Must be one of: unpaid, pending, paid",
        )
    })
}

/// POST `/splits` - Create a single split.
async fn create_split(
    State(state): State<AppState>,
    Json(payload): Json<CreateSplitInput>,
) -> Result<impl IntoResponse, ApiError> {
    let split = state.splits.create_split(payload).await?;
    Ok((StatusCode::CREATED, Json(split)))
}

/// GET `/splits/{split_id}`
async fn get_split(
    State(state): State<AppState>,
    Path(split_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.splits.get_split(split_id.into()).await?))
}

/// PUT `/splits/{split_id}` - Correct split fields as given.
async fn update_split(
    State(state): State<AppState>,
    Path(split_id): Path<Uuid>,
    Json(payload): Json<UpdateSplitInput>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state.splits.update_split(split_id.into(), payload).await?,
    ))
}

/// DELETE `/splits/{split_id}`
async fn delete_split(
    State(state): State<AppState>,
    Path(split_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.splits.delete_split(split_id.into()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH `/splits/{split_id}/status` - Move a split through its lifecycle.
async fn update_status(
    State(state): State<AppState>,
    Path(split_id): Path<Uuid>,
    Json(payload): Json<SplitStatusUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state
            .splits
            .update_split_status(split_id.into(), payload)
            .await?,
    ))
}

/// GET `/tenants/{tenant_id}/splits` - Everything a tenant owes.
async fn list_by_tenant(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let splits = state.splits.get_splits_by_tenant(tenant_id.into()).await?;
    Ok(Json(json!({ "splits": splits })))
}

/// GET `/expenses/{expense_id}/splits`
async fn list_by_expense(
    State(state): State<AppState>,
    Path(expense_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let splits = state.splits.get_splits_by_expense(expense_id.into()).await?;
    Ok(Json(json!({ "splits": splits })))
}

/// POST `/expenses/{expense_id}/splits` - Add several splits at once.
async fn bulk_create(
    State(state): State<AppState>,
    Path(expense_id): Path<Uuid>,
    Json(payload): Json<BulkCreateSplitsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let splits = state
        .splits
        .bulk_create_splits(expense_id.into(), payload.splits)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "splits": splits }))))
}

/// GET `/expenses/{expense_id}/splits/status/{status}`
async fn list_by_status(
    State(state): State<AppState>,
    Path((expense_id, status)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let status = parse_status(&status)?;
    let splits = state
        .splits
        .get_splits_by_status(expense_id.into(), status)
        .await?;
    Ok(Json(json!({ "splits": splits })))
}

/// GET `/expenses/{expense_id}/splits/status/{status}/total`
async fn total_by_status(
    State(state): State<AppState>,
    Path((expense_id, status)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let status = parse_status(&status)?;
    let total = state
        .splits
        .get_total_splits_by_status(expense_id.into(), status)
        .await?;
    Ok(Json(json!({
        "expense_id": expense_id,
        "status": status,
        "total": total,
    })))
}
