//! Expense routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use roomie_core::types::{CreateExpenseInput, UpdateExpenseInput};

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the expense routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", axum::routing::post(create_expense))
        .route(
            "/expenses/{expense_id}",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
        .route("/expenses/category/{category}", get(list_by_category))
        .route("/groups/{group_id}/expenses", get(list_by_group))
        .route("/groups/{group_id}/expenses/total", get(group_total))
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for creating an expense. The creator is the caller.
#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    /// Category label.
    pub category: String,
    /// Short title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Receipt total.
    pub receipt_total: Decimal,
    /// Group the expense belongs to.
    pub group_id: Uuid,
    /// Tenants sharing the expense, the caller included.
    pub participants: Vec<Uuid>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/expenses` - Create an expense and its splits.
async fn create_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateExpenseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let creator = state.aggregation.tenant_for_user(auth.user_id()).await?;

    let created = state
        .expenses
        .create_expense(CreateExpenseInput {
            category: payload.category,
            title: payload.title,
            description: payload.description,
            receipt_total: payload.receipt_total,
            group_id: payload.group_id.into(),
            created_by: creator.id,
            participants: payload.participants.into_iter().map(Into::into).collect(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET `/expenses/{expense_id}` - Expense with its splits.
async fn get_expense(
    State(state): State<AppState>,
    Path(expense_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let expense = state
        .expenses
        .get_expense_with_splits(expense_id.into())
        .await?;
    Ok(Json(expense))
}

/// PUT `/expenses/{expense_id}` - Update expense fields; splits are untouched.
async fn update_expense(
    State(state): State<AppState>,
    Path(expense_id): Path<Uuid>,
    Json(payload): Json<UpdateExpenseInput>,
) -> Result<impl IntoResponse, ApiError> {
    let expense = state
        .expenses
        .update_expense(expense_id.into(), payload)
        .await?;
    Ok(Json(expense))
}

/// DELETE `/expenses/{expense_id}` - Delete an expense and its splits.
async fn delete_expense(
    State(state): State<AppState>,
    Path(expense_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.expenses.delete_expense(expense_id.into()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/expenses/category/{category}` - Expenses with a category label.
async fn list_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let expenses = state.expenses.get_expenses_by_category(&category).await?;
    Ok(Json(json!({ "expenses": expenses })))
}

/// GET `/groups/{group_id}/expenses` - A group's expenses, newest first.
async fn list_by_group(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let expenses = state.expenses.get_expenses_by_group(group_id.into()).await?;
    Ok(Json(json!({ "expenses": expenses })))
}

/// GET `/groups/{group_id}/expenses/total` - Sum of a group's receipt totals.
async fn group_total(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let total = state
        .expenses
        .get_total_expenses_by_group(group_id.into())
        .await?;
    Ok(Json(json!({ "group_id": group_id, "total": total })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::{TestApp, json_body};

    fn groceries(app: &TestApp, total: &str) -> serde_json::Value {
        json!({
            "category": "Groceries",
            "title": "Weekly shop",
            "receipt_total": total,
            "group_id": app.group.id,
            "participants": [app.alice.id, app.bob.id, app.carol.id],
        })
    }

    #[tokio::test]
    async fn test_create_expense_splits_between_participants() {
        let app = TestApp::new().await;
        let response = app
            .send(&app.alice, "POST", "/expenses", Some(groceries(&app, "90.00")))
            .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["receipt_total"], "90.00");
        assert_eq!(body["created_by"], json!(app.alice.id));

        let splits = body["splits"].as_array().unwrap();
        assert_eq!(splits.len(), 3);
        assert!(splits.iter().all(|s| s["split_amount"] == "30.00"));
        let paid: Vec<_> = splits.iter().filter(|s| s["status"] == "paid").collect();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0]["assigned_to"], json!(app.alice.id));
    }

    #[tokio::test]
    async fn test_create_expense_without_caller_is_rejected() {
        let app = TestApp::new().await;
        let mut body = groceries(&app, "90.00");
        body["participants"] = json!([app.bob.id, app.carol.id]);

        let response = app.send(&app.alice, "POST", "/expenses", Some(body)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "CREATOR_NOT_PARTICIPANT");
    }

    #[tokio::test]
    async fn test_get_update_and_delete_expense() {
        let app = TestApp::new().await;
        let created = json_body(
            app.send(&app.alice, "POST", "/expenses", Some(groceries(&app, "60")))
                .await,
        )
        .await;
        let uri = format!("/expenses/{}", created["id"].as_str().unwrap());

        let fetched = app.send(&app.bob, "GET", &uri, None).await;
        assert_eq!(fetched.status(), StatusCode::OK);
        assert_eq!(json_body(fetched).await["splits"].as_array().unwrap().len(), 3);

        let updated = app
            .send(&app.alice, "PUT", &uri, Some(json!({ "title": "Big shop" })))
            .await;
        assert_eq!(updated.status(), StatusCode::OK);
        assert_eq!(json_body(updated).await["title"], "Big shop");

        let deleted = app.send(&app.alice, "DELETE", &uri, None).await;
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let missing = app.send(&app.alice, "GET", &uri, None).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(missing).await["error"], "EXPENSE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_group_listing_and_total() {
        let app = TestApp::new().await;
        for total in ["90.00", "10.50"] {
            app.send(&app.alice, "POST", "/expenses", Some(groceries(&app, total)))
                .await;
        }

        let listed = app
            .send(&app.bob, "GET", &format!("/groups/{}/expenses", app.group.id), None)
            .await;
        assert_eq!(
            json_body(listed).await["expenses"].as_array().unwrap().len(),
            2
        );

        let total = app
            .send(
                &app.bob,
                "GET",
                &format!("/groups/{}/expenses/total", app.group.id),
                None,
            )
            .await;
        assert_eq!(json_body(total).await["total"], "100.50");

        let by_category = app
            .send(&app.carol, "GET", "/expenses/category/groceries", None)
            .await;
        assert_eq!(
            json_body(by_category).await["expenses"]
                .as_array()
                .unwrap()
                .len(),
            2
        );
    }
}
