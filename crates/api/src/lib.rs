//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes over the expense, split and aggregation services
//! - Authentication middleware
//! - JSON error responses

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use roomie_core::{
    AggregationService, ExpenseService, LedgerStore, NotificationDispatcher, SplitService,
};
use roomie_shared::JwtService;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Expense creation, queries and deletion.
    pub expenses: Arc<ExpenseService>,
    /// Split lifecycle and direct split maintenance.
    pub splits: Arc<SplitService>,
    /// Per-tenant views.
    pub aggregation: Arc<AggregationService>,
    /// JWT service for token verification.
    pub jwt_service: Arc<JwtService>,
}

impl AppState {
    /// Wires the services over one store and one notifier.
    #[must_use]
    pub fn new(
        store: Arc<dyn LedgerStore>,
        notifier: Arc<dyn NotificationDispatcher>,
        jwt_service: JwtService,
    ) -> Self {
        Self {
            expenses: Arc::new(ExpenseService::new(store.clone(), notifier.clone())),
            splits: Arc::new(SplitService::new(store.clone(), notifier)),
            aggregation: Arc::new(AggregationService::new(store)),
            jwt_service: Arc::new(jwt_service),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
