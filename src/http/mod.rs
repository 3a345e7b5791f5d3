//! REST boundary for the lifecycle engines. Handlers translate requests into
//! typed commands and map the error taxonomy onto status codes; no lifecycle
//! rule lives here.

mod directory;
mod proposal;
mod tender;

use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{BidstoreError, Result};
use crate::lifecycle::Services;
use crate::store::SqliteStore;

pub type AppState = Services<SqliteStore>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/ping", get(ping))
        .route("/api/tenders", get(tender::list))
        .route("/api/tenders/new", post(tender::create))
        .route("/api/tenders/my", get(tender::my))
        .route("/api/tenders/status", get(tender::status))
        .route("/api/tenders/{tenderId}/edit", patch(tender::edit))
        .route("/api/tenders/{tenderId}/publish", put(tender::publish))
        .route("/api/tenders/{tenderId}/close", put(tender::close))
        .route(
            "/api/tenders/{tenderId}/rollback/{version}",
            put(tender::rollback),
        )
        .route("/api/proposals/new", post(proposal::create))
        .route("/api/proposals/my", get(proposal::my))
        .route("/api/proposals/status", get(proposal::status))
        .route("/api/proposals/tender/{tenderId}", get(proposal::by_tender))
        .route("/api/proposals/{proposalId}/edit", patch(proposal::edit))
        .route("/api/proposals/{proposalId}/publish", put(proposal::publish))
        .route("/api/proposals/{proposalId}/cancel", put(proposal::cancel))
        .route("/api/proposals/{proposalId}/agree", put(proposal::agree))
        .route("/api/proposals/{proposalId}/decline", put(proposal::decline))
        .route(
            "/api/proposals/{proposalId}/rollback/{version}",
            put(proposal::rollback),
        )
        .route("/api/organizations/new", post(directory::create_organization))
        .route(
            "/api/organizations/{organizationId}/responsible",
            post(directory::assign_responsible),
        )
        .route("/api/employees/new", post(directory::create_employee))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API until the listener fails.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn ping() -> &'static str {
    "ok"
}

impl IntoResponse for BidstoreError {
    fn into_response(self) -> Response {
        let status = match &self {
            BidstoreError::Validation(_) => StatusCode::BAD_REQUEST,
            BidstoreError::Forbidden(_) => StatusCode::FORBIDDEN,
            BidstoreError::NotFound(_) => StatusCode::NOT_FOUND,
            BidstoreError::Conflict(_)
            | BidstoreError::InvalidTransition { .. }
            | BidstoreError::NotEditable { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
