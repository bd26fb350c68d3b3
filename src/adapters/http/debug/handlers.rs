//! Inspection endpoints.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::dto::{
    ClaimView, ClaimsQueryParams, OutboxEntryView, OutboxQueryParams, ResetResponse,
    DEFAULT_LIMIT,
};
use crate::adapters::http::dto::ErrorResponse;
use crate::adapters::http::AppState;
use crate::application::ListOutboxQuery;
use crate::domain::foundation::DomainError;
use crate::domain::outbox::OutboxStatus;

/// GET /debug/outbox
pub async fn list_outbox(
    State(state): State<AppState>,
    Query(params): Query<OutboxQueryParams>,
) -> Result<Json<Vec<OutboxEntryView>>, DebugApiError> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<OutboxStatus>)
        .transpose()
        .map_err(|e| DebugApiError::BadRequest(e.to_string()))?;

    let entries = state
        .inspection_handler()
        .list_outbox(ListOutboxQuery {
            status,
            limit: params.limit.unwrap_or(DEFAULT_LIMIT),
        })
        .await?;

    Ok(Json(entries.into_iter().map(OutboxEntryView::from).collect()))
}

/// GET /debug/claims
pub async fn list_claims(
    State(state): State<AppState>,
    Query(params): Query<ClaimsQueryParams>,
) -> Result<Json<Vec<ClaimView>>, DebugApiError> {
    let claims = state
        .inspection_handler()
        .list_claims(params.limit.unwrap_or(DEFAULT_LIMIT))
        .await?;

    Ok(Json(claims.into_iter().map(ClaimView::from).collect()))
}

/// POST /debug/outbox/reset
pub async fn reset_outbox(
    State(state): State<AppState>,
) -> Result<Json<ResetResponse>, DebugApiError> {
    let result = state.reset_unfinished_handler().handle().await?;
    tracing::warn!(
        entries_deleted = result.entries_deleted,
        claims_marked_error = result.claims_marked_error,
        "Outbox reset by operator"
    );
    Ok(Json(result.into()))
}

#[derive(Debug)]
pub enum DebugApiError {
    BadRequest(String),
    Domain(DomainError),
}

impl From<DomainError> for DebugApiError {
    fn from(err: DomainError) -> Self {
        DebugApiError::Domain(err)
    }
}

impl IntoResponse for DebugApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            DebugApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("INVALID_QUERY", message),
            ),
            DebugApiError::Domain(e) => {
                tracing::error!(error = %e, "Inspection query failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(e.code.to_string(), e.message),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
