// routes/mod.rs
// Route handlers, their re-exports, and the router that wires them.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::state::AppState;

pub mod contracts;
pub mod documents;
pub mod drafts;
pub mod questions;

pub use contracts::*;
pub use documents::*;
pub use drafts::*;
pub use questions::*;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/contracts",
            get(contracts_index).post(contracts_create),
        )
        .route("/api/contracts/recalc-overdue", post(contracts_recalc_overdue))
        .route("/api/contracts/sync-overdue", post(contracts_sync_overdue))
        .route("/api/contracts/sync", post(contracts_sync_expired))
        .route("/api/contracts/{id}", get(contracts_show))
        .route("/api/contracts/{id}/update", post(contracts_update))
        .route("/api/contracts/{id}/delete", post(contracts_delete))
        .route(
            "/api/docs/contract-documents",
            get(documents_index).post(documents_create),
        )
        .route(
            "/api/questions",
            get(questions_index).post(questions_create),
        )
        .route("/api/questions/{id}", get(questions_show))
        .route("/api/questions/{id}/answers", post(answers_create))
        .route("/api/questions/{id}/stage", post(questions_set_stage))
        .route("/api/docs/content-proof", post(content_proof_draft))
        .route("/api/ai/answer-draft", post(answer_draft))
        .route("/api/ai/notice-draft", post(notice_draft))
        .with_state(state)
}

pub(crate) fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": message.into() })),
    )
        .into_response()
}

/// `Json` extractor that reports a malformed or mistyped body as a 400 with
/// the same `{"error": ...}` shape as every other failure.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection, "rejected request body");
                Err(json_error(StatusCode::BAD_REQUEST, rejection.body_text()))
            }
        }
    }
}
