// routes/documents.rs
// GET  /api/docs/contract-documents?contractId=... -> documents of a contract, newest first
// POST /api/docs/contract-documents                -> store a generated document

use std::{str::FromStr, sync::Arc};

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::{
    models::ContractDocument,
    state::{AppState, create_document, get_contract_by_id, list_documents_for_contract},
};

use super::{JsonBody, json_error};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentsQuery {
    #[serde(default)]
    contract_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentCreateRequest {
    #[serde(default)]
    contract_id: Option<String>,
    #[serde(default)]
    doc_type: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    meta: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub struct DocumentRow {
    id: String,
    contract_id: String,
    doc_type: String,
    title: String,
    content: String,
    meta: Option<serde_json::Value>,
    created_at: Option<String>,
}

impl DocumentRow {
    fn from_document(document: ContractDocument) -> Option<Self> {
        let id = document.id?;
        Some(DocumentRow {
            id: id.to_hex(),
            contract_id: document.contract_id.to_hex(),
            doc_type: document.doc_type,
            title: document.title,
            content: document.content,
            meta: document.meta,
            created_at: document
                .created_at
                .and_then(|dt| dt.try_to_rfc3339_string().ok()),
        })
    }
}

fn require_contract_id(value: Option<String>) -> Result<ObjectId, Response> {
    let raw = value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| json_error(StatusCode::BAD_REQUEST, "contractId required"))?;
    ObjectId::from_str(raw.trim())
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid contractId"))
}

pub async fn documents_index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DocumentsQuery>,
) -> Response {
    let contract_id = match require_contract_id(query.contract_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match list_documents_for_contract(&state, &contract_id).await {
        Ok(documents) => {
            let rows: Vec<DocumentRow> = documents
                .into_iter()
                .filter_map(DocumentRow::from_document)
                .collect();
            Json(serde_json::json!({ "ok": true, "data": rows })).into_response()
        }
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("db error: {e}")),
    }
}

pub async fn documents_create(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<DocumentCreateRequest>,
) -> Response {
    let contract_id = match require_contract_id(body.contract_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if body.doc_type.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "docType required");
    }
    if body.title.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "title required");
    }
    if body.content.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "content required");
    }

    match get_contract_by_id(&state, &contract_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "contract not found"),
        Err(e) => {
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("db error: {e}"));
        }
    }

    match create_document(
        &state,
        &contract_id,
        &body.doc_type,
        &body.title,
        &body.content,
        body.meta,
    )
    .await
    {
        Ok(id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "ok": true, "id": id.to_hex() })),
        )
            .into_response(),
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("db error: {e}")),
    }
}
