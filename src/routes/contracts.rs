// routes/contracts.rs
// Contract CRUD plus the three recalculation endpoints:
// POST /api/contracts/recalc-overdue { "contractId": "..." } -> one contract
// POST /api/contracts/sync-overdue                           -> every open contract
// POST /api/contracts/sync                                   -> lease expiry pass

use std::{str::FromStr, sync::Arc};

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::{
    models::{Contract, ContractInput, ContractStatus},
    overdue::OverdueError,
    reconcile::{self, ReconcileError},
    state::{
        AppState, create_contract, delete_contract, get_contract_by_id, list_contracts,
        update_contract, validate_contract_input,
    },
};

use super::{JsonBody, json_error};

#[derive(Serialize)]
pub struct ContractRow {
    id: String,
    title: String,
    address: String,
    landlord_name: String,
    tenant_name: String,
    lease_start: Option<NaiveDate>,
    lease_end: Option<NaiveDate>,
    deposit: i64,
    rent: i64,
    payday: Option<i32>,
    status: ContractStatus,
    special_terms: Option<String>,
    next_due_date: Option<NaiveDate>,
    overdue_days: i64,
}

impl ContractRow {
    fn from_contract(contract: Contract) -> Option<Self> {
        let id = contract.id?;
        Some(ContractRow {
            id: id.to_hex(),
            title: contract.title,
            address: contract.address,
            landlord_name: contract.landlord_name,
            tenant_name: contract.tenant_name,
            lease_start: contract.lease_start,
            lease_end: contract.lease_end,
            deposit: contract.deposit,
            rent: contract.rent,
            payday: contract.payday,
            status: contract.status,
            special_terms: contract.special_terms,
            next_due_date: contract.next_due_date,
            overdue_days: contract.overdue_days,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalcRequest {
    #[serde(default)]
    contract_id: Option<String>,
}

fn parse_id(value: &str) -> Result<ObjectId, Response> {
    ObjectId::from_str(value.trim())
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid contract id"))
}

pub async fn contracts_index(State(state): State<Arc<AppState>>) -> Response {
    match list_contracts(&state).await {
        Ok(contracts) => {
            let rows: Vec<ContractRow> = contracts
                .into_iter()
                .filter_map(ContractRow::from_contract)
                .collect();
            Json(serde_json::json!({ "ok": true, "data": rows })).into_response()
        }
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("db error: {e}")),
    }
}

pub async fn contracts_show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match get_contract_by_id(&state, &id).await {
        Ok(Some(contract)) => match ContractRow::from_contract(contract) {
            Some(row) => Json(serde_json::json!({ "ok": true, "data": row })).into_response(),
            None => json_error(StatusCode::INTERNAL_SERVER_ERROR, "contract missing _id"),
        },
        Ok(None) => json_error(StatusCode::NOT_FOUND, "not found"),
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("db error: {e}")),
    }
}

pub async fn contracts_create(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<ContractInput>,
) -> Response {
    if let Err(e) = validate_contract_input(&input) {
        return json_error(StatusCode::BAD_REQUEST, e.to_string());
    }
    match create_contract(&state, &input, state.clock.today()).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "ok": true, "id": id.to_hex() })),
        )
            .into_response(),
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("db error: {e}")),
    }
}

pub async fn contracts_update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<ContractInput>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(e) = validate_contract_input(&input) {
        return json_error(StatusCode::BAD_REQUEST, e.to_string());
    }
    match get_contract_by_id(&state, &id).await {
        Ok(Some(_)) => {}
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "not found"),
        Err(e) => {
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("db error: {e}"));
        }
    }
    match update_contract(&state, &id, &input, state.clock.today()).await {
        Ok(()) => Json(serde_json::json!({ "ok": true })).into_response(),
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("db error: {e}")),
    }
}

pub async fn contracts_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match delete_contract(&state, &id).await {
        Ok(()) => Json(serde_json::json!({ "ok": true })).into_response(),
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("db error: {e}")),
    }
}

pub async fn contracts_recalc_overdue(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<RecalcRequest>,
) -> Response {
    let Some(raw_id) = body.contract_id.filter(|v| !v.trim().is_empty()) else {
        return json_error(StatusCode::BAD_REQUEST, "contractId required");
    };
    let id = match parse_id(&raw_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match reconcile::recalc_contract(state.as_ref(), &id, state.clock.today()).await {
        Ok(updated) => Json(serde_json::json!({ "ok": true, "updated": updated })).into_response(),
        Err(ReconcileError::NotFound(_)) => json_error(StatusCode::NOT_FOUND, "not found"),
        Err(ReconcileError::MissingPayday(_))
        | Err(ReconcileError::Overdue(OverdueError::InvalidPayday(_))) => {
            json_error(StatusCode::BAD_REQUEST, "invalid payday")
        }
        Err(ReconcileError::Overdue(e)) => json_error(StatusCode::BAD_REQUEST, e.to_string()),
        Err(ReconcileError::Store(e)) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("db error: {e}"))
        }
    }
}

pub async fn contracts_sync_overdue(State(state): State<Arc<AppState>>) -> Response {
    let today = state.clock.today();
    match reconcile::sync_overdue(state.as_ref(), today).await {
        Ok(report) => Json(serde_json::json!({
            "ok": true,
            "todayYMD": today.to_string(),
            "report": report,
        }))
        .into_response(),
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("db error: {e}")),
    }
}

pub async fn contracts_sync_expired(State(state): State<Arc<AppState>>) -> Response {
    let today = state.clock.today();
    match reconcile::sync_expired(state.as_ref(), today).await {
        Ok(report) => Json(serde_json::json!({
            "ok": true,
            "todayYMD": today.to_string(),
            "report": report,
        }))
        .into_response(),
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("db error: {e}")),
    }
}
