// routes/drafts.rs
// POST /api/ai/answer-draft  { "question": { "id"?, "title", "body" } }       -> { "draft" }
// POST /api/ai/notice-draft  { "context": { "title", "body", ... } }          -> { "draft" }
// POST /api/docs/content-proof { "contractId", "purpose", "inputs" }         -> { "ok", "draft", "debug" }

use std::{str::FromStr, sync::Arc};

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
    drafts::{
        self, DraftError, NoticeContext, NoticePurpose, Prompt, answer_prompt,
        contract_notice_prompt, notice_facts, notice_prompt,
    },
    state::{AppState, get_contract_by_id, get_question_by_id},
};

use super::{JsonBody, json_error};

#[derive(Deserialize)]
pub struct QuestionInput {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
}

#[derive(Deserialize)]
pub struct AnswerDraftRequest {
    #[serde(default)]
    question: Option<QuestionInput>,
}

#[derive(Deserialize)]
pub struct NoticeDraftRequest {
    #[serde(default)]
    context: Option<NoticeContext>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentProofRequest {
    #[serde(default)]
    contract_id: Option<String>,
    #[serde(default)]
    purpose: Option<String>,
    #[serde(default)]
    inputs: Map<String, Value>,
}

fn draft_error_response(err: DraftError) -> Response {
    tracing::warn!(error = %err, "draft generation failed");
    let message = err.to_string();
    match err {
        DraftError::MissingApiKey => json_error(StatusCode::INTERNAL_SERVER_ERROR, message),
        _ => json_error(StatusCode::BAD_GATEWAY, message),
    }
}

async fn run_draft(state: &AppState, prompt: &Prompt) -> Result<String, Response> {
    drafts::complete(&state.http, &state.drafts, prompt)
        .await
        .map_err(draft_error_response)
}

pub async fn answer_draft(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<AnswerDraftRequest>,
) -> Response {
    let Some(mut question) = body.question else {
        return json_error(StatusCode::BAD_REQUEST, "question.title and question.body are required");
    };

    // A stored question fills in whatever the request left out.
    if let Some(raw_id) = question.id.as_deref().filter(|v| !v.trim().is_empty()) {
        let Ok(question_id) = ObjectId::from_str(raw_id.trim()) else {
            return json_error(StatusCode::BAD_REQUEST, "invalid question id");
        };
        match get_question_by_id(&state, &question_id).await {
            Ok(Some(stored)) => {
                if question.title.trim().is_empty() {
                    question.title = stored.title;
                }
                if question.body.trim().is_empty() {
                    question.body = stored.body;
                }
            }
            Ok(None) => return json_error(StatusCode::NOT_FOUND, "question not found"),
            Err(e) => {
                return json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("db error: {e}"));
            }
        }
    }
    if question.title.trim().is_empty() || question.body.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "question.title and question.body are required");
    }

    match run_draft(&state, &answer_prompt(&question.title, &question.body)).await {
        Ok(draft) => Json(serde_json::json!({ "draft": draft })).into_response(),
        Err(resp) => resp,
    }
}

pub async fn notice_draft(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<NoticeDraftRequest>,
) -> Response {
    let Some(context) = body
        .context
        .filter(|c| !c.title.trim().is_empty() && !c.body.trim().is_empty())
    else {
        return json_error(StatusCode::BAD_REQUEST, "context.title and context.body are required");
    };

    match run_draft(&state, &notice_prompt(&context)).await {
        Ok(draft) => Json(serde_json::json!({ "draft": draft })).into_response(),
        Err(resp) => resp,
    }
}

pub async fn content_proof_draft(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<ContentProofRequest>,
) -> Response {
    let Some(raw_id) = body.contract_id.filter(|v| !v.trim().is_empty()) else {
        return json_error(StatusCode::BAD_REQUEST, "contractId required");
    };
    let Ok(contract_id) = ObjectId::from_str(raw_id.trim()) else {
        return json_error(StatusCode::BAD_REQUEST, "invalid contractId");
    };
    let purpose = match body.purpose.as_deref() {
        None => NoticePurpose::RentOverdue,
        Some(value) => match NoticePurpose::parse(value) {
            Some(purpose) => purpose,
            None => return json_error(StatusCode::BAD_REQUEST, "invalid purpose"),
        },
    };

    let contract = match get_contract_by_id(&state, &contract_id).await {
        Ok(Some(contract)) => contract,
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "not found"),
        Err(e) => {
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("db error: {e}"));
        }
    };

    let facts = notice_facts(&contract, purpose, &body.inputs, state.clock.today());
    let prompt = contract_notice_prompt(&contract, &facts);

    match run_draft(&state, &prompt).await {
        Ok(draft) => Json(serde_json::json!({
            "ok": true,
            "draft": draft,
            "debug": {
                "purpose": purpose,
                "inputs": body.inputs,
                "facts": facts,
            },
        }))
        .into_response(),
        Err(resp) => resp,
    }
}
