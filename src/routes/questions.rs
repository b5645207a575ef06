// routes/questions.rs
// GET  /api/questions                     -> latest questions, newest first
// POST /api/questions                     { "title", "body" }
// GET  /api/questions/{id}                -> question with its answers, oldest first
// POST /api/questions/{id}/answers        { "body", "isAiDraft" }
// POST /api/questions/{id}/stage          { "caseStage" }

use std::{str::FromStr, sync::Arc};

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::{
    models::{Answer, CaseStage, Question},
    state::{
        AppState, create_answer, create_question, get_question_by_id, get_question_with_answers,
        list_questions, set_case_stage,
    },
};

use super::{JsonBody, json_error};

#[derive(Deserialize)]
pub struct QuestionCreateRequest {
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerCreateRequest {
    #[serde(default)]
    body: String,
    #[serde(default)]
    is_ai_draft: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRequest {
    #[serde(default)]
    case_stage: Option<String>,
}

#[derive(Serialize)]
pub struct QuestionRow {
    id: String,
    title: String,
    body: String,
    case_stage: CaseStage,
    created_at: Option<String>,
}

impl QuestionRow {
    fn from_question(question: Question) -> Option<Self> {
        let id = question.id?;
        Some(QuestionRow {
            id: id.to_hex(),
            title: question.title,
            body: question.body,
            case_stage: question.case_stage,
            created_at: question
                .created_at
                .and_then(|dt| dt.try_to_rfc3339_string().ok()),
        })
    }
}

#[derive(Serialize)]
pub struct AnswerRow {
    id: String,
    question_id: String,
    body: String,
    is_ai_draft: bool,
    created_at: Option<String>,
}

impl AnswerRow {
    fn from_answer(answer: Answer) -> Option<Self> {
        let id = answer.id?;
        Some(AnswerRow {
            id: id.to_hex(),
            question_id: answer.question_id.to_hex(),
            body: answer.body,
            is_ai_draft: answer.is_ai_draft,
            created_at: answer
                .created_at
                .and_then(|dt| dt.try_to_rfc3339_string().ok()),
        })
    }
}

fn parse_id(value: &str) -> Result<ObjectId, Response> {
    ObjectId::from_str(value.trim())
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid question id"))
}

pub async fn questions_index(State(state): State<Arc<AppState>>) -> Response {
    match list_questions(&state).await {
        Ok(questions) => {
            let rows: Vec<QuestionRow> = questions
                .into_iter()
                .filter_map(QuestionRow::from_question)
                .collect();
            Json(serde_json::json!({ "ok": true, "data": rows })).into_response()
        }
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("db error: {e}")),
    }
}

pub async fn questions_create(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<QuestionCreateRequest>,
) -> Response {
    if body.title.trim().is_empty() || body.body.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "title and body are required");
    }
    match create_question(&state, &body.title, &body.body).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "ok": true, "id": id.to_hex() })),
        )
            .into_response(),
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("db error: {e}")),
    }
}

pub async fn questions_show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match get_question_with_answers(&state, &id).await {
        Ok(Some((question, answers))) => {
            let Some(question) = QuestionRow::from_question(question) else {
                return json_error(StatusCode::INTERNAL_SERVER_ERROR, "question missing _id");
            };
            let answers: Vec<AnswerRow> = answers
                .into_iter()
                .filter_map(AnswerRow::from_answer)
                .collect();
            Json(serde_json::json!({
                "ok": true,
                "data": { "question": question, "answers": answers },
            }))
            .into_response()
        }
        Ok(None) => json_error(StatusCode::NOT_FOUND, "not found"),
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("db error: {e}")),
    }
}

pub async fn answers_create(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<AnswerCreateRequest>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if body.body.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "body required");
    }
    match get_question_by_id(&state, &id).await {
        Ok(Some(_)) => {}
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "question not found"),
        Err(e) => {
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("db error: {e}"));
        }
    }
    match create_answer(&state, &id, &body.body, body.is_ai_draft).await {
        Ok(answer_id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "ok": true, "id": answer_id.to_hex() })),
        )
            .into_response(),
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("db error: {e}")),
    }
}

pub async fn questions_set_stage(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<StageRequest>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Some(stage) = body.case_stage.as_deref().and_then(CaseStage::parse) else {
        return json_error(StatusCode::BAD_REQUEST, "invalid caseStage");
    };
    match set_case_stage(&state, &id, stage).await {
        Ok(true) => Json(serde_json::json!({ "ok": true, "caseStage": stage })).into_response(),
        Ok(false) => json_error(StatusCode::NOT_FOUND, "not found"),
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("db error: {e}")),
    }
}
