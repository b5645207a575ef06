use anyhow::{Context, Result, bail};
use futures::stream::TryStreamExt;
use mongodb::bson::{DateTime, doc, oid::ObjectId};
use std::time::SystemTime;

use crate::models::{Answer, CaseStage, Question};

use super::AppState;

/// Newest questions shown by the listing.
pub const QUESTION_LIST_LIMIT: i64 = 50;

pub async fn list_questions(state: &AppState) -> Result<Vec<Question>> {
    let mut cursor = state
        .questions
        .find(doc! {})
        .sort(doc! { "created_at": -1, "_id": -1 })
        .limit(QUESTION_LIST_LIMIT)
        .await?;
    let mut items = Vec::new();
    while let Some(question) = cursor.try_next().await? {
        items.push(question);
    }
    Ok(items)
}

pub async fn get_question_by_id(state: &AppState, id: &ObjectId) -> Result<Option<Question>> {
    state
        .questions
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

pub async fn create_question(state: &AppState, title: &str, body: &str) -> Result<ObjectId> {
    let title = title.trim();
    let body = body.trim();
    if title.is_empty() {
        bail!("title is required");
    }
    if body.is_empty() {
        bail!("body is required");
    }

    let res = state
        .questions
        .insert_one(Question {
            id: None,
            title: title.to_string(),
            body: body.to_string(),
            case_stage: CaseStage::default(),
            created_at: Some(DateTime::from_system_time(SystemTime::now())),
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .context("question insert missing _id")
}

/// Answers of a question, oldest first.
pub async fn list_answers_for_question(
    state: &AppState,
    question_id: &ObjectId,
) -> Result<Vec<Answer>> {
    let mut cursor = state
        .answers
        .find(doc! { "question_id": question_id })
        .sort(doc! { "created_at": 1, "_id": 1 })
        .await?;
    let mut items = Vec::new();
    while let Some(answer) = cursor.try_next().await? {
        items.push(answer);
    }
    Ok(items)
}

pub async fn get_question_with_answers(
    state: &AppState,
    id: &ObjectId,
) -> Result<Option<(Question, Vec<Answer>)>> {
    let Some(question) = get_question_by_id(state, id).await? else {
        return Ok(None);
    };
    let answers = list_answers_for_question(state, id).await?;
    Ok(Some((question, answers)))
}

pub async fn create_answer(
    state: &AppState,
    question_id: &ObjectId,
    body: &str,
    is_ai_draft: bool,
) -> Result<ObjectId> {
    let body = body.trim();
    if body.is_empty() {
        bail!("body is required");
    }
    get_question_by_id(state, question_id)
        .await?
        .context("question not found")?;

    let res = state
        .answers
        .insert_one(Answer {
            id: None,
            question_id: *question_id,
            body: body.to_string(),
            is_ai_draft,
            created_at: Some(DateTime::from_system_time(SystemTime::now())),
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .context("answer insert missing _id")
}

/// Returns `false` when no question has this id.
pub async fn set_case_stage(state: &AppState, id: &ObjectId, stage: CaseStage) -> Result<bool> {
    let res = state
        .questions
        .update_one(
            doc! { "_id": id },
            doc! { "$set": { "case_stage": stage.as_str() } },
        )
        .await?;
    Ok(res.matched_count > 0)
}
