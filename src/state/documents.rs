use anyhow::{Context, Result, bail};
use futures::stream::TryStreamExt;
use mongodb::bson::{DateTime, doc, oid::ObjectId};
use std::time::SystemTime;

use crate::models::ContractDocument;

use super::AppState;

pub async fn list_documents_for_contract(
    state: &AppState,
    contract_id: &ObjectId,
) -> Result<Vec<ContractDocument>> {
    let mut cursor = state
        .documents
        .find(doc! { "contract_id": contract_id })
        .sort(doc! { "created_at": -1 })
        .await?;
    let mut items = Vec::new();
    while let Some(document) = cursor.try_next().await? {
        items.push(document);
    }
    Ok(items)
}

pub async fn get_document_by_id(
    state: &AppState,
    id: &ObjectId,
) -> Result<Option<ContractDocument>> {
    state
        .documents
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

pub async fn create_document(
    state: &AppState,
    contract_id: &ObjectId,
    doc_type: &str,
    title: &str,
    content: &str,
    meta: Option<serde_json::Value>,
) -> Result<ObjectId> {
    if doc_type.trim().is_empty() {
        bail!("doc_type is required");
    }
    if title.trim().is_empty() {
        bail!("title is required");
    }
    if content.trim().is_empty() {
        bail!("content is required");
    }
    state
        .contracts
        .find_one(doc! { "_id": contract_id })
        .await?
        .context("contract not found")?;

    let res = state
        .documents
        .insert_one(ContractDocument {
            id: None,
            contract_id: *contract_id,
            doc_type: doc_type.trim().to_string(),
            title: title.trim().to_string(),
            content: content.to_string(),
            meta,
            created_at: Some(DateTime::from_system_time(SystemTime::now())),
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .context("document insert missing _id")
}
