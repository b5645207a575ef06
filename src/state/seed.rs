use anyhow::{Context, Result};
use chrono::NaiveDate;
use mongodb::{Database, IndexModel, bson::doc, options::IndexOptions};
use serde::de::DeserializeOwned;
use std::{env, fs};

use crate::models::{Answer, Contract, ContractDocument, ContractInput};

use super::contracts::{build_contract, validate_contract_input};

pub(super) async fn is_database_empty(db: &Database) -> Result<bool> {
    let contracts = db.collection::<Contract>("contracts");
    let count = contracts.estimated_document_count().await?;
    Ok(count == 0)
}

pub(super) fn load_seed_contracts() -> Result<Vec<ContractInput>> {
    load_json_array("CONTRACTS_FILE", "./data/contracts.json")
}

pub(super) fn load_json_array<T: DeserializeOwned>(env_key: &str, default_path: &str) -> Result<Vec<T>> {
    let path = env::var(env_key).unwrap_or_else(|_| default_path.to_string());
    if let Ok(contents) = fs::read_to_string(&path) {
        let parsed = serde_json::from_str::<Vec<T>>(&contents)
            .with_context(|| format!("invalid seed file {path}"))?;
        Ok(parsed)
    } else {
        Ok(Vec::new())
    }
}

pub(super) async fn ensure_collections(db: &Database) -> Result<()> {
    let existing = db.list_collection_names().await?;
    if !existing.iter().any(|name| name == "contracts") {
        db.create_collection("contracts").await?;
    }
    for name in ["contract_documents", "questions", "answers"] {
        if !existing.iter().any(|existing| existing == name) {
            db.create_collection(name).await?;
        }
    }

    // Sync passes filter by status; documents and answers list by parent.
    db.collection::<Contract>("contracts")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "status": 1 })
                .options(IndexOptions::builder().name("status_idx".to_string()).build())
                .build(),
        )
        .await
        .ok();
    db.collection::<ContractDocument>("contract_documents")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "contract_id": 1, "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("contract_created_idx".to_string())
                        .build(),
                )
                .build(),
        )
        .await
        .ok();
    db.collection::<Answer>("answers")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "question_id": 1, "created_at": 1 })
                .options(
                    IndexOptions::builder()
                        .name("question_created_idx".to_string())
                        .build(),
                )
                .build(),
        )
        .await
        .ok();
    Ok(())
}

/// Inserts valid seed contracts; invalid entries are logged and skipped.
pub(super) async fn seed_contracts(
    db: &Database,
    inputs: &[ContractInput],
    today: NaiveDate,
) -> Result<usize> {
    let coll = db.collection::<Contract>("contracts");
    let mut inserted = 0;
    for input in inputs {
        if let Err(err) = validate_contract_input(input) {
            tracing::warn!(title = %input.title, error = %err, "skipping seed contract");
            continue;
        }
        coll.insert_one(build_contract(input, today)).await?;
        inserted += 1;
    }
    Ok(inserted)
}
