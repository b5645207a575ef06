// state module: AppState, initialization, and re-exports of submodules.

use anyhow::Result;
use mongodb::{Client, Collection};
use std::{env, sync::Arc};

use crate::clock::{Clock, SystemClock};
use crate::drafts::DraftSettings;
use crate::models::{Answer, Contract, ContractDocument, Question};

mod seed;
mod contracts;
mod documents;
mod questions;

pub use contracts::*;
pub use documents::*;
pub use questions::*;

#[derive(Clone)]
pub struct AppState {
    pub contracts: Collection<Contract>,
    pub documents: Collection<ContractDocument>,
    pub questions: Collection<Question>,
    pub answers: Collection<Answer>,
    pub clock: Arc<dyn Clock>,
    pub drafts: DraftSettings,
    pub http: reqwest::Client,
}

pub async fn init_state() -> Result<AppState> {
    let uri = env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let db_name = env::var("MONGODB_DB").unwrap_or_else(|_| "leasekeeper".to_string());

    let client = Client::with_uri_str(uri).await?;
    let db = client.database(&db_name);

    seed::ensure_collections(&db).await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Only seed when there are no contracts yet.
    if seed::is_database_empty(&db).await? {
        let seed_contracts = seed::load_seed_contracts()?;
        let inserted = seed::seed_contracts(&db, &seed_contracts, clock.today()).await?;
        if inserted > 0 {
            tracing::info!(inserted, "seeded contracts");
        }
    }

    Ok(AppState {
        contracts: db.collection::<Contract>("contracts"),
        documents: db.collection::<ContractDocument>("contract_documents"),
        questions: db.collection::<Question>("questions"),
        answers: db.collection::<Answer>("answers"),
        clock,
        drafts: DraftSettings::from_env(),
        http: reqwest::Client::new(),
    })
}
