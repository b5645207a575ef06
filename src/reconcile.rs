// reconcile.rs
// Read-compute-write passes over stored contracts: single recalculation,
// bulk overdue sync and lease-expiry sync. Each row commits on its own; a
// failed row is logged and counted and the pass moves on.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use mongodb::bson::oid::ObjectId;
use serde::Serialize;
use thiserror::Error;

use crate::models::{Contract, ContractStatus};
use crate::overdue::{self, OverdueError};

/// Derived fields to write back. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractPatch {
    pub next_due_date: Option<NaiveDate>,
    pub overdue_days: Option<i64>,
    pub status: Option<ContractStatus>,
}

impl ContractPatch {
    pub fn is_empty(&self) -> bool {
        self.next_due_date.is_none() && self.overdue_days.is_none() && self.status.is_none()
    }
}

#[async_trait]
pub trait ContractStore: Send + Sync {
    async fn find_contract(&self, id: &ObjectId) -> Result<Option<Contract>>;
    /// Contracts that are not `terminated` (stores may also drop rows without a payday).
    async fn find_open_contracts(&self) -> Result<Vec<Contract>>;
    /// Open contracts whose lease ended strictly before `today`.
    async fn find_expired_contracts(&self, today: NaiveDate) -> Result<Vec<Contract>>;
    async fn update_contract_fields(&self, id: &ObjectId, patch: &ContractPatch) -> Result<()>;
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("contract {0} not found")]
    NotFound(ObjectId),
    #[error("contract {0} has no payday")]
    MissingPayday(ObjectId),
    #[error(transparent)]
    Overdue(#[from] OverdueError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecalcOutcome {
    pub id: String,
    pub status: ContractStatus,
    pub next_due_date: NaiveDate,
    pub overdue_days: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub today: Option<NaiveDate>,
    pub examined: usize,
    /// Rows whose status changed.
    pub updated: usize,
    /// Rows written (any derived field changed).
    pub refreshed: usize,
    pub skipped_invalid: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpiryReport {
    pub today: Option<NaiveDate>,
    pub updated_count: usize,
    pub failed: usize,
}

/// Recomputes one contract and writes all derived fields back.
pub async fn recalc_contract<S: ContractStore + ?Sized>(
    store: &S,
    id: &ObjectId,
    today: NaiveDate,
) -> Result<RecalcOutcome, ReconcileError> {
    let contract = store
        .find_contract(id)
        .await?
        .ok_or(ReconcileError::NotFound(*id))?;
    let payday = contract.payday.ok_or(ReconcileError::MissingPayday(*id))?;

    let result = overdue::reconcile(today, payday, contract.lease_end, contract.status)?;

    store
        .update_contract_fields(
            id,
            &ContractPatch {
                next_due_date: Some(result.next_due_date),
                overdue_days: Some(i64::from(result.overdue_days)),
                status: Some(result.status),
            },
        )
        .await?;

    if result.status != contract.status {
        tracing::info!(
            contract_id = %id,
            from = contract.status.as_str(),
            to = result.status.as_str(),
            "contract status changed"
        );
    }

    Ok(RecalcOutcome {
        id: id.to_hex(),
        status: result.status,
        next_due_date: result.next_due_date,
        overdue_days: result.overdue_days,
    })
}

/// Fields of `contract` that differ from a fresh computation as of `today`.
/// `Ok(None)` means the contract is not eligible (terminated or no payday).
pub fn pending_patch(
    contract: &Contract,
    today: NaiveDate,
) -> Result<Option<ContractPatch>, OverdueError> {
    if contract.status.is_terminated() {
        return Ok(None);
    }
    let Some(payday) = contract.payday else {
        return Ok(None);
    };

    let result = overdue::reconcile(today, payday, contract.lease_end, contract.status)?;
    let overdue_days = i64::from(result.overdue_days);

    let mut patch = ContractPatch::default();
    if contract.next_due_date != Some(result.next_due_date) {
        patch.next_due_date = Some(result.next_due_date);
    }
    if contract.overdue_days != overdue_days {
        patch.overdue_days = Some(overdue_days);
    }
    if contract.status != result.status {
        patch.status = Some(result.status);
    }
    Ok(Some(patch))
}

/// Brings every open contract with a payday up to date as of `today`.
pub async fn sync_overdue<S: ContractStore + ?Sized>(
    store: &S,
    today: NaiveDate,
) -> Result<SyncReport> {
    let contracts = store.find_open_contracts().await?;
    let mut report = SyncReport {
        today: Some(today),
        ..SyncReport::default()
    };

    for contract in contracts {
        let Some(id) = contract.id else {
            continue;
        };
        let patch = match pending_patch(&contract, today) {
            Ok(Some(patch)) => patch,
            Ok(None) => continue,
            Err(err) => {
                tracing::warn!(contract_id = %id, error = %err, "skipping contract");
                report.examined += 1;
                report.skipped_invalid += 1;
                continue;
            }
        };
        report.examined += 1;
        if patch.is_empty() {
            continue;
        }

        match store.update_contract_fields(&id, &patch).await {
            Ok(()) => {
                report.refreshed += 1;
                if let Some(status) = patch.status {
                    report.updated += 1;
                    tracing::info!(
                        contract_id = %id,
                        from = contract.status.as_str(),
                        to = status.as_str(),
                        "contract status changed"
                    );
                }
            }
            Err(err) => {
                report.failed += 1;
                tracing::warn!(contract_id = %id, error = %err, "failed to update contract");
            }
        }
    }

    tracing::info!(
        today = %today,
        examined = report.examined,
        updated = report.updated,
        refreshed = report.refreshed,
        skipped_invalid = report.skipped_invalid,
        failed = report.failed,
        "overdue sync finished"
    );
    Ok(report)
}

/// Terminates every open contract whose lease has ended.
pub async fn sync_expired<S: ContractStore + ?Sized>(
    store: &S,
    today: NaiveDate,
) -> Result<ExpiryReport> {
    let contracts = store.find_expired_contracts(today).await?;
    let mut report = ExpiryReport {
        today: Some(today),
        ..ExpiryReport::default()
    };

    for contract in contracts {
        let Some(id) = contract.id else {
            continue;
        };
        let status = overdue::status_after_expiry(contract.status, contract.lease_end, today);
        if status == contract.status {
            continue;
        }

        let patch = ContractPatch {
            status: Some(status),
            ..ContractPatch::default()
        };
        match store.update_contract_fields(&id, &patch).await {
            Ok(()) => report.updated_count += 1,
            Err(err) => {
                report.failed += 1;
                tracing::warn!(contract_id = %id, error = %err, "failed to terminate contract");
            }
        }
    }

    tracing::info!(
        today = %today,
        updated_count = report.updated_count,
        failed = report.failed,
        "lease expiry sync finished"
    );
    Ok(report)
}
