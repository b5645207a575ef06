use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::TryStreamExt;
use mongodb::bson::{DateTime, doc, oid::ObjectId};
use std::time::SystemTime;

use crate::models::{Contract, ContractInput, ContractStatus};
use crate::overdue;
use crate::reconcile::{ContractPatch, ContractStore};

use super::AppState;

pub fn validate_contract_input(input: &ContractInput) -> Result<()> {
    if input.title.trim().is_empty() {
        bail!("title is required");
    }
    if input.address.trim().is_empty() {
        bail!("address is required");
    }
    if input.landlord_name.trim().is_empty() {
        bail!("landlord_name is required");
    }
    if input.tenant_name.trim().is_empty() {
        bail!("tenant_name is required");
    }
    if let (Some(start), Some(end)) = (input.lease_start, input.lease_end) {
        if start > end {
            bail!("lease_end must not be before lease_start");
        }
    }
    if input.deposit < 0 {
        bail!("deposit must not be negative");
    }
    if input.rent < 0 {
        bail!("rent must not be negative");
    }
    if let Some(payday) = input.payday {
        overdue::validate_payday(payday)?;
    }
    Ok(())
}

fn clean_opt(input: Option<&String>) -> Option<String> {
    input.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct DerivedFields {
    pub status: ContractStatus,
    pub next_due_date: Option<NaiveDate>,
    pub overdue_days: i64,
}

/// Derived fields as of `today`. Without a payday nothing is ever due, so the
/// status goes through the rule with zero overdue days.
pub(super) fn derive_fields(
    payday: Option<i32>,
    lease_end: Option<NaiveDate>,
    current: ContractStatus,
    today: NaiveDate,
) -> DerivedFields {
    match payday.and_then(|payday| overdue::reconcile(today, payday, lease_end, current).ok()) {
        Some(result) => DerivedFields {
            status: result.status,
            next_due_date: Some(result.next_due_date),
            overdue_days: i64::from(result.overdue_days),
        },
        None => DerivedFields {
            status: overdue::next_status(current, 0, lease_end, today),
            next_due_date: None,
            overdue_days: 0,
        },
    }
}

/// New contract document with derived fields computed as of `today`.
/// Expects `input` to have passed `validate_contract_input`.
pub(super) fn build_contract(input: &ContractInput, today: NaiveDate) -> Contract {
    let derived = derive_fields(
        input.payday,
        input.lease_end,
        input.status.unwrap_or_default(),
        today,
    );

    Contract {
        id: None,
        title: input.title.trim().to_string(),
        address: input.address.trim().to_string(),
        landlord_name: input.landlord_name.trim().to_string(),
        tenant_name: input.tenant_name.trim().to_string(),
        lease_start: input.lease_start,
        lease_end: input.lease_end,
        deposit: input.deposit,
        rent: input.rent,
        payday: input.payday,
        status: derived.status,
        special_terms: clean_opt(input.special_terms.as_ref()),
        next_due_date: derived.next_due_date,
        overdue_days: derived.overdue_days,
        created_at: Some(DateTime::from_system_time(SystemTime::now())),
        updated_at: None,
    }
}

fn date_value(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.to_string())
}

pub async fn list_contracts(state: &AppState) -> Result<Vec<Contract>> {
    let mut cursor = state
        .contracts
        .find(doc! {})
        .sort(doc! { "created_at": -1 })
        .await?;
    let mut items = Vec::new();
    while let Some(contract) = cursor.try_next().await? {
        items.push(contract);
    }
    Ok(items)
}

pub async fn get_contract_by_id(state: &AppState, id: &ObjectId) -> Result<Option<Contract>> {
    state
        .contracts
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

pub async fn create_contract(
    state: &AppState,
    input: &ContractInput,
    today: NaiveDate,
) -> Result<ObjectId> {
    validate_contract_input(input)?;

    let res = state
        .contracts
        .insert_one(build_contract(input, today))
        .await?;
    res.inserted_id
        .as_object_id()
        .context("contract insert missing _id")
}

/// Replaces the editable fields and recomputes the derived ones. The stored
/// status is kept as the starting point, so a terminated contract stays terminated.
pub async fn update_contract(
    state: &AppState,
    id: &ObjectId,
    input: &ContractInput,
    today: NaiveDate,
) -> Result<()> {
    validate_contract_input(input)?;

    let existing = state
        .contracts
        .find_one(doc! { "_id": id })
        .await?
        .context("contract not found")?;

    let derived = derive_fields(input.payday, input.lease_end, existing.status, today);

    state
        .contracts
        .update_one(
            doc! { "_id": id },
            doc! { "$set": {
                "title": input.title.trim(),
                "address": input.address.trim(),
                "landlord_name": input.landlord_name.trim(),
                "tenant_name": input.tenant_name.trim(),
                "lease_start": date_value(input.lease_start),
                "lease_end": date_value(input.lease_end),
                "deposit": input.deposit,
                "rent": input.rent,
                "payday": input.payday,
                "special_terms": clean_opt(input.special_terms.as_ref()),
                "status": derived.status.as_str(),
                "next_due_date": date_value(derived.next_due_date),
                "overdue_days": derived.overdue_days,
                "updated_at": DateTime::from_system_time(SystemTime::now()),
            } },
        )
        .await?;
    Ok(())
}

pub async fn delete_contract(state: &AppState, id: &ObjectId) -> Result<()> {
    state
        .documents
        .delete_many(doc! { "contract_id": id })
        .await?;
    state.contracts.delete_one(doc! { "_id": id }).await?;
    Ok(())
}

pub async fn list_contracts_by_status(
    state: &AppState,
    status: ContractStatus,
) -> Result<Vec<Contract>> {
    let mut cursor = state
        .contracts
        .find(doc! { "status": status.as_str() })
        .await?;
    let mut items = Vec::new();
    while let Some(contract) = cursor.try_next().await? {
        items.push(contract);
    }
    Ok(items)
}

#[async_trait]
impl ContractStore for AppState {
    async fn find_contract(&self, id: &ObjectId) -> Result<Option<Contract>> {
        get_contract_by_id(self, id).await
    }

    async fn find_open_contracts(&self) -> Result<Vec<Contract>> {
        let mut cursor = self
            .contracts
            .find(doc! {
                "status": { "$ne": ContractStatus::Terminated.as_str() },
                "payday": { "$ne": null },
            })
            .await?;
        let mut items = Vec::new();
        while let Some(contract) = cursor.try_next().await? {
            items.push(contract);
        }
        Ok(items)
    }

    async fn find_expired_contracts(&self, today: NaiveDate) -> Result<Vec<Contract>> {
        // Dates are stored as YYYY-MM-DD, so string order is date order.
        let mut cursor = self
            .contracts
            .find(doc! {
                "status": { "$ne": ContractStatus::Terminated.as_str() },
                "lease_end": { "$ne": null, "$lt": today.to_string() },
            })
            .await?;
        let mut items = Vec::new();
        while let Some(contract) = cursor.try_next().await? {
            items.push(contract);
        }
        Ok(items)
    }

    async fn update_contract_fields(&self, id: &ObjectId, patch: &ContractPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut set = doc! {
            "updated_at": DateTime::from_system_time(SystemTime::now()),
        };
        if let Some(date) = patch.next_due_date {
            set.insert("next_due_date", date.to_string());
        }
        if let Some(days) = patch.overdue_days {
            set.insert("overdue_days", days);
        }
        if let Some(status) = patch.status {
            set.insert("status", status.as_str());
        }

        let res = self
            .contracts
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await?;
        if res.matched_count == 0 {
            bail!("contract {id} not found");
        }
        Ok(())
    }
}
