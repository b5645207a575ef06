// models.rs
// Domain models for both seed data (contracts.json) and MongoDB collections.

use chrono::NaiveDate;
use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Lifecycle of a lease contract. `Terminated` is absorbing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    Active,
    Overdue,
    Terminated,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Active => "active",
            ContractStatus::Overdue => "overdue",
            ContractStatus::Terminated => "terminated",
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, ContractStatus::Terminated)
    }
}

impl Default for ContractStatus {
    fn default() -> Self {
        ContractStatus::Active
    }
}

/// Lease contract stored in MongoDB. `next_due_date` and `overdue_days` are
/// derived by the overdue engine and rewritten on every recalculation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contract {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub address: String,
    pub landlord_name: String,
    pub tenant_name: String,
    #[serde(default)]
    pub lease_start: Option<NaiveDate>,
    #[serde(default)]
    pub lease_end: Option<NaiveDate>,
    #[serde(default)]
    pub deposit: i64,
    #[serde(default)]
    pub rent: i64,
    #[serde(default)]
    pub payday: Option<i32>,
    #[serde(default)]
    pub status: ContractStatus,
    #[serde(default)]
    pub special_terms: Option<String>,
    #[serde(default)]
    pub next_due_date: Option<NaiveDate>,
    #[serde(default)]
    pub overdue_days: i64,
    #[serde(default)]
    pub created_at: Option<DateTime>,
    #[serde(default)]
    pub updated_at: Option<DateTime>,
}

/// Contract fields as they appear in contracts.json and in create/update requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractInput {
    pub title: String,
    pub address: String,
    pub landlord_name: String,
    pub tenant_name: String,
    #[serde(default)]
    pub lease_start: Option<NaiveDate>,
    #[serde(default)]
    pub lease_end: Option<NaiveDate>,
    #[serde(default)]
    pub deposit: i64,
    #[serde(default)]
    pub rent: i64,
    #[serde(default)]
    pub payday: Option<i32>,
    #[serde(default)]
    pub status: Option<ContractStatus>,
    #[serde(default)]
    pub special_terms: Option<String>,
}

/// Generated document (notice draft, answer, etc.) saved against a contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub contract_id: ObjectId,
    pub doc_type: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub meta: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<DateTime>,
}

/// Where a legal question's case currently stands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaseStage {
    #[default]
    Intake,
    NoticeSent,
    Negotiation,
    Litigation,
    Enforcement,
    Closed,
}

impl CaseStage {
    pub const ALL: [CaseStage; 6] = [
        CaseStage::Intake,
        CaseStage::NoticeSent,
        CaseStage::Negotiation,
        CaseStage::Litigation,
        CaseStage::Enforcement,
        CaseStage::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStage::Intake => "intake",
            CaseStage::NoticeSent => "notice_sent",
            CaseStage::Negotiation => "negotiation",
            CaseStage::Litigation => "litigation",
            CaseStage::Enforcement => "enforcement",
            CaseStage::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|stage| stage.as_str() == value)
    }
}

/// Free-text legal question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub case_stage: CaseStage,
    #[serde(default)]
    pub created_at: Option<DateTime>,
}

/// Reply to a question, typed by hand or accepted from an AI draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub question_id: ObjectId,
    pub body: String,
    #[serde(default)]
    pub is_ai_draft: bool,
    #[serde(default)]
    pub created_at: Option<DateTime>,
}
