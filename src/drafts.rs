// drafts.rs
// Chat-completion client and prompt builders for answer and notice drafts.
// Drafts are returned to the caller; nothing here writes to the database.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::env;
use thiserror::Error;

use crate::models::Contract;
use crate::overdue;

pub const DEFAULT_MODEL: &str = "gpt-5-chat-latest";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Placeholder the user fills in by hand.
pub const BLANK: &str = "____";

#[derive(Debug, Clone)]
pub struct DraftSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl DraftSettings {
    pub fn from_env() -> Self {
        DraftSettings {
            api_key: env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            model: env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("completion API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("completion returned an empty draft")]
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Sends `prompt` as a system + user exchange and returns the first choice, trimmed.
pub async fn complete(
    client: &reqwest::Client,
    settings: &DraftSettings,
    prompt: &Prompt,
) -> Result<String, DraftError> {
    let api_key = settings.api_key.as_deref().ok_or(DraftError::MissingApiKey)?;
    let url = format!("{}/chat/completions", settings.base_url.trim_end_matches('/'));

    let response = client
        .post(url)
        .bearer_auth(api_key)
        .json(&ChatRequest {
            model: &settings.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: prompt.temperature,
        })
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DraftError::Api {
            status: status.as_u16(),
            body,
        });
    }

    let parsed = response.json::<ChatResponse>().await?;
    first_choice(parsed).ok_or(DraftError::Empty)
}

fn first_choice(response: ChatResponse) -> Option<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn or_blank(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(BLANK)
        .to_string()
}

pub fn answer_prompt(title: &str, body: &str) -> Prompt {
    let system = "\
You draft answers to a landlord's legal question the way a lawyer explains things in a consultation.
Address the client directly, lead with the conclusion, then explain the reasoning and the usual procedure.
Write short paragraphs without lists. Do not predict outcomes or cite statute numbers.
End with a one-sentence note that this is general legal information.";

    let user = format!(
        "Draft an answer to the client's question below.\n\n[Question title]\n{}\n\n[Question body]\n{}",
        title.trim(),
        body.trim()
    );

    Prompt {
        system: system.to_string(),
        user,
        temperature: 0.3,
    }
}

/// Optional details for a free-form notice; missing values render as blanks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeContext {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub landlord_name: Option<String>,
    #[serde(default)]
    pub tenant_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contract_end_date: Option<String>,
}

pub fn notice_prompt(context: &NoticeContext) -> Prompt {
    let system = format!(
        "\
You draft certified notice letters for landlords. The result is a draft.
Leave any fact, deadline, amount or party you are not sure of as {BLANK}.
Keep the tone calm, one page, no statute numbers, no threats.
Sections: title, recipient and sender, facts, demands, deadline, next steps, date and signature."
    );

    let user = format!(
        "[Situation]\n{}\n\n[Details]\n{}\n\n\
Use these values when known:\n\
- Sender (landlord): {}\n\
- Recipient (tenant): {}\n\
- Property address: {}\n\
- Lease end date: {}",
        context.title.trim(),
        context.body.trim(),
        or_blank(context.landlord_name.as_deref()),
        or_blank(context.tenant_name.as_deref()),
        or_blank(context.address.as_deref()),
        or_blank(context.contract_end_date.as_deref()),
    );

    Prompt {
        system,
        user,
        temperature: 0.2,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticePurpose {
    RentOverdue,
    TerminationNotice,
    MoveoutRestore,
}

impl NoticePurpose {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "rent_overdue" => Some(NoticePurpose::RentOverdue),
            "termination_notice" => Some(NoticePurpose::TerminationNotice),
            "moveout_restore" => Some(NoticePurpose::MoveoutRestore),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NoticePurpose::RentOverdue => "rent_overdue",
            NoticePurpose::TerminationNotice => "termination_notice",
            NoticePurpose::MoveoutRestore => "moveout_restore",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NoticePurpose::RentOverdue => "demand for overdue rent",
            NoticePurpose::TerminationNotice => "notice of lease termination",
            NoticePurpose::MoveoutRestore => "move-out and restoration request",
        }
    }
}

/// Inclusive month count between two `YYYY.MM` values.
pub fn months_between_ym(start: &str, end: &str) -> Option<i32> {
    fn parse(value: &str) -> Option<(i32, i32)> {
        let (year, month) = value.trim().split_once('.')?;
        let year = year.trim().parse::<i32>().ok()?;
        let month = month.trim().parse::<i32>().ok()?;
        if year <= 0 || !(1..=12).contains(&month) {
            return None;
        }
        Some((year, month))
    }

    fn month_index((year, month): (i32, i32)) -> Option<i32> {
        year.checked_mul(12)?.checked_add(month)
    }

    let start = month_index(parse(start)?)?;
    let end = month_index(parse(end)?)?;
    end.checked_sub(start)?.checked_add(1)
}

/// Values derived for a contract notice, echoed back to the caller for review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoticeFacts {
    pub purpose: NoticePurpose,
    pub due_date: String,
    pub overdue_days: u32,
    pub unpaid_months: String,
    pub computed_facts: String,
}

fn input_text(inputs: &Map<String, Value>, key: &str) -> Option<String> {
    match inputs.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn input_or_blank(inputs: &Map<String, Value>, key: &str) -> String {
    input_text(inputs, key).unwrap_or_else(|| BLANK.to_string())
}

fn unpaid_months_text(period: Option<&str>) -> String {
    let Some(period) = period else {
        return BLANK.to_string();
    };
    let Some((start, end)) = period.split_once('~') else {
        return BLANK.to_string();
    };
    match months_between_ym(start, end) {
        Some(count) if count > 0 => format!("{count} months ({} ~ {})", start.trim(), end.trim()),
        _ => BLANK.to_string(),
    }
}

/// Facts for a contract notice as of `today`. An invalid payday yields zero
/// overdue days and a blank due date instead of an error.
pub fn notice_facts(
    contract: &Contract,
    purpose: NoticePurpose,
    inputs: &Map<String, Value>,
    today: NaiveDate,
) -> NoticeFacts {
    let payday = contract.payday.unwrap_or(0);
    let overdue_days = overdue::overdue_days(today, payday).unwrap_or(0);
    let due_date = overdue::due_date_this_month(today, payday)
        .map(|d| d.to_string())
        .unwrap_or_else(|_| "____-__-__".to_string());

    let unpaid_period = input_text(inputs, "unpaid_period");
    let unpaid_months = unpaid_months_text(unpaid_period.as_deref());

    let computed_facts = match purpose {
        NoticePurpose::RentOverdue => format!(
            "- (fixed) Unpaid months: {unpaid_months}\n\
- (fixed) Most recent due date (this month): {due_date}\n\
- (fixed) Days overdue since that due date: {overdue_days}\n\
- (input) Unpaid period: {}\n\
- (input) Unpaid amount (estimate): {}",
            unpaid_period.as_deref().unwrap_or(BLANK),
            input_or_blank(inputs, "unpaid_amount"),
        ),
        NoticePurpose::TerminationNotice => format!(
            "- Reason for termination: {}\n- Termination date: {}",
            input_or_blank(inputs, "termination_reason"),
            input_text(inputs, "termination_date")
                .or_else(|| contract.lease_end.map(|d| d.to_string()))
                .unwrap_or_else(|| BLANK.to_string()),
        ),
        NoticePurpose::MoveoutRestore => format!(
            "- Reason for move-out request: {}\n- Move-out deadline: {}\n- Restoration scope: {}",
            input_or_blank(inputs, "moveout_reason"),
            input_or_blank(inputs, "moveout_deadline"),
            input_or_blank(inputs, "restore_scope"),
        ),
    };

    NoticeFacts {
        purpose,
        due_date,
        overdue_days,
        unpaid_months,
        computed_facts,
    }
}

pub fn contract_notice_prompt(contract: &Contract, facts: &NoticeFacts) -> Prompt {
    let system = format!(
        "\
You draft certified notice letters for landlords from stored lease data.
Do not judge legal validity. Use only the facts given; leave unknown values as {BLANK}.
Values marked (fixed) must appear verbatim. Unpaid months and days overdue are different \
measures: lead with the unpaid months and mention the days overdue as supporting detail.
Sections: title, sender and recipient, lease summary, facts, demands, deadline, \
next steps in general terms, date, signature. Finish with a short disclaimer."
    );

    let opt_date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
    let user = format!(
        "[Purpose]\n- {} ({})\n\n\
[Contract]\n\
- Contract ID: {}\n\
- Title: {}\n\
- Address: {}\n\
- Landlord: {}\n\
- Tenant: {}\n\
- Lease start: {}\n\
- Lease end: {}\n\
- Deposit: {}\n\
- Monthly rent: {}\n\
- Payday: day {} of each month\n\
- Current status: {}\n\
- Special terms: {}\n\n\
[Additional facts]\n{}\n\n\
Write a draft {} from the data above.",
        facts.purpose.as_str(),
        facts.purpose.label(),
        contract.id.map(|id| id.to_hex()).unwrap_or_default(),
        contract.title,
        contract.address,
        contract.landlord_name,
        contract.tenant_name,
        opt_date(contract.lease_start),
        opt_date(contract.lease_end),
        contract.deposit,
        contract.rent,
        contract.payday.map(|p| p.to_string()).unwrap_or_default(),
        contract.status.as_str(),
        contract.special_terms.as_deref().unwrap_or(""),
        facts.computed_facts,
        facts.purpose.label(),
    );

    Prompt {
        system,
        user,
        temperature: 0.2,
    }
}
