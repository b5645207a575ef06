#[path = "common/mod.rs"]
mod common;

use chrono::NaiveDate;

use leasekeeper::models::{ContractInput, ContractStatus};
use leasekeeper::reconcile::{recalc_contract, sync_expired, sync_overdue};
use leasekeeper::state::{
    create_contract, create_document, delete_contract, get_contract_by_id, get_document_by_id,
    list_contracts, list_contracts_by_status, list_documents_for_contract, update_contract,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn input(title: &str, payday: Option<i32>, lease_end: Option<NaiveDate>) -> ContractInput {
    ContractInput {
        title: title.to_string(),
        address: "12 Harbor St".to_string(),
        landlord_name: "Kim".to_string(),
        tenant_name: "Lee".to_string(),
        lease_start: Some(date(2024, 1, 1)),
        lease_end,
        deposit: 5_000_000,
        rent: 500_000,
        payday,
        status: None,
        special_terms: None,
    }
}

#[tokio::test]
async fn seed_populates_contracts() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = ctx.state.clone();

    let contracts = list_contracts(&state).await.unwrap();
    assert_eq!(contracts.len(), 3, "seed file has three contracts");

    let jeonse = contracts
        .iter()
        .find(|c| c.title == "Suwon jeonse unit")
        .expect("jeonse contract seeded");
    assert_eq!(jeonse.payday, None);
    assert_eq!(jeonse.next_due_date, None);

    let officetel = contracts
        .iter()
        .find(|c| c.title == "Gangnam officetel")
        .expect("officetel seeded");
    assert!(officetel.next_due_date.is_some(), "derived fields set on seed");

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn contracts_crud_works() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = ctx.state.clone();
    let today = date(2025, 3, 30);

    let initial = list_contracts(&state).await.unwrap().len();
    let id = create_contract(&state, &input("Test Lease", Some(25), Some(date(2026, 1, 1))), today)
        .await
        .unwrap();
    assert_eq!(list_contracts(&state).await.unwrap().len(), initial + 1);

    let fetched = get_contract_by_id(&state, &id).await.unwrap().unwrap();
    assert_eq!(fetched.title, "Test Lease");
    assert_eq!(fetched.status, ContractStatus::Overdue);
    assert_eq!(fetched.overdue_days, 5);
    assert_eq!(fetched.next_due_date, Some(date(2025, 4, 25)));

    // Moving payday past today clears the overdue state.
    update_contract(&state, &id, &input("Test Lease v2", Some(31), Some(date(2026, 1, 1))), today)
        .await
        .unwrap();
    let updated = get_contract_by_id(&state, &id).await.unwrap().unwrap();
    assert_eq!(updated.title, "Test Lease v2");
    assert_eq!(updated.status, ContractStatus::Active);
    assert_eq!(updated.overdue_days, 0);
    assert_eq!(updated.next_due_date, Some(date(2025, 3, 31)));

    let doc_id = create_document(&state, &id, "answer", "Draft", "Dear tenant", None)
        .await
        .unwrap();
    assert_eq!(list_documents_for_contract(&state, &id).await.unwrap().len(), 1);

    delete_contract(&state, &id).await.unwrap();
    assert!(get_contract_by_id(&state, &id).await.unwrap().is_none());
    assert!(get_document_by_id(&state, &doc_id).await.unwrap().is_none());

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn invalid_input_is_rejected_before_insert() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = ctx.state.clone();

    let before = list_contracts(&state).await.unwrap().len();
    let result = create_contract(&state, &input("Bad", Some(0), None), date(2025, 3, 1)).await;
    assert!(result.is_err());
    assert_eq!(list_contracts(&state).await.unwrap().len(), before);

    let missing = mongodb::bson::oid::ObjectId::new();
    assert!(create_document(&state, &missing, "answer", "t", "c", None).await.is_err());

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn sync_passes_converge_against_mongo() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = ctx.state.clone();
    let created_on = date(2025, 3, 1);

    let late = create_contract(&state, &input("Late", Some(5), None), created_on)
        .await
        .unwrap();
    // Still running when it was recorded.
    let expired = create_contract(
        &state,
        &input("Expired", Some(25), Some(date(2025, 1, 1))),
        date(2024, 12, 1),
    )
    .await
    .unwrap();
    let open_ended = create_contract(&state, &input("No payday", None, None), created_on)
        .await
        .unwrap();

    let today = date(2025, 3, 10);
    let expiry = sync_expired(&state, today).await.unwrap();
    assert!(expiry.updated_count >= 1);
    assert_eq!(
        get_contract_by_id(&state, &expired).await.unwrap().unwrap().status,
        ContractStatus::Terminated
    );

    let report = sync_overdue(&state, today).await.unwrap();
    assert_eq!(report.failed, 0);
    let late_row = get_contract_by_id(&state, &late).await.unwrap().unwrap();
    assert_eq!(late_row.status, ContractStatus::Overdue);
    assert_eq!(late_row.overdue_days, 5);
    assert_eq!(late_row.next_due_date, Some(date(2025, 4, 5)));
    assert_eq!(
        get_contract_by_id(&state, &open_ended).await.unwrap().unwrap().status,
        ContractStatus::Active
    );

    let again = sync_overdue(&state, today).await.unwrap();
    assert_eq!(again.refreshed, 0);
    assert_eq!(again.updated, 0);

    // Terminated contracts never come back, even when recalculated directly.
    let outcome = recalc_contract(&state, &expired, date(2025, 3, 20)).await.unwrap();
    assert_eq!(outcome.status, ContractStatus::Terminated);
    let terminated = list_contracts_by_status(&state, ContractStatus::Terminated)
        .await
        .unwrap();
    assert!(terminated.iter().any(|c| c.id == Some(expired)));

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn clearing_payday_does_not_strand_overdue_contracts() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = ctx.state.clone();
    let today = date(2025, 3, 30);

    let id = create_contract(&state, &input("Switching to jeonse", Some(25), None), today)
        .await
        .unwrap();
    assert_eq!(
        get_contract_by_id(&state, &id).await.unwrap().unwrap().status,
        ContractStatus::Overdue
    );

    update_contract(&state, &id, &input("Switching to jeonse", None, None), today)
        .await
        .unwrap();
    let row = get_contract_by_id(&state, &id).await.unwrap().unwrap();
    assert_eq!(row.status, ContractStatus::Active);
    assert_eq!(row.overdue_days, 0);
    assert_eq!(row.next_due_date, None);

    common::teardown(Some(ctx)).await;
}
