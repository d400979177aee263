//! Integration tests for circumstances-store
//!
//! These tests verify the full CRUD cycle for circumstances records.

use circumstances_domain::traits::{CircumstancesStore, StoreFailure};
use circumstances_domain::{
    content_hash, ClaimCircumstances, CircumstancesId, CircumstancesRequest, Source,
};
use circumstances_store::{SqliteStore, StoreError};
use serde_json::json;

fn record_for(claimant_id: &str) -> ClaimCircumstances {
    let mut payload = CircumstancesRequest::from_value(json!({
        "claimStartDate": "2024-01-01",
        "dateOfClaim": "2024-01-01",
        "serviceVersion": "v1",
        "locale": "en-gb",
        "jobseeker": {"hasWorkedAbroad": false, "nino": "QQ123456C"}
    }))
    .unwrap();
    payload.set_claimant_id(claimant_id);
    ClaimCircumstances::new(payload, claimant_id.to_string(), Source::Citizen).unwrap()
}

#[test]
fn test_store_initialization() {
    let store = SqliteStore::new(":memory:");
    assert!(store.is_ok(), "Store should initialize successfully");
}

#[test]
fn test_save_and_find_by_id() {
    let mut store = SqliteStore::in_memory().unwrap();
    let record = record_for("claimant-1");

    let saved = store.save(record.clone()).unwrap();
    assert_eq!(saved.id, record.id);
    assert_eq!(saved.created_at, saved.updated_at);

    let found = store.find_by_id(record.id).unwrap().expect("record should exist");
    assert_eq!(found.id, record.id);
    assert_eq!(found.claimant_id, "claimant-1");
    assert_eq!(found.payload, record.payload);
    assert_eq!(found.hash, content_hash(&record.payload).unwrap());
    assert_eq!(found.source, Source::Citizen);
    assert_eq!(found.service_version.as_deref(), Some("v1"));
    assert_eq!(found.locale.as_ref().map(|l| l.as_str()), Some("en-GB"));
    assert!(!found.encrypted_json);
    assert_eq!(found.created_at, saved.created_at);
}

#[test]
fn test_find_by_claimant_id() {
    let mut store = SqliteStore::in_memory().unwrap();
    let record = record_for("claimant-2");
    store.save(record.clone()).unwrap();

    let found = store.find_by_claimant_id("claimant-2").unwrap().unwrap();
    assert_eq!(found.id, record.id);

    assert!(store.find_by_claimant_id("nobody").unwrap().is_none());
    assert!(store.find_by_id(CircumstancesId::new()).unwrap().is_none());
}

#[test]
fn test_duplicate_claimant_rejected() {
    let mut store = SqliteStore::in_memory().unwrap();
    store.save(record_for("claimant-3")).unwrap();

    let result = store.save(record_for("claimant-3"));
    match result {
        Err(e) => {
            assert!(matches!(e, StoreError::Duplicate));
            assert!(e.is_unique_violation());
        }
        Ok(_) => panic!("Should reject a second record for the same claimant"),
    }
}

#[test]
fn test_update_keeps_created_timestamp() {
    let mut store = SqliteStore::in_memory().unwrap();
    let saved = store.save(record_for("claimant-4")).unwrap();

    let mut changed = saved.clone();
    let payload = CircumstancesRequest::from_value(json!({
        "claimStartDate": "2024-05-01",
        "dateOfClaim": "2024-05-02"
    }))
    .unwrap();
    changed
        .update(payload.clone(), "claimant-4".to_string(), Source::Citizen)
        .unwrap();
    std::thread::sleep(std::time::Duration::from_millis(5));
    let updated = store.save(changed).unwrap();

    assert_eq!(updated.id, saved.id);
    assert_eq!(updated.created_at, saved.created_at);
    assert!(updated.updated_at > saved.updated_at);

    let found = store.find_by_id(saved.id).unwrap().unwrap();
    assert_eq!(found.payload, payload);
    assert!(found.encrypted_json);
    assert!(found.locale.is_none());
}

#[test]
fn test_update_into_taken_claimant_rejected() {
    let mut store = SqliteStore::in_memory().unwrap();
    store.save(record_for("claimant-a")).unwrap();
    let mut other = store.save(record_for("claimant-b")).unwrap();

    other.claimant_id = "claimant-a".to_string();
    assert!(matches!(store.save(other), Err(StoreError::Duplicate)));

    // The failed write left the original row untouched
    assert!(store.find_by_claimant_id("claimant-b").unwrap().is_some());
}

#[test]
fn test_delete_by_id() {
    let mut store = SqliteStore::in_memory().unwrap();
    let record = store.save(record_for("claimant-5")).unwrap();

    store.delete_by_id(record.id).unwrap();
    assert!(store.find_by_id(record.id).unwrap().is_none());

    // Deleting again is a no-op
    assert!(store.delete_by_id(record.id).is_ok());

    // Claimant id is free again
    assert!(store.save(record_for("claimant-5")).is_ok());
}

#[test]
fn test_summaries_skip_payload() {
    let mut store = SqliteStore::in_memory().unwrap();
    let record = store.save(record_for("claimant-6")).unwrap();

    let by_id = store.find_summary_by_id(record.id).unwrap().unwrap();
    assert_eq!(by_id, record.summary());

    let by_claimant = store.find_summary_by_claimant_id("claimant-6").unwrap().unwrap();
    assert_eq!(by_claimant.id, record.id);
    assert_eq!(by_claimant.hash, record.hash);

    assert!(store.find_summary_by_claimant_id("missing").unwrap().is_none());
}

#[test]
fn test_unencrypted_queries() {
    let mut store = SqliteStore::in_memory().unwrap();
    let first = store.save(record_for("claimant-x")).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let second = store.save(record_for("claimant-y")).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let third = store.save(record_for("claimant-z")).unwrap();

    // Updating marks a record encrypted
    let mut encrypted = second.clone();
    encrypted
        .update(second.payload.clone(), second.claimant_id.clone(), Source::Citizen)
        .unwrap();
    store.save(encrypted).unwrap();

    let mut ids = store.find_unencrypted_claimant_ids(10).unwrap();
    ids.sort();
    assert_eq!(ids, vec!["claimant-x".to_string(), "claimant-z".to_string()]);
    assert_eq!(store.find_unencrypted_claimant_ids(1).unwrap().len(), 1);

    let pending = store.find_unencrypted(10).unwrap();
    let pending_ids: Vec<_> = pending.iter().map(|r| r.id).collect();
    assert_eq!(pending_ids, vec![first.id, third.id]);

    let oldest = store.find_unencrypted(1).unwrap();
    assert_eq!(oldest.len(), 1);
    assert_eq!(oldest[0].id, first.id);
}

#[test]
fn test_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("circumstances.db");

    let id = {
        let mut store = SqliteStore::new(&path).unwrap();
        store.save(record_for("claimant-disk")).unwrap().id
    };

    let store = SqliteStore::new(&path).unwrap();
    let found = store.find_by_id(id).unwrap().unwrap();
    assert_eq!(found.claimant_id, "claimant-disk");
}
