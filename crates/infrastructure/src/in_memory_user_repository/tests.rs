use std::sync::Arc;

use serde_json::json;

use userhub_application::{UserLookupService, UserRepository};
use userhub_core::AppError;
use userhub_domain::{EmailAddress, FieldPatch, UserDocument, UserFilter, UserId};

use super::InMemoryUserRepository;
use crate::TracingLookupDiagnostics;

fn document(payload: serde_json::Value) -> UserDocument {
    match UserDocument::new(payload) {
        Ok(document) => document,
        Err(error) => panic!("fixture document should validate: {error}"),
    }
}

fn patch(fields: serde_json::Value) -> FieldPatch {
    match FieldPatch::new(fields) {
        Ok(patch) => patch,
        Err(error) => panic!("fixture patch should validate: {error}"),
    }
}

fn by_email(email: &str) -> UserFilter {
    match EmailAddress::new(email) {
        Ok(email) => UserFilter::by_email(&email),
        Err(error) => panic!("fixture email should validate: {error}"),
    }
}

fn stored_id(document: &UserDocument) -> UserId {
    match document.id().map(UserId::new) {
        Some(Ok(id)) => id,
        _ => panic!("stored document should carry an id"),
    }
}

#[tokio::test]
async fn insert_assigns_an_id_and_round_trips_through_find() {
    let repo = InMemoryUserRepository::new();

    let stored = repo
        .insert(document(json!({"email": "jane@example.com", "firstName": "Jane"})))
        .await;

    let Ok(stored) = stored else {
        panic!("insert of a valid document should succeed");
    };
    assert!(stored.id().is_some());

    let found = repo.find(&by_email("jane@example.com")).await;
    assert_eq!(found.ok(), Some(vec![stored]));
}

#[tokio::test]
async fn insert_rejects_documents_failing_the_email_schema() {
    let repo = InMemoryUserRepository::new();

    let result = repo
        .insert(document(json!({"email": "invalidemail"})))
        .await;

    let Err(error) = result else {
        panic!("insert should fail schema validation");
    };
    assert!(matches!(error, AppError::Repository(_)));
    assert!(error.to_string().contains("schema"));
}

#[tokio::test]
async fn insert_rejects_duplicate_ids() {
    let repo = InMemoryUserRepository::new();
    let first = document(json!({"id": "abc123", "email": "jane@example.com"}));
    let second = document(json!({"id": "abc123", "email": "other@example.com"}));

    assert!(repo.insert(first).await.is_ok());

    let result = repo.insert(second).await;
    assert!(matches!(result, Err(AppError::Repository(_))));
}

#[tokio::test]
async fn find_returns_matches_in_insertion_order() {
    let repo = InMemoryUserRepository::new();
    let first = document(json!({"email": "jane@example.com", "firstName": "First"}));
    let second = document(json!({"email": "jane@example.com", "firstName": "Second"}));

    let (Ok(first), Ok(second)) = (repo.insert(first).await, repo.insert(second).await) else {
        panic!("inserts should succeed");
    };

    let found = repo.find(&by_email("jane@example.com")).await;
    assert_eq!(found.ok(), Some(vec![first, second]));
}

#[tokio::test]
async fn find_with_no_match_returns_an_empty_set() {
    let repo = InMemoryUserRepository::new();

    let found = repo.find(&by_email("missing@example.com")).await;
    assert_eq!(found.ok(), Some(vec![]));
}

#[tokio::test]
async fn update_fields_sets_only_the_named_fields() {
    let repo = InMemoryUserRepository::new();
    let stored = repo
        .insert(document(json!({
            "email": "jane@example.com",
            "firstName": "Jane",
            "lastName": "Doe",
        })))
        .await;

    let Ok(stored) = stored else {
        panic!("insert should succeed");
    };
    let id = stored_id(&stored);

    let report = repo
        .update_fields(&id, &patch(json!({"firstName": "Janet"})))
        .await;

    let Ok(report) = report else {
        panic!("update should succeed");
    };
    assert_eq!(report.matched_count, 1);
    assert_eq!(report.modified_count, 1);

    let found = repo.find(&by_email("jane@example.com")).await;
    let Some(updated) = found.ok().and_then(|mut documents| documents.pop()) else {
        panic!("updated document should still be findable");
    };
    assert_eq!(updated.get("firstName"), Some(&json!("Janet")));
    assert_eq!(updated.get("lastName"), Some(&json!("Doe")));
}

#[tokio::test]
async fn update_with_identical_values_matches_but_does_not_modify() {
    let repo = InMemoryUserRepository::new();
    let stored = repo
        .insert(document(json!({"email": "jane@example.com", "firstName": "Jane"})))
        .await;

    let Ok(stored) = stored else {
        panic!("insert should succeed");
    };
    let id = stored_id(&stored);

    let report = repo
        .update_fields(&id, &patch(json!({"firstName": "Jane"})))
        .await;

    let Ok(report) = report else {
        panic!("update should succeed");
    };
    assert_eq!(report.matched_count, 1);
    assert_eq!(report.modified_count, 0);
}

#[tokio::test]
async fn update_for_an_unknown_id_matches_nothing() {
    let repo = InMemoryUserRepository::new();
    let Ok(id) = UserId::new("does-not-exist") else {
        panic!("fixture id should validate");
    };

    let report = repo
        .update_fields(&id, &patch(json!({"firstName": "Ghost"})))
        .await;

    let Ok(report) = report else {
        panic!("update of an unknown id still acknowledges");
    };
    assert_eq!(report.matched_count, 0);
    assert_eq!(report.modified_count, 0);
}

#[tokio::test]
async fn update_cannot_change_the_id_field() {
    let repo = InMemoryUserRepository::new();
    let stored = repo
        .insert(document(json!({"email": "jane@example.com"})))
        .await;

    let Ok(stored) = stored else {
        panic!("insert should succeed");
    };
    let id = stored_id(&stored);

    let result = repo.update_fields(&id, &patch(json!({"id": "hijacked"}))).await;
    assert!(matches!(result, Err(AppError::Repository(_))));
}

#[tokio::test]
async fn lookup_service_runs_end_to_end_over_the_in_memory_store() {
    let repo = Arc::new(InMemoryUserRepository::new());
    let service = UserLookupService::new(repo.clone(), Arc::new(TracingLookupDiagnostics));

    let stored = repo
        .insert(document(json!({"email": "jane@example.com", "firstName": "Jane"})))
        .await;
    let Ok(stored) = stored else {
        panic!("insert should succeed");
    };

    let found = service.get_by_email("jane@example.com").await;
    assert_eq!(found.ok(), Some(stored));

    let missing = service.get_by_email("missing@example.com").await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn lookup_service_returns_the_first_of_duplicate_emails() {
    let repo = Arc::new(InMemoryUserRepository::new());
    let service = UserLookupService::new(repo.clone(), Arc::new(TracingLookupDiagnostics));

    let first = repo
        .insert(document(json!({"email": "jane@example.com", "firstName": "First"})))
        .await;
    let second = repo
        .insert(document(json!({"email": "jane@example.com", "firstName": "Second"})))
        .await;
    let (Ok(first), Ok(second)) = (first, second) else {
        panic!("inserts should succeed");
    };
    assert_ne!(first, second);

    let found = service.get_by_email("jane@example.com").await;
    assert_eq!(found.ok(), Some(first));
}
