//! Tests for `MemoryBackend`.

use std::time::Duration;

use bytes::Bytes;
use lostfound_core::{
  AuthError, BackendError,
  backend::{AuthService, BlobStorage, Bucket, Credentials, Direction, Query, Table, TableStore},
};
use serde_json::json;
use uuid::Uuid;

use crate::MemoryBackend;

fn creds(email: &str, password: &str) -> Credentials {
  Credentials { email: email.into(), password: password.into() }
}

// ─── Auth ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sign_up_then_sign_in() {
  let b = MemoryBackend::new();
  let created = b.sign_up(&creds("Meera@Campus.edu", "hunter22")).await.unwrap();
  assert_eq!(created.email, "meera@campus.edu");

  let session = b.sign_in(&creds("meera@campus.edu", "hunter22")).await.unwrap();
  assert_eq!(session.user_id, created.user_id);
  assert_ne!(session.access_token, created.access_token);

  b.sign_out(&session).await.unwrap();
  assert!(matches!(b.sign_out(&session).await, Err(AuthError::MissingSession)));
}

#[tokio::test]
async fn duplicate_sign_up_rejected() {
  let b = MemoryBackend::new();
  b.sign_up(&creds("a@campus.edu", "secret1")).await.unwrap();
  let err = b.sign_up(&creds("a@campus.edu", "secret2")).await.unwrap_err();
  assert!(matches!(err, AuthError::Rejected(_)));
}

#[tokio::test]
async fn wrong_password_and_unknown_email() {
  let b = MemoryBackend::new();
  b.sign_up(&creds("a@campus.edu", "secret1")).await.unwrap();
  assert!(matches!(
    b.sign_in(&creds("a@campus.edu", "nope")).await,
    Err(AuthError::IncorrectPassword)
  ));
  assert!(matches!(
    b.sign_in(&creds("ghost@campus.edu", "secret1")).await,
    Err(AuthError::IncorrectPassword)
  ));
}

// ─── Tables ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_assigns_id_and_created_at() {
  let b = MemoryBackend::new();
  let id = b
    .insert(Table::Items, json!({ "title": "Keys", "status": "PENDING" }))
    .await
    .unwrap();

  let rows = b.rows(Table::Items);
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0]["item_id"], id.to_string());
  assert!(rows[0]["created_at"].is_string());
}

#[tokio::test]
async fn insert_keeps_supplied_id_and_rejects_duplicates() {
  let b = MemoryBackend::new();
  let user_id = Uuid::new_v4();
  let got = b
    .insert(Table::Users, json!({ "user_id": user_id, "full_name": "A" }))
    .await
    .unwrap();
  assert_eq!(got, user_id);

  let err = b
    .insert(Table::Users, json!({ "user_id": user_id, "full_name": "B" }))
    .await
    .unwrap_err();
  assert!(matches!(err, BackendError::Write(_)));
}

#[tokio::test]
async fn query_filters_orders_limits_and_projects() {
  let b = MemoryBackend::new();
  for (name, points) in [("Asha", 10), ("Bilal", 40), ("Chen", 25), ("Dana", 5)] {
    b.insert(Table::Users, json!({ "user_id": Uuid::new_v4(), "full_name": name, "reward_points": points, "role": "user" }))
      .await
      .unwrap();
  }
  b.insert(Table::Users, json!({ "user_id": Uuid::new_v4(), "full_name": "Eve", "reward_points": 99, "role": "admin" }))
    .await
    .unwrap();

  let q = Query::table(Table::Users)
    .select(&["full_name", "reward_points"])
    .eq("role", "user")
    .order("reward_points", Direction::Descending)
    .limit(3);
  let rows = b.query(&q).await.unwrap();

  let names: Vec<_> = rows.iter().map(|r| r["full_name"].as_str().unwrap()).collect();
  assert_eq!(names, ["Bilal", "Chen", "Asha"]);
  assert!(rows[0].get("role").is_none());
}

#[tokio::test]
async fn newest_first_ordering_is_stable() {
  let b = MemoryBackend::new();
  let mut ids = Vec::new();
  for i in 0..5 {
    ids.push(b.insert(Table::Items, json!({ "n": i })).await.unwrap());
  }
  let rows = b
    .query(&Query::table(Table::Items).order("created_at", Direction::Descending))
    .await
    .unwrap();
  let got: Vec<_> = rows.iter().map(|r| r["item_id"].as_str().unwrap().to_string()).collect();
  let want: Vec<_> = ids.iter().rev().map(Uuid::to_string).collect();
  assert_eq!(got, want);
}

#[tokio::test]
async fn update_and_delete() {
  let b = MemoryBackend::new();
  let id = b.insert(Table::Items, json!({ "status": "PENDING" })).await.unwrap();

  b.update(Table::Items, id, json!({ "status": "CLAIMED" })).await.unwrap();
  assert_eq!(b.rows(Table::Items)[0]["status"], "CLAIMED");

  b.delete(Table::Items, id).await.unwrap();
  assert!(b.rows(Table::Items).is_empty());
  assert!(b.delete(Table::Items, id).await.is_err());
  assert!(b.update(Table::Items, id, json!({})).await.is_err());
}

#[tokio::test]
async fn injected_failures() {
  let b = MemoryBackend::new();
  b.set_fail_queries(true);
  assert!(matches!(
    b.query(&Query::table(Table::Items)).await,
    Err(BackendError::Query(_))
  ));

  b.set_fail_writes(true);
  assert!(matches!(
    b.insert(Table::Items, json!({})).await,
    Err(BackendError::Write(_))
  ));
}

// ─── Storage ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_and_urls() {
  let b = MemoryBackend::new();
  b.upload_blob(Bucket::AiImages, "ai-1.png", Bytes::from_static(b"png"))
    .await
    .unwrap();
  assert_eq!(b.blob(Bucket::AiImages, "ai-1.png").unwrap(), Bytes::from_static(b"png"));
  assert_eq!(b.public_url(Bucket::AiImages, "ai-1.png"), "memory://ai-images/ai-1.png");

  let signed = b
    .signed_url(Bucket::AiImages, "ai-1.png", Duration::from_secs(3600))
    .await
    .unwrap();
  assert!(signed.starts_with("memory://ai-images/ai-1.png?token="));
  assert!(signed.ends_with("&expires_in=3600"));

  let dup = b
    .upload_blob(Bucket::AiImages, "ai-1.png", Bytes::from_static(b"again"))
    .await;
  assert!(matches!(dup, Err(BackendError::Storage(_))));
}

#[tokio::test]
async fn remove_blob_frees_the_name() {
  let b = MemoryBackend::new();
  b.upload_blob(Bucket::FoundImages, "x.jpg", Bytes::from_static(b"x"))
    .await
    .unwrap();
  b.remove_blob(Bucket::FoundImages, "x.jpg").await.unwrap();
  assert!(b.blob(Bucket::FoundImages, "x.jpg").is_none());
  b.remove_blob(Bucket::FoundImages, "x.jpg").await.unwrap();
  b.upload_blob(Bucket::FoundImages, "x.jpg", Bytes::from_static(b"y"))
    .await
    .unwrap();
}

#[tokio::test]
async fn storage_failure_injection() {
  let b = MemoryBackend::new();
  b.set_fail_storage(true);
  let err = b
    .upload_blob(Bucket::FoundImages, "x.jpg", Bytes::from_static(b"x"))
    .await
    .unwrap_err();
  assert!(matches!(err, BackendError::Storage(_)));
  assert_eq!(b.blob_count(), 0);
}
