//! The backend-as-a-service collaborator: authentication, relational tables
//! and blob storage.
//!
//! Implemented by `lostfound-backend` (an HTTP client and an in-memory
//! double). Flows depend on these traits, never on a concrete backend.

use std::{future::Future, time::Duration};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display};
use uuid::Uuid;

use crate::error::{AuthError, BackendError};

/// A raw table row.
pub type Row = Value;

// ─── Auth types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Credentials {
  pub email:    String,
  pub password: String,
}

/// An authenticated session. Serialisable so a client can persist it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub user_id:      Uuid,
  pub email:        String,
  pub access_token: String,
}

// ─── Tables and buckets ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Table {
  Users,
  Items,
}

impl Table {
  /// Primary key column.
  pub fn id_column(self) -> &'static str {
    match self {
      Self::Users => "user_id",
      Self::Items => "item_id",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Bucket {
  /// Generated images and owners' photos of lost items.
  AiImages,
  /// Finders' photos of found items.
  FoundImages,
}

// ─── Query ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
  pub column: String,
  pub value:  Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Ascending,
  Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
  pub column:    String,
  pub direction: Direction,
}

/// Parameters for [`TableStore::query`]: equality filters joined by AND, an
/// optional sort column and an optional row limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
  pub table:   Table,
  pub columns: Vec<String>,
  pub filters: Vec<Filter>,
  pub order:   Option<Order>,
  pub limit:   Option<usize>,
}

impl Query {
  pub fn table(table: Table) -> Self {
    Self { table, columns: Vec::new(), filters: Vec::new(), order: None, limit: None }
  }

  /// Restrict the returned columns. Empty means all columns.
  pub fn select(mut self, columns: &[&str]) -> Self {
    self.columns = columns.iter().map(|c| (*c).to_string()).collect();
    self
  }

  pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
    self.filters.push(Filter { column: column.to_string(), value: value.into() });
    self
  }

  pub fn order(mut self, column: &str, direction: Direction) -> Self {
    self.order = Some(Order { column: column.to_string(), direction });
    self
  }

  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }
}

// ─── Traits ──────────────────────────────────────────────────────────────────

pub trait AuthService: Send + Sync {
  /// Create an account and return its first session.
  fn sign_up<'a>(
    &'a self,
    credentials: &'a Credentials,
  ) -> impl Future<Output = Result<Session, AuthError>> + Send + 'a;

  /// Exchange credentials for a session. Invalid credentials must surface as
  /// [`AuthError::IncorrectPassword`].
  fn sign_in<'a>(
    &'a self,
    credentials: &'a Credentials,
  ) -> impl Future<Output = Result<Session, AuthError>> + Send + 'a;

  fn sign_out<'a>(
    &'a self,
    session: &'a Session,
  ) -> impl Future<Output = Result<(), AuthError>> + Send + 'a;
}

pub trait TableStore: Send + Sync {
  fn query<'a>(
    &'a self,
    query: &'a Query,
  ) -> impl Future<Output = Result<Vec<Row>, BackendError>> + Send + 'a;

  /// Insert a record and return its primary key. The store assigns the key
  /// and `created_at` when the record does not carry them.
  fn insert(
    &self,
    table: Table,
    record: Value,
  ) -> impl Future<Output = Result<Uuid, BackendError>> + Send + '_;

  fn update(
    &self,
    table: Table,
    id: Uuid,
    patch: Value,
  ) -> impl Future<Output = Result<(), BackendError>> + Send + '_;

  fn delete(
    &self,
    table: Table,
    id: Uuid,
  ) -> impl Future<Output = Result<(), BackendError>> + Send + '_;
}

pub trait BlobStorage: Send + Sync {
  fn upload_blob<'a>(
    &'a self,
    bucket: Bucket,
    name: &'a str,
    bytes: Bytes,
  ) -> impl Future<Output = Result<(), BackendError>> + Send + 'a;

  /// Delete an object. Removing a missing object is not an error.
  fn remove_blob<'a>(
    &'a self,
    bucket: Bucket,
    name: &'a str,
  ) -> impl Future<Output = Result<(), BackendError>> + Send + 'a;

  /// Publicly readable URL of an object. Pure construction, no request.
  fn public_url(&self, bucket: Bucket, name: &str) -> String;

  /// Time-limited URL for an object in a private bucket.
  fn signed_url<'a>(
    &'a self,
    bucket: Bucket,
    name: &'a str,
    ttl: Duration,
  ) -> impl Future<Output = Result<String, BackendError>> + Send + 'a;
}

/// The full backend service.
pub trait Backend: AuthService + TableStore + BlobStorage {}

impl<T: AuthService + TableStore + BlobStorage> Backend for T {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn query_builder() {
    let q = Query::table(Table::Items)
      .eq("status", "PENDING")
      .eq("item_type", "FOUND")
      .order("created_at", Direction::Descending)
      .limit(10);
    assert_eq!(q.filters.len(), 2);
    assert_eq!(q.filters[1].value, Value::from("FOUND"));
    assert_eq!(q.order.unwrap().direction, Direction::Descending);
    assert_eq!(q.limit, Some(10));
  }

  #[test]
  fn wire_names() {
    assert_eq!(Table::Items.to_string(), "items");
    assert_eq!(Table::Users.id_column(), "user_id");
    assert_eq!(Bucket::AiImages.as_ref(), "ai-images");
    assert_eq!(Bucket::FoundImages.to_string(), "found-images");
  }
}
