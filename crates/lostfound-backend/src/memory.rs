//! [`MemoryBackend`]: an in-process implementation of every backend trait.

use std::{
  cmp::Ordering,
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard},
  time::Duration,
};

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use lostfound_core::{
  AuthError, BackendError,
  backend::{
    AuthService, BlobStorage, Bucket, Credentials, Direction, Query, Row, Session, Table,
    TableStore,
  },
};
use serde_json::{Map, Value};
use uuid::Uuid;

struct Account {
  user_id:  Uuid,
  password: String,
}

#[derive(Default)]
struct State {
  accounts:     HashMap<String, Account>,
  tokens:       HashMap<String, Uuid>,
  tables:       HashMap<Table, Vec<Map<String, Value>>>,
  blobs:        HashMap<(Bucket, String), Bytes>,
  last_created: Option<DateTime<Utc>>,
  fail_queries: bool,
  fail_writes:  bool,
  fail_storage: bool,
}

impl State {
  /// Strictly increasing creation timestamps, so newest-first ordering is
  /// stable even for inserts within the same clock tick.
  fn next_created_at(&mut self) -> DateTime<Utc> {
    let now = Utc::now();
    let next = match self.last_created {
      Some(last) if last >= now => last + chrono::Duration::microseconds(1),
      _ => now,
    };
    self.last_created = Some(next);
    next
  }

  fn rows_mut(&mut self, table: Table) -> &mut Vec<Map<String, Value>> {
    self.tables.entry(table).or_default()
  }
}

/// Cloning is cheap; the state is shared.
#[derive(Clone, Default)]
pub struct MemoryBackend {
  state: Arc<Mutex<State>>,
}

impl MemoryBackend {
  pub fn new() -> Self { Self::default() }

  fn state(&self) -> MutexGuard<'_, State> {
    self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// Make every subsequent query fail.
  pub fn set_fail_queries(&self, fail: bool) { self.state().fail_queries = fail; }

  /// Make every subsequent insert, update and delete fail.
  pub fn set_fail_writes(&self, fail: bool) { self.state().fail_writes = fail; }

  /// Make every subsequent upload fail.
  pub fn set_fail_storage(&self, fail: bool) { self.state().fail_storage = fail; }

  /// All rows of `table` in insertion order.
  pub fn rows(&self, table: Table) -> Vec<Row> {
    self
      .state()
      .tables
      .get(&table)
      .map(|rows| rows.iter().cloned().map(Value::Object).collect())
      .unwrap_or_default()
  }

  pub fn blob(&self, bucket: Bucket, name: &str) -> Option<Bytes> {
    self.state().blobs.get(&(bucket, name.to_string())).cloned()
  }

  pub fn blob_count(&self) -> usize { self.state().blobs.len() }

  fn url(bucket: Bucket, name: &str) -> String { format!("memory://{bucket}/{name}") }
}

// ─── Auth ────────────────────────────────────────────────────────────────────

impl AuthService for MemoryBackend {
  async fn sign_up(&self, credentials: &Credentials) -> Result<Session, AuthError> {
    let email = credentials.email.trim().to_lowercase();
    if email.is_empty() || credentials.password.len() < 6 {
      return Err(AuthError::Rejected(
        "email required and password must be at least 6 characters".into(),
      ));
    }

    let mut state = self.state();
    if state.accounts.contains_key(&email) {
      return Err(AuthError::Rejected("User already registered".into()));
    }

    let user_id = Uuid::new_v4();
    state.accounts.insert(email.clone(), Account {
      user_id,
      password: credentials.password.clone(),
    });
    let access_token = format!("mem-{}", Uuid::new_v4());
    state.tokens.insert(access_token.clone(), user_id);
    Ok(Session { user_id, email, access_token })
  }

  async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
    let email = credentials.email.trim().to_lowercase();
    let mut state = self.state();
    let user_id = match state.accounts.get(&email) {
      Some(account) if account.password == credentials.password => account.user_id,
      _ => return Err(AuthError::IncorrectPassword),
    };
    let access_token = format!("mem-{}", Uuid::new_v4());
    state.tokens.insert(access_token.clone(), user_id);
    Ok(Session { user_id, email, access_token })
  }

  async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
    self
      .state()
      .tokens
      .remove(&session.access_token)
      .map(|_| ())
      .ok_or(AuthError::MissingSession)
  }
}

// ─── Tables ──────────────────────────────────────────────────────────────────

impl TableStore for MemoryBackend {
  async fn query(&self, query: &Query) -> Result<Vec<Row>, BackendError> {
    let state = self.state();
    if state.fail_queries {
      return Err(BackendError::Query("injected query failure".into()));
    }

    let mut rows: Vec<&Map<String, Value>> = state
      .tables
      .get(&query.table)
      .map(|rows| {
        rows
          .iter()
          .filter(|row| {
            query
              .filters
              .iter()
              .all(|f| row.get(&f.column).is_some_and(|v| *v == f.value))
          })
          .collect()
      })
      .unwrap_or_default();

    if let Some(order) = &query.order {
      rows.sort_by(|a, b| {
        let ord = compare(a.get(&order.column), b.get(&order.column));
        match order.direction {
          Direction::Ascending => ord,
          Direction::Descending => ord.reverse(),
        }
      });
    }

    let limit = query.limit.unwrap_or(usize::MAX);
    Ok(
      rows
        .into_iter()
        .take(limit)
        .map(|row| Value::Object(project(row, &query.columns)))
        .collect(),
    )
  }

  async fn insert(&self, table: Table, record: Value) -> Result<Uuid, BackendError> {
    let Value::Object(mut record) = record else {
      return Err(BackendError::Write("record must be a JSON object".into()));
    };

    let mut state = self.state();
    if state.fail_writes {
      return Err(BackendError::Write("injected write failure".into()));
    }

    let id_column = table.id_column();
    let id = match record.get(id_column) {
      Some(v) => parse_id(v)?,
      None => Uuid::new_v4(),
    };
    if state.rows_mut(table).iter().any(|row| row_id(row, id_column) == Some(id)) {
      return Err(BackendError::Write(format!("duplicate key {id_column}={id}")));
    }

    record.insert(id_column.to_string(), Value::String(id.to_string()));
    if !record.contains_key("created_at") {
      let created = state.next_created_at();
      record.insert(
        "created_at".into(),
        Value::String(created.to_rfc3339_opts(SecondsFormat::Micros, true)),
      );
    }
    state.rows_mut(table).push(record);
    Ok(id)
  }

  async fn update(&self, table: Table, id: Uuid, patch: Value) -> Result<(), BackendError> {
    let Value::Object(patch) = patch else {
      return Err(BackendError::Write("patch must be a JSON object".into()));
    };

    let mut state = self.state();
    if state.fail_writes {
      return Err(BackendError::Write("injected write failure".into()));
    }

    let id_column = table.id_column();
    let row = state
      .rows_mut(table)
      .iter_mut()
      .find(|row| row_id(row, id_column) == Some(id))
      .ok_or_else(|| BackendError::Write(format!("no {table} row with {id_column}={id}")))?;
    row.extend(patch);
    Ok(())
  }

  async fn delete(&self, table: Table, id: Uuid) -> Result<(), BackendError> {
    let mut state = self.state();
    if state.fail_writes {
      return Err(BackendError::Write("injected write failure".into()));
    }

    let id_column = table.id_column();
    let rows = state.rows_mut(table);
    let before = rows.len();
    rows.retain(|row| row_id(row, id_column) != Some(id));
    if rows.len() == before {
      return Err(BackendError::Write(format!("no {table} row with {id_column}={id}")));
    }
    Ok(())
  }
}

fn parse_id(v: &Value) -> Result<Uuid, BackendError> {
  v.as_str()
    .and_then(|s| Uuid::parse_str(s).ok())
    .ok_or_else(|| BackendError::Write(format!("invalid id {v}")))
}

fn row_id(row: &Map<String, Value>, id_column: &str) -> Option<Uuid> {
  row.get(id_column).and_then(|v| v.as_str()).and_then(|s| Uuid::parse_str(s).ok())
}

fn project(row: &Map<String, Value>, columns: &[String]) -> Map<String, Value> {
  if columns.is_empty() {
    return row.clone();
  }
  columns
    .iter()
    .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
    .collect()
}

/// Missing and null values sort first; numbers and strings compare naturally.
fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
  match (a, b) {
    (Some(Value::Number(x)), Some(Value::Number(y))) => x
      .as_f64()
      .partial_cmp(&y.as_f64())
      .unwrap_or(Ordering::Equal),
    (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
    (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
    (None | Some(Value::Null), _) => Ordering::Less,
    (_, None | Some(Value::Null)) => Ordering::Greater,
    _ => Ordering::Equal,
  }
}

// ─── Storage ─────────────────────────────────────────────────────────────────

impl BlobStorage for MemoryBackend {
  async fn upload_blob(&self, bucket: Bucket, name: &str, bytes: Bytes) -> Result<(), BackendError> {
    let mut state = self.state();
    if state.fail_storage {
      return Err(BackendError::Storage("injected storage failure".into()));
    }
    let key = (bucket, name.to_string());
    if state.blobs.contains_key(&key) {
      return Err(BackendError::Storage(format!("{bucket}/{name} already exists")));
    }
    state.blobs.insert(key, bytes);
    Ok(())
  }

  async fn remove_blob(&self, bucket: Bucket, name: &str) -> Result<(), BackendError> {
    let mut state = self.state();
    if state.fail_storage {
      return Err(BackendError::Storage("injected storage failure".into()));
    }
    state.blobs.remove(&(bucket, name.to_string()));
    Ok(())
  }

  fn public_url(&self, bucket: Bucket, name: &str) -> String { Self::url(bucket, name) }

  async fn signed_url(&self, bucket: Bucket, name: &str, ttl: Duration) -> Result<String, BackendError> {
    if !self.state().blobs.contains_key(&(bucket, name.to_string())) {
      return Err(BackendError::Storage(format!("{bucket}/{name} not found")));
    }
    Ok(format!(
      "{}?token={}&expires_in={}",
      Self::url(bucket, name),
      Uuid::new_v4().simple(),
      ttl.as_secs()
    ))
  }
}
