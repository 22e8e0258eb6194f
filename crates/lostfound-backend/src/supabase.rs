//! [`SupabaseBackend`]: the HTTP implementation of the backend traits.
//!
//! | Concern | Endpoint |
//! |---------|----------|
//! | sign up | `POST /auth/v1/signup` |
//! | sign in | `POST /auth/v1/token?grant_type=password` |
//! | sign out | `POST /auth/v1/logout` |
//! | tables | `GET/POST/PATCH/DELETE /rest/v1/{table}` |
//! | upload | `POST /storage/v1/object/{bucket}/{name}` |
//! | signed URL | `POST /storage/v1/object/sign/{bucket}/{name}` |

use std::{
  sync::{Arc, RwLock},
  time::Duration,
};

use bytes::Bytes;
use lostfound_core::{
  AuthError, BackendError,
  backend::{
    AuthService, BlobStorage, Bucket, Credentials, Direction, Query, Row, Session, Table,
    TableStore,
  },
};
use reqwest::{Client, RequestBuilder, Response, StatusCode, header::CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

/// Connection settings for a Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
  /// Project URL, e.g. `https://abcd.supabase.co`.
  pub url:      String,
  /// The project's anon (publishable) key.
  pub anon_key: String,
}

/// Cheap to clone; the HTTP client and the session slot are shared.
#[derive(Clone)]
pub struct SupabaseBackend {
  client:  Client,
  config:  SupabaseConfig,
  session: Arc<RwLock<Option<Session>>>,
}

impl SupabaseBackend {
  pub fn new(config: SupabaseConfig) -> Result<Self, BackendError> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(|e| BackendError::Transport(format!("failed to build HTTP client: {e}")))?;
    Ok(Self { client, config, session: Arc::default() })
  }

  /// Resume a previously persisted session.
  pub fn with_session(self, session: Session) -> Self {
    self.set_session(Some(session));
    self
  }

  fn set_session(&self, session: Option<Session>) {
    let mut slot = self.session.write().unwrap_or_else(|p| p.into_inner());
    *slot = session;
  }

  fn access_token(&self) -> Option<String> {
    let slot = self.session.read().unwrap_or_else(|p| p.into_inner());
    slot
      .as_ref()
      .map(|s| s.access_token.clone())
      .filter(|t| !t.is_empty())
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.url.trim_end_matches('/'), path)
  }

  /// Attach the API key and the user's bearer token (or the anon key before
  /// sign-in).
  fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
    let bearer = self
      .access_token()
      .unwrap_or_else(|| self.config.anon_key.clone());
    req.header("apikey", &self.config.anon_key).bearer_auth(bearer)
  }

  fn id_filter(table: Table, id: Uuid) -> [(String, String); 1] {
    [(table.id_column().to_string(), format!("eq.{id}"))]
  }
}

fn transport(e: reqwest::Error) -> BackendError { BackendError::Transport(e.to_string()) }

async fn failure_text(resp: Response) -> String {
  let status = resp.status();
  let body = resp.text().await.unwrap_or_default();
  format!("{status}: {body}")
}

/// PostgREST query-string pairs for `query`.
pub(crate) fn query_params(query: &Query) -> Vec<(String, String)> {
  let mut params = Vec::with_capacity(query.filters.len() + 3);
  let select = if query.columns.is_empty() {
    "*".to_string()
  } else {
    query.columns.join(",")
  };
  params.push(("select".to_string(), select));

  for filter in &query.filters {
    let value = match &filter.value {
      Value::String(s) => s.clone(),
      other => other.to_string(),
    };
    params.push((filter.column.clone(), format!("eq.{value}")));
  }

  if let Some(order) = &query.order {
    let dir = match order.direction {
      Direction::Ascending => "asc",
      Direction::Descending => "desc",
    };
    params.push(("order".to_string(), format!("{}.{dir}", order.column)));
  }

  if let Some(limit) = query.limit {
    params.push(("limit".to_string(), limit.to_string()));
  }
  params
}

/// Map a rejected password grant. GoTrue answers wrong passwords and unknown
/// emails with the same "Invalid login credentials" message.
pub(crate) fn sign_in_error(status: StatusCode, body: &str) -> AuthError {
  if status == StatusCode::BAD_REQUEST && body.contains("Invalid login credentials") {
    AuthError::IncorrectPassword
  } else {
    AuthError::Rejected(format!("{status}: {body}"))
  }
}

fn content_type_for(name: &str) -> &'static str {
  let ext = name.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
  match ext.as_deref() {
    Some("png") => "image/png",
    Some("jpg" | "jpeg") => "image/jpeg",
    Some("webp") => "image/webp",
    Some("gif") => "image/gif",
    Some("heic") => "image/heic",
    _ => "application/octet-stream",
  }
}

// ─── Auth ────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct AuthUser {
  id:    Uuid,
  email: Option<String>,
}

/// GoTrue returns a session when sign-up needs no confirmation and a bare
/// user object otherwise.
#[derive(Deserialize)]
struct AuthResponse {
  access_token: Option<String>,
  user:         Option<AuthUser>,
  id:           Option<Uuid>,
  email:        Option<String>,
}

impl AuthResponse {
  fn into_session(self, fallback_email: &str) -> Option<Session> {
    let (user_id, email) = match self.user {
      Some(user) => (user.id, user.email),
      None => (self.id?, self.email),
    };
    Some(Session {
      user_id,
      email: email.unwrap_or_else(|| fallback_email.to_string()),
      access_token: self.access_token.unwrap_or_default(),
    })
  }
}

impl AuthService for SupabaseBackend {
  async fn sign_up(&self, credentials: &Credentials) -> Result<Session, AuthError> {
    let resp = self
      .authorize(self.client.post(self.url("/auth/v1/signup")))
      .json(&json!({ "email": credentials.email, "password": credentials.password }))
      .send()
      .await
      .map_err(|e| AuthError::Rejected(e.to_string()))?;

    if !resp.status().is_success() {
      return Err(AuthError::Rejected(failure_text(resp).await));
    }

    let body: AuthResponse = resp
      .json()
      .await
      .map_err(|e| AuthError::Rejected(format!("unexpected sign-up response: {e}")))?;
    let session = body
      .into_session(&credentials.email)
      .ok_or_else(|| AuthError::Rejected("Signup failed. Please try again.".into()))?;
    self.set_session(Some(session.clone()));
    Ok(session)
  }

  async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
    let resp = self
      .client
      .post(self.url("/auth/v1/token"))
      .query(&[("grant_type", "password")])
      .header("apikey", &self.config.anon_key)
      .json(&json!({ "email": credentials.email, "password": credentials.password }))
      .send()
      .await
      .map_err(|e| AuthError::Rejected(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(sign_in_error(status, &body));
    }

    let body: AuthResponse = resp
      .json()
      .await
      .map_err(|e| AuthError::Rejected(format!("unexpected sign-in response: {e}")))?;
    let session = body
      .into_session(&credentials.email)
      .filter(|s| !s.access_token.is_empty())
      .ok_or_else(|| AuthError::Rejected("sign-in returned no session".into()))?;
    self.set_session(Some(session.clone()));
    tracing::debug!(user_id = %session.user_id, "signed in");
    Ok(session)
  }

  async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
    let resp = self
      .client
      .post(self.url("/auth/v1/logout"))
      .header("apikey", &self.config.anon_key)
      .bearer_auth(&session.access_token)
      .send()
      .await
      .map_err(|e| AuthError::Rejected(e.to_string()))?;
    self.set_session(None);

    if !resp.status().is_success() {
      return Err(AuthError::Rejected(failure_text(resp).await));
    }
    Ok(())
  }
}

// ─── Tables ──────────────────────────────────────────────────────────────────

impl TableStore for SupabaseBackend {
  async fn query(&self, query: &Query) -> Result<Vec<Row>, BackendError> {
    let resp = self
      .authorize(self.client.get(self.url(&format!("/rest/v1/{}", query.table))))
      .query(&query_params(query))
      .send()
      .await
      .map_err(transport)?;

    if !resp.status().is_success() {
      return Err(BackendError::Query(failure_text(resp).await));
    }
    resp
      .json()
      .await
      .map_err(|e| BackendError::Query(format!("decoding {} rows: {e}", query.table)))
  }

  async fn insert(&self, table: Table, record: Value) -> Result<Uuid, BackendError> {
    let resp = self
      .authorize(self.client.post(self.url(&format!("/rest/v1/{table}"))))
      .header("Prefer", "return=representation")
      .json(&[record])
      .send()
      .await
      .map_err(transport)?;

    if !resp.status().is_success() {
      return Err(BackendError::Write(failure_text(resp).await));
    }

    let rows: Vec<Row> = resp
      .json()
      .await
      .map_err(|e| BackendError::Write(format!("decoding inserted {table} row: {e}")))?;
    rows
      .first()
      .and_then(|row| row.get(table.id_column()))
      .and_then(Value::as_str)
      .and_then(|s| Uuid::parse_str(s).ok())
      .ok_or_else(|| BackendError::Write(format!("insert into {table} returned no id")))
  }

  async fn update(&self, table: Table, id: Uuid, patch: Value) -> Result<(), BackendError> {
    let resp = self
      .authorize(self.client.patch(self.url(&format!("/rest/v1/{table}"))))
      .query(&Self::id_filter(table, id))
      .header("Prefer", "return=minimal")
      .json(&patch)
      .send()
      .await
      .map_err(transport)?;

    if !resp.status().is_success() {
      return Err(BackendError::Write(failure_text(resp).await));
    }
    Ok(())
  }

  async fn delete(&self, table: Table, id: Uuid) -> Result<(), BackendError> {
    let resp = self
      .authorize(self.client.delete(self.url(&format!("/rest/v1/{table}"))))
      .query(&Self::id_filter(table, id))
      .send()
      .await
      .map_err(transport)?;

    if !resp.status().is_success() {
      return Err(BackendError::Write(failure_text(resp).await));
    }
    Ok(())
  }
}

// ─── Storage ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SignedUrlResponse {
  #[serde(rename = "signedURL")]
  signed_url: String,
}

impl BlobStorage for SupabaseBackend {
  async fn upload_blob(&self, bucket: Bucket, name: &str, bytes: Bytes) -> Result<(), BackendError> {
    let resp = self
      .authorize(
        self
          .client
          .post(self.url(&format!("/storage/v1/object/{bucket}/{name}"))),
      )
      .header(CONTENT_TYPE, content_type_for(name))
      .body(bytes)
      .send()
      .await
      .map_err(|e| BackendError::Storage(e.to_string()))?;

    if !resp.status().is_success() {
      return Err(BackendError::Storage(failure_text(resp).await));
    }
    Ok(())
  }

  async fn remove_blob(&self, bucket: Bucket, name: &str) -> Result<(), BackendError> {
    let resp = self
      .authorize(
        self
          .client
          .delete(self.url(&format!("/storage/v1/object/{bucket}/{name}"))),
      )
      .send()
      .await
      .map_err(|e| BackendError::Storage(e.to_string()))?;

    if !resp.status().is_success() && resp.status() != StatusCode::NOT_FOUND {
      return Err(BackendError::Storage(failure_text(resp).await));
    }
    Ok(())
  }

  fn public_url(&self, bucket: Bucket, name: &str) -> String {
    self.url(&format!("/storage/v1/object/public/{bucket}/{name}"))
  }

  async fn signed_url(&self, bucket: Bucket, name: &str, ttl: Duration) -> Result<String, BackendError> {
    let resp = self
      .authorize(
        self
          .client
          .post(self.url(&format!("/storage/v1/object/sign/{bucket}/{name}"))),
      )
      .json(&json!({ "expiresIn": ttl.as_secs() }))
      .send()
      .await
      .map_err(|e| BackendError::Storage(e.to_string()))?;

    if !resp.status().is_success() {
      return Err(BackendError::Storage(failure_text(resp).await));
    }

    let body: SignedUrlResponse = resp
      .json()
      .await
      .map_err(|e| BackendError::Storage(format!("decoding signed URL: {e}")))?;
    Ok(self.url(&format!("/storage/v1{}", body.signed_url)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn backend() -> SupabaseBackend {
    SupabaseBackend::new(SupabaseConfig {
      url:      "https://proj.supabase.test/".into(),
      anon_key: "anon".into(),
    })
    .unwrap()
  }

  #[test]
  fn feed_query_params() {
    let q = Query::table(Table::Items)
      .eq("status", "PENDING")
      .eq("item_type", "LOST")
      .order("created_at", Direction::Descending);
    assert_eq!(
      query_params(&q),
      vec![
        ("select".to_string(), "*".to_string()),
        ("status".to_string(), "eq.PENDING".to_string()),
        ("item_type".to_string(), "eq.LOST".to_string()),
        ("order".to_string(), "created_at.desc".to_string()),
      ]
    );
  }

  #[test]
  fn leaderboard_query_params() {
    let q = Query::table(Table::Users)
      .select(&["full_name", "reward_points"])
      .order("reward_points", Direction::Descending)
      .limit(5);
    let params = query_params(&q);
    assert_eq!(params[0], ("select".to_string(), "full_name,reward_points".to_string()));
    assert_eq!(params[2], ("limit".to_string(), "5".to_string()));
  }

  #[test]
  fn invalid_credentials_map_to_incorrect_password() {
    let body = r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#;
    assert!(matches!(
      sign_in_error(StatusCode::BAD_REQUEST, body),
      AuthError::IncorrectPassword
    ));
    assert!(matches!(
      sign_in_error(StatusCode::TOO_MANY_REQUESTS, "rate limited"),
      AuthError::Rejected(_)
    ));
  }

  #[test]
  fn storage_urls() {
    let b = backend();
    assert_eq!(
      b.public_url(Bucket::FoundImages, "u-1.jpg"),
      "https://proj.supabase.test/storage/v1/object/public/found-images/u-1.jpg"
    );
    assert_eq!(content_type_for("ai-1-abc.png"), "image/png");
    assert_eq!(content_type_for("IMG.JPEG"), "image/jpeg");
    assert_eq!(content_type_for("blob"), "application/octet-stream");
  }

  #[test]
  fn sign_up_response_shapes() {
    let id = Uuid::new_v4();
    let with_session: AuthResponse = serde_json::from_value(json!({
      "access_token": "jwt", "user": { "id": id, "email": "a@campus.edu" }
    }))
    .unwrap();
    let s = with_session.into_session("x@y.z").unwrap();
    assert_eq!((s.user_id, s.email.as_str(), s.access_token.as_str()), (id, "a@campus.edu", "jwt"));

    let bare_user: AuthResponse = serde_json::from_value(json!({ "id": id })).unwrap();
    let s = bare_user.into_session("b@campus.edu").unwrap();
    assert_eq!(s.email, "b@campus.edu");
    assert!(s.access_token.is_empty());
  }

  #[test]
  fn session_token_overrides_anon_key() {
    let b = backend();
    assert_eq!(b.access_token(), None);
    let b = b.with_session(Session {
      user_id:      Uuid::new_v4(),
      email:        "a@campus.edu".into(),
      access_token: "jwt".into(),
    });
    assert_eq!(b.access_token().as_deref(), Some("jwt"));
  }
}
