//! Error types for `lostfound-core`.

use thiserror::Error;
use uuid::Uuid;

/// Failures raised by the authentication side of the backend service.
#[derive(Debug, Error)]
pub enum AuthError {
  /// No profile exists for this email; the user should sign up first.
  #[error("{0} is not registered")]
  NotRegistered(String),

  #[error("incorrect password")]
  IncorrectPassword,

  #[error("no active session")]
  MissingSession,

  #[error("authentication rejected: {0}")]
  Rejected(String),
}

/// Failures raised by the table and storage sides of the backend service.
#[derive(Debug, Error)]
pub enum BackendError {
  #[error("query failed: {0}")]
  Query(String),

  #[error("write failed: {0}")]
  Write(String),

  #[error("storage failed: {0}")]
  Storage(String),

  #[error("transport error: {0}")]
  Transport(String),
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Auth(#[from] AuthError),

  #[error(transparent)]
  Backend(#[from] BackendError),

  #[error("item not found: {0}")]
  ItemNotFound(Uuid),

  #[error("profile missing for user {0}")]
  ProfileMissing(Uuid),

  #[error("owner contact not found for item {0}")]
  MissingContact(Uuid),

  #[error("you cannot contact yourself about your own report")]
  SelfContact,

  #[error("only the reporter or an admin may do that")]
  Forbidden,

  #[error("item {0} is already claimed")]
  AlreadyClaimed(Uuid),

  #[error("generate an image before submitting the report")]
  NoDraftImage,

  /// The draft that asked for the work was torn down.
  #[error("cancelled")]
  Cancelled,

  #[error("invalid input: {0}")]
  Validation(String),

  #[error("malformed row: {0}")]
  MalformedRow(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
