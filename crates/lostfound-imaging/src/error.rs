//! Error types for `lostfound-imaging`.
//!
//! These are recovery signals inside the pipeline. Only [`Cancelled`] ever
//! leaves [`crate::AcquisitionPipeline::acquire`].

use std::time::Duration;

use thiserror::Error;

/// A generator tier produced no image.
#[derive(Debug, Error)]
pub enum GenerationError {
  #[error("{model} returned status {status}")]
  Status { model: String, status: u16 },

  #[error("{0} returned an empty body")]
  Empty(String),

  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("timed out after {0:?}")]
  TimedOut(Duration),
}

/// A rendered image URL did not load.
#[derive(Debug, Error)]
pub enum LoadError {
  #[error("status {0}")]
  Status(u16),

  #[error("not an image: {0}")]
  NotAnImage(String),

  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("timed out after {0:?}")]
  TimedOut(Duration),
}

/// The draft that requested the image was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("image acquisition cancelled")]
pub struct Cancelled;
