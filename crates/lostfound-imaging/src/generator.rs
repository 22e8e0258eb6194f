//! Generator tiers: services that turn a prompt into image bytes.

use std::future::Future;

use bytes::Bytes;
use reqwest::Client;
use serde_json::json;

use crate::error::GenerationError;

/// A text-to-image service.
pub trait ImageGenerator: Send + Sync {
  /// Model or service name, used in logs and as the image's provenance.
  fn name(&self) -> &str;

  fn generate<'a>(
    &'a self,
    prompt: &'a str,
  ) -> impl Future<Output = Result<Bytes, GenerationError>> + Send + 'a;
}

/// Hugging Face inference endpoint for one model.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HfGenerator {
  client:   Client,
  endpoint: String,
  model:    String,
  token:    String,
}

impl HfGenerator {
  pub const DEFAULT_ENDPOINT: &'static str = "https://router.huggingface.co/hf-inference/models";
  pub const PRIMARY_MODEL: &'static str = "black-forest-labs/FLUX.1-schnell";
  pub const SECONDARY_MODEL: &'static str = "stabilityai/stable-diffusion-xl-base-1.0";

  pub fn new(
    client: Client,
    endpoint: impl Into<String>,
    model: impl Into<String>,
    token: impl Into<String>,
  ) -> Self {
    Self {
      client,
      endpoint: endpoint.into(),
      model: model.into(),
      token: token.into(),
    }
  }

  fn url(&self) -> String {
    format!("{}/{}", self.endpoint.trim_end_matches('/'), self.model)
  }
}

impl ImageGenerator for HfGenerator {
  fn name(&self) -> &str { &self.model }

  async fn generate(&self, prompt: &str) -> Result<Bytes, GenerationError> {
    tracing::debug!(model = %self.model, "requesting generated image");
    let resp = self
      .client
      .post(self.url())
      .bearer_auth(&self.token)
      .json(&json!({ "inputs": prompt }))
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(GenerationError::Status {
        model:  self.model.clone(),
        status: status.as_u16(),
      });
    }

    let bytes = resp.bytes().await?;
    if bytes.is_empty() {
      return Err(GenerationError::Empty(self.model.clone()));
    }
    Ok(bytes)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn model_url() {
    let generator = HfGenerator::new(
      Client::new(),
      "https://router.example/models/",
      HfGenerator::PRIMARY_MODEL,
      "hf_token",
    );
    assert_eq!(
      generator.url(),
      "https://router.example/models/black-forest-labs/FLUX.1-schnell"
    );
    assert_eq!(generator.name(), HfGenerator::PRIMARY_MODEL);
  }
}
