//! The degrading acquisition driver.
//!
//! Tiers run strictly in sequence:
//!
//! 1. each configured generator, in order, until one returns bytes;
//! 2. commit of those bytes to blob storage (failure skips to 3, the bytes
//!    are dropped and no generator is retried);
//! 3. a directly rendered URL, kept if the load probe succeeds;
//! 4. a text placeholder, which cannot fail.
//!
//! Every tier is bounded by [`PipelineConfig::tier_timeout`]. The cancel
//! token is checked before each tier and raced against every in-flight call.

use std::{future::Future, sync::Arc, time::Duration};

use bytes::Bytes;
use chrono::Utc;
use lostfound_core::{
  BackendError,
  backend::{BlobStorage, Bucket},
};
use serde::Serialize;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::{
  cancel::CancelToken,
  error::{Cancelled, GenerationError, LoadError},
  generator::ImageGenerator,
  naming::blob_name,
  probe::ImageProbe,
  render::{DirectRender, Placeholder, random_seed},
  request::AcquireRequest,
};

// ─── Config ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
  pub tier_timeout: Duration,
}

impl PipelineConfig {
  pub const MIN_TIMEOUT: Duration = Duration::from_secs(5);
  pub const MAX_TIMEOUT: Duration = Duration::from_secs(30);

  /// Build from seconds, clamped to `MIN_TIMEOUT..=MAX_TIMEOUT`.
  pub fn from_secs(secs: u64) -> Self {
    Self {
      tier_timeout: Duration::from_secs(secs).clamp(Self::MIN_TIMEOUT, Self::MAX_TIMEOUT),
    }
  }
}

impl Default for PipelineConfig {
  fn default() -> Self { Self { tier_timeout: Duration::from_secs(20) } }
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// Which tier supplied the reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum ImageSource {
  Generated { model: String },
  DirectRender,
  Placeholder,
}

/// The single image reference produced by one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Acquisition {
  pub url:    String,
  pub source: ImageSource,
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

pub struct AcquisitionPipeline<G, S, P> {
  generators:  Vec<G>,
  storage:     Arc<S>,
  probe:       P,
  render:      DirectRender,
  placeholder: Placeholder,
  config:      PipelineConfig,
  seed:        fn() -> u32,
}

impl<G, S, P> AcquisitionPipeline<G, S, P>
where
  G: ImageGenerator,
  S: BlobStorage,
  P: ImageProbe,
{
  /// `generators` are tried in the given order.
  pub fn new(generators: Vec<G>, storage: Arc<S>, probe: P) -> Self {
    Self {
      generators,
      storage,
      probe,
      render: DirectRender::default(),
      placeholder: Placeholder::default(),
      config: PipelineConfig::default(),
      seed: random_seed,
    }
  }

  pub fn with_config(mut self, config: PipelineConfig) -> Self {
    self.config = config;
    self
  }

  pub fn with_render(mut self, render: DirectRender) -> Self {
    self.render = render;
    self
  }

  pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
    self.placeholder = placeholder;
    self
  }

  pub fn with_seed(mut self, seed: fn() -> u32) -> Self {
    self.seed = seed;
    self
  }

  pub fn config(&self) -> PipelineConfig { self.config }

  /// Produce exactly one image reference for `request`.
  ///
  /// Returns `Err(Cancelled)` only when `cancel` fires; in that case nothing
  /// further is attempted and no reference is produced.
  pub async fn acquire(
    &self,
    request: &AcquireRequest,
    cancel: &CancelToken,
  ) -> Result<Acquisition, Cancelled> {
    if let Some((model, bytes)) = self.generate(request, cancel).await? {
      match self.commit(bytes, cancel).await? {
        Ok(url) => {
          info!(%model, %url, "generated image stored");
          return Ok(Acquisition { url, source: ImageSource::Generated { model } });
        }
        Err(e) => warn!(%model, error = %e, "storing generated image failed, using direct render"),
      }
    }

    let url = self.render.build_url(&request.render_prompt(), (self.seed)());
    let loaded = self
      .bounded(cancel, self.probe.probe(&url))
      .await?
      .unwrap_or_else(|elapsed| Err(LoadError::TimedOut(elapsed)));

    match loaded {
      Ok(()) => {
        info!(%url, "direct render loaded");
        Ok(Acquisition { url, source: ImageSource::DirectRender })
      }
      Err(e) => {
        warn!(error = %e, "direct render failed to load, using placeholder");
        Ok(Acquisition {
          url:    self.placeholder.build_url(&request.title),
          source: ImageSource::Placeholder,
        })
      }
    }
  }

  /// Byte tiers: first generator to return bytes wins.
  async fn generate(
    &self,
    request: &AcquireRequest,
    cancel: &CancelToken,
  ) -> Result<Option<(String, Bytes)>, Cancelled> {
    let prompt = request.generation_prompt();
    for generator in &self.generators {
      let result = self
        .bounded(cancel, generator.generate(&prompt))
        .await?
        .unwrap_or_else(|elapsed| Err(GenerationError::TimedOut(elapsed)));

      match result {
        Ok(bytes) => return Ok(Some((generator.name().to_string(), bytes))),
        Err(e) => warn!(model = generator.name(), error = %e, "image generation failed"),
      }
    }
    Ok(None)
  }

  /// Upload generated bytes under a fresh name and resolve their public URL.
  async fn commit(
    &self,
    bytes: Bytes,
    cancel: &CancelToken,
  ) -> Result<Result<String, BackendError>, Cancelled> {
    let name = blob_name(&bytes, Utc::now());
    let uploaded = self
      .bounded(cancel, self.storage.upload_blob(Bucket::AiImages, &name, bytes))
      .await?
      .unwrap_or_else(|elapsed| {
        Err(BackendError::Storage(format!("upload timed out after {elapsed:?}")))
      });
    Ok(uploaded.map(|()| self.storage.public_url(Bucket::AiImages, &name)))
  }

  /// Run `fut` under the tier timeout, abandoning it if `cancel` fires.
  ///
  /// The inner `Err` carries the elapsed timeout.
  async fn bounded<F, T>(&self, cancel: &CancelToken, fut: F) -> Result<Result<T, Duration>, Cancelled>
  where
    F: Future<Output = T>,
  {
    if cancel.is_cancelled() {
      return Err(Cancelled);
    }
    let limit = self.config.tier_timeout;
    tokio::select! {
      biased;
      _ = cancel.cancelled() => Err(Cancelled),
      out = timeout(limit, fut) => Ok(out.map_err(|_| limit)),
    }
  }
}
