//! Layered settings and the persisted session file.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use lostfound_core::backend::Session;
use lostfound_imaging::{HfGenerator, PipelineConfig};
use serde::Deserialize;

/// Deserialised from the optional TOML file, overridden by `LOSTFOUND_*`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// Supabase project URL.
  pub supabase_url:      String,
  /// Supabase anon key.
  pub supabase_key:      String,
  /// Hugging Face token. Empty disables the generator tiers.
  #[serde(default)]
  pub hf_token:          String,
  #[serde(default = "default_hf_endpoint")]
  pub hf_endpoint:       String,
  #[serde(default = "default_primary_model")]
  pub primary_model:     String,
  #[serde(default = "default_secondary_model")]
  pub secondary_model:   String,
  #[serde(default = "default_tier_timeout")]
  pub tier_timeout_secs: u64,
  #[serde(default = "default_session_path")]
  pub session_path:      PathBuf,
}

fn default_hf_endpoint() -> String { HfGenerator::DEFAULT_ENDPOINT.to_string() }
fn default_primary_model() -> String { HfGenerator::PRIMARY_MODEL.to_string() }
fn default_secondary_model() -> String { HfGenerator::SECONDARY_MODEL.to_string() }
fn default_tier_timeout() -> u64 { PipelineConfig::default().tier_timeout.as_secs() }
fn default_session_path() -> PathBuf { PathBuf::from("~/.config/lostfound/session.json") }

impl Settings {
  pub fn load(path: &Path) -> Result<Self> {
    let raw = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("LOSTFOUND"))
      .build()
      .context("failed to read config file")?;

    let mut settings: Settings = raw
      .try_deserialize()
      .context("failed to deserialise settings")?;
    settings.session_path = expand_tilde(&settings.session_path);
    Ok(settings)
  }

  pub fn pipeline_config(&self) -> PipelineConfig { PipelineConfig::from_secs(self.tier_timeout_secs) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Session file ────────────────────────────────────────────────────────────

pub fn load_session(path: &Path) -> Result<Option<Session>> {
  if !path.exists() {
    return Ok(None);
  }
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading session file {}", path.display()))?;
  let session = serde_json::from_str(&raw)
    .with_context(|| format!("parsing session file {}", path.display()))?;
  Ok(Some(session))
}

pub fn save_session(path: &Path, session: &Session) -> Result<()> {
  if let Some(dir) = path.parent()
    && !dir.as_os_str().is_empty()
  {
    std::fs::create_dir_all(dir)
      .with_context(|| format!("creating {}", dir.display()))?;
  }
  let raw = serde_json::to_string_pretty(session)?;
  std::fs::write(path, raw).with_context(|| format!("writing session file {}", path.display()))
}

pub fn remove_session(path: &Path) -> Result<()> {
  match std::fs::remove_file(path) {
    Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
      Err(e).with_context(|| format!("removing session file {}", path.display()))
    }
    _ => Ok(()),
  }
}
