//! URL-only tiers. Both builders are pure: the URL is constructed locally and
//! the remote service renders on first load.

use rand_core::{OsRng, RngCore};

/// Seeds are drawn from `0..SEED_RANGE`.
pub const SEED_RANGE: u32 = 100_000;

pub fn random_seed() -> u32 { OsRng.next_u32() % SEED_RANGE }

/// A render-on-GET image service addressed by prompt and seed.
#[derive(Debug, Clone)]
pub struct DirectRender {
  pub base_url: String,
  pub width:    u32,
  pub height:   u32,
}

impl Default for DirectRender {
  fn default() -> Self {
    Self {
      base_url: "https://image.pollinations.ai/prompt".to_string(),
      width:    600,
      height:   400,
    }
  }
}

impl DirectRender {
  pub fn build_url(&self, prompt: &str, seed: u32) -> String {
    format!(
      "{}/{}?seed={seed}&width={}&height={}&nologo=true",
      self.base_url.trim_end_matches('/'),
      urlencoding::encode(prompt),
      self.width,
      self.height,
    )
  }
}

/// Text placeholder service. The last tier; it cannot fail.
#[derive(Debug, Clone)]
pub struct Placeholder {
  pub base_url: String,
}

impl Default for Placeholder {
  fn default() -> Self { Self { base_url: "https://placehold.co".to_string() } }
}

impl Placeholder {
  pub fn build_url(&self, title: &str) -> String {
    format!(
      "{}/600x400/1e293b/ffffff?text=Image+Unavailable:%5Cn{}",
      self.base_url.trim_end_matches('/'),
      urlencoding::encode(title),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn direct_render_url() {
    let url = DirectRender::default().build_url("Product photo of a pen & cap", 4242);
    assert_eq!(
      url,
      "https://image.pollinations.ai/prompt/Product%20photo%20of%20a%20pen%20%26%20cap\
       ?seed=4242&width=600&height=400&nologo=true"
    );
  }

  #[test]
  fn placeholder_url_embeds_encoded_title() {
    let url = Placeholder::default().build_url("ID card / lanyard");
    assert_eq!(
      url,
      "https://placehold.co/600x400/1e293b/ffffff?text=Image+Unavailable:%5CnID%20card%20%2F%20lanyard"
    );
  }

  #[test]
  fn seeds_stay_in_range() {
    for _ in 0..64 {
      assert!(random_seed() < SEED_RANGE);
    }
  }
}
