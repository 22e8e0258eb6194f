//! Load checks for directly rendered URLs.

use std::future::Future;

use reqwest::{Client, header::CONTENT_TYPE};

use crate::error::LoadError;

/// Decides whether an image URL actually loads.
pub trait ImageProbe: Send + Sync {
  fn probe<'a>(&'a self, url: &'a str) -> impl Future<Output = Result<(), LoadError>> + Send + 'a;
}

/// Fetches the URL and requires a successful `image/*` response.
///
/// The body is not read; the request is dropped once headers arrive.
#[derive(Clone)]
pub struct HttpProbe {
  client: Client,
}

impl HttpProbe {
  pub fn new(client: Client) -> Self { Self { client } }
}

impl ImageProbe for HttpProbe {
  async fn probe(&self, url: &str) -> Result<(), LoadError> {
    let resp = self.client.get(url).send().await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(LoadError::Status(status.as_u16()));
    }

    let content_type = resp
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .unwrap_or_default();
    if !content_type.starts_with("image/") {
      return Err(LoadError::NotAnImage(content_type.to_string()));
    }
    Ok(())
  }
}
