//! Object names for uploaded images.
//!
//! Generated images carry a timestamp, a content digest and a random
//! nonce, so committing the same bytes twice still yields two objects.
//! Photos combine the uploader's id with a millisecond timestamp.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

const DIGEST_CHARS: usize = 12;

/// Name for a generated image: `ai-<millis>-<sha256 prefix>-<nonce>.png`.
pub fn blob_name(bytes: &[u8], now: DateTime<Utc>) -> String {
  let digest = hex::encode(Sha256::digest(bytes));
  format!(
    "ai-{}-{}-{}.png",
    now.timestamp_millis(),
    &digest[..DIGEST_CHARS],
    Uuid::new_v4().simple()
  )
}

/// Name for a user-supplied photo: `[<prefix>-]<owner>-<millis>.<ext>`.
///
/// The extension is taken from `file_name`, lower-cased, defaulting to `jpg`.
pub fn photo_name(prefix: Option<&str>, owner: Uuid, file_name: &str, now: DateTime<Utc>) -> String {
  let ext = file_name
    .rsplit_once('.')
    .map(|(_, ext)| ext.to_ascii_lowercase())
    .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
    .unwrap_or_else(|| "jpg".to_string());
  let millis = now.timestamp_millis();
  match prefix {
    Some(prefix) => format!("{prefix}-{owner}-{millis}.{ext}"),
    None => format!("{owner}-{millis}.{ext}"),
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn at(millis: i64) -> DateTime<Utc> { Utc.timestamp_millis_opt(millis).unwrap() }

  #[test]
  fn blob_names_are_fresh_even_for_identical_bytes() {
    let a = blob_name(b"png-bytes-a", at(1_700_000_000_123));
    let b = blob_name(b"png-bytes-b", at(1_700_000_000_123));
    assert!(a.starts_with("ai-1700000000123-"));
    assert!(a.ends_with(".png"));
    assert_eq!(a.len(), "ai-1700000000123-".len() + DIGEST_CHARS + 1 + 32 + ".png".len());
    assert_ne!(a, b);

    let again = blob_name(b"png-bytes-a", at(1_700_000_000_123));
    assert_eq!(&a[..again.len() - 37], &again[..again.len() - 37]);
    assert_ne!(a, again);
  }

  #[test]
  fn photo_names() {
    let owner = Uuid::nil();
    assert_eq!(
      photo_name(Some("lost"), owner, "IMG_2041.JPG", at(5)),
      format!("lost-{owner}-5.jpg")
    );
    assert_eq!(photo_name(None, owner, "scan.webp", at(7)), format!("{owner}-7.webp"));
    assert_eq!(photo_name(None, owner, "no-extension", at(7)), format!("{owner}-7.jpg"));
    assert_eq!(photo_name(None, owner, "weird.", at(7)), format!("{owner}-7.jpg"));
  }
}
