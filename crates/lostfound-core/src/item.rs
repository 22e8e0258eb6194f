//! Lost and found reports.
//!
//! An [`Item`] is the decoded, invariant-checked form of an `items` row. The
//! image fields are modelled per kind so that a LOST item always carries its
//! generated image and a FOUND item carries only the finder's photo.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Classification ──────────────────────────────────────────────────────────

/// Whether the reporter lost the object or found it. Fixed at creation.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum ItemKind {
  Lost,
  Found,
}

/// Lifecycle of a report. `Claimed` is terminal.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ItemStatus {
  #[default]
  Pending,
  Claimed,
}

impl ItemStatus {
  pub fn is_terminal(self) -> bool { matches!(self, Self::Claimed) }

  pub fn can_transition_to(self, next: ItemStatus) -> bool {
    matches!((self, next), (Self::Pending, Self::Claimed))
  }
}

// ─── Images ──────────────────────────────────────────────────────────────────

/// Image references attached to a report, shaped by its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "UPPERCASE")]
pub enum ItemImages {
  Lost {
    /// Generated illustration; never sensitive.
    ai_image:   String,
    /// Optional genuine photo uploaded by the owner; sensitive.
    real_image: Option<String>,
  },
  Found {
    /// Photo of the found object; sensitive.
    real_image: Option<String>,
  },
}

impl ItemImages {
  pub fn kind(&self) -> ItemKind {
    match self {
      Self::Lost { .. } => ItemKind::Lost,
      Self::Found { .. } => ItemKind::Found,
    }
  }

  pub fn real_image(&self) -> Option<&str> {
    match self {
      Self::Lost { real_image, .. } | Self::Found { real_image } => real_image.as_deref(),
    }
  }
}

// ─── Item ────────────────────────────────────────────────────────────────────

/// Free-form descriptive fields. None of these are access controlled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDetails {
  pub title:         String,
  pub description:   String,
  pub location:      String,
  pub date_incident: Option<NaiveDate>,
  pub time_incident: Option<NaiveTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
  pub item_id:     Uuid,
  pub reporter_id: Uuid,
  pub details:     ReportDetails,
  pub status:      ItemStatus,
  pub images:      ItemImages,
  pub created_at:  Option<DateTime<Utc>>,
}

impl Item {
  pub fn kind(&self) -> ItemKind { self.images.kind() }

  pub fn title(&self) -> &str { &self.details.title }
}

// ─── Row encoding ────────────────────────────────────────────────────────────

/// The flat `items` row as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRow {
  pub item_id:        Uuid,
  pub user_id:        Uuid,
  #[serde(default)]
  pub title:          String,
  pub description:    Option<String>,
  pub location:       Option<String>,
  pub date_incident:  Option<NaiveDate>,
  pub time_incident:  Option<NaiveTime>,
  pub item_type:      ItemKind,
  #[serde(default)]
  pub status:         ItemStatus,
  pub ai_image_url:   Option<String>,
  pub real_image_url: Option<String>,
  pub image_url:      Option<String>,
  pub created_at:     Option<DateTime<Utc>>,
}

impl TryFrom<ItemRow> for Item {
  type Error = Error;

  fn try_from(row: ItemRow) -> Result<Self> {
    let images = match row.item_type {
      ItemKind::Lost => ItemImages::Lost {
        ai_image:   present(row.ai_image_url).ok_or_else(|| {
          Error::MalformedRow(format!("lost item {} has no ai_image_url", row.item_id))
        })?,
        real_image: present(row.real_image_url),
      },
      ItemKind::Found => ItemImages::Found {
        real_image: present(row.image_url),
      },
    };

    Ok(Item {
      item_id: row.item_id,
      reporter_id: row.user_id,
      details: ReportDetails {
        title:         row.title,
        description:   row.description.unwrap_or_default(),
        location:      row.location.unwrap_or_default(),
        date_incident: row.date_incident,
        time_incident: row.time_incident,
      },
      status: row.status,
      images,
      created_at: row.created_at,
    })
  }
}

impl Item {
  /// Decode a raw backend row.
  pub fn from_row(row: serde_json::Value) -> Result<Self> {
    let row: ItemRow = serde_json::from_value(row)?;
    row.try_into()
  }
}

fn present(v: Option<String>) -> Option<String> {
  v.filter(|s| !s.trim().is_empty())
}

// ─── NewItem ─────────────────────────────────────────────────────────────────

/// Insert record for a new report. Status always starts as PENDING; the
/// backend assigns `item_id` and `created_at`.
#[derive(Debug, Clone, Serialize)]
pub struct NewItem {
  pub user_id:        Uuid,
  pub title:          String,
  pub description:    String,
  pub location:       String,
  pub date_incident:  Option<NaiveDate>,
  pub time_incident:  Option<NaiveTime>,
  pub item_type:      ItemKind,
  pub status:         ItemStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub ai_image_url:   Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub real_image_url: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub image_url:      Option<String>,
}

impl NewItem {
  pub fn lost(
    reporter: Uuid,
    details: ReportDetails,
    ai_image: String,
    real_image: Option<String>,
  ) -> Self {
    Self::with_details(reporter, details, ItemKind::Lost, Some(ai_image), real_image, None)
  }

  pub fn found(reporter: Uuid, details: ReportDetails, real_image: Option<String>) -> Self {
    Self::with_details(reporter, details, ItemKind::Found, None, None, real_image)
  }

  fn with_details(
    reporter: Uuid,
    details: ReportDetails,
    item_type: ItemKind,
    ai_image_url: Option<String>,
    real_image_url: Option<String>,
    image_url: Option<String>,
  ) -> Self {
    Self {
      user_id: reporter,
      title: details.title,
      description: details.description,
      location: details.location,
      date_incident: details.date_incident,
      time_incident: details.time_incident,
      item_type,
      status: ItemStatus::Pending,
      ai_image_url,
      real_image_url,
      image_url,
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn decodes_lost_row() {
    let id = Uuid::new_v4();
    let owner = Uuid::new_v4();
    let item = Item::from_row(json!({
      "item_id": id,
      "user_id": owner,
      "title": "Blue umbrella",
      "description": "Folding, wooden handle",
      "location": "Library",
      "date_incident": "2026-03-02",
      "time_incident": "14:05:00",
      "item_type": "LOST",
      "status": "PENDING",
      "ai_image_url": "https://cdn.test/ai.png",
      "real_image_url": "",
      "image_url": null,
      "created_at": "2026-03-02T14:10:00Z"
    }))
    .unwrap();

    assert_eq!(item.kind(), ItemKind::Lost);
    assert_eq!(item.reporter_id, owner);
    assert_eq!(
      item.images,
      ItemImages::Lost { ai_image: "https://cdn.test/ai.png".into(), real_image: None }
    );
    assert_eq!(item.details.date_incident, NaiveDate::from_ymd_opt(2026, 3, 2));
  }

  #[test]
  fn lost_row_without_ai_image_is_malformed() {
    let err = Item::from_row(json!({
      "item_id": Uuid::new_v4(),
      "user_id": Uuid::new_v4(),
      "title": "Keys",
      "item_type": "LOST",
      "status": "PENDING",
      "ai_image_url": null
    }))
    .unwrap_err();
    assert!(matches!(err, Error::MalformedRow(_)));
  }

  #[test]
  fn found_row_uses_image_url() {
    let item = Item::from_row(json!({
      "item_id": Uuid::new_v4(),
      "user_id": Uuid::new_v4(),
      "title": "Wallet",
      "item_type": "FOUND",
      "status": "CLAIMED",
      "ai_image_url": "https://cdn.test/ignored.png",
      "image_url": "https://cdn.test/wallet.jpg"
    }))
    .unwrap();
    assert_eq!(item.kind(), ItemKind::Found);
    assert_eq!(item.status, ItemStatus::Claimed);
    assert_eq!(item.images.real_image(), Some("https://cdn.test/wallet.jpg"));
  }

  #[test]
  fn claimed_is_terminal() {
    assert!(ItemStatus::Pending.can_transition_to(ItemStatus::Claimed));
    assert!(!ItemStatus::Claimed.can_transition_to(ItemStatus::Pending));
    assert!(!ItemStatus::Claimed.can_transition_to(ItemStatus::Claimed));
    assert!(ItemStatus::Claimed.is_terminal());
  }

  #[test]
  fn new_found_item_record_shape() {
    let owner = Uuid::new_v4();
    let details = ReportDetails { title: "Calculator".into(), ..Default::default() };
    let record = serde_json::to_value(NewItem::found(owner, details, None)).unwrap();
    assert_eq!(record["item_type"], "FOUND");
    assert_eq!(record["status"], "PENDING");
    assert!(record.get("ai_image_url").is_none());
    assert!(record.get("image_url").is_none());
  }

  #[test]
  fn kind_parses_case_insensitively() {
    assert_eq!("found".parse::<ItemKind>().unwrap(), ItemKind::Found);
    assert_eq!(ItemKind::Lost.to_string(), "LOST");
  }
}
