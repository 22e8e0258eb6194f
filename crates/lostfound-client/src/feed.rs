//! The public feed, the detail view and contacting a reporter.

use chrono::{DateTime, Utc};
use lostfound_core::{
  Result, Viewer,
  backend::{Backend, Direction, Query, Row, Table},
  contact::{ContactDraft, compose_contact},
  item::{Item, ItemKind, ItemStatus, ReportDetails},
  visibility::{Presentation, Surface, present},
};
use lostfound_imaging::{ImageGenerator, ImageProbe};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{Client, SessionContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedFilter {
  #[default]
  All,
  Kind(ItemKind),
}

/// An item as one viewer is allowed to see it.
///
/// Carries the policy's image decision instead of the stored image fields,
/// so a renderer holding a card cannot reach a redacted photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedCard {
  pub item_id:      Uuid,
  pub reporter_id:  Uuid,
  pub kind:         ItemKind,
  pub status:       ItemStatus,
  pub details:      ReportDetails,
  pub created_at:   Option<DateTime<Utc>>,
  pub presentation: Presentation,
}

impl FeedCard {
  pub(crate) fn new(item: &Item, viewer: &Viewer, surface: Surface) -> Self {
    Self {
      item_id:      item.item_id,
      reporter_id:  item.reporter_id,
      kind:         item.kind(),
      status:       item.status,
      details:      item.details.clone(),
      created_at:   item.created_at,
      presentation: present(item, viewer, surface),
    }
  }
}

/// The detail view of one item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemDetails {
  pub card:          FeedCard,
  pub reporter_name: Option<String>,
  pub claim_label:   &'static str,
  #[serde(skip)]
  item:              Item,
  #[serde(skip)]
  reporter_email:    Option<String>,
}

/// Decode rows, dropping any that violate the item invariants.
pub(crate) fn decode_items(rows: Vec<Row>) -> Vec<Item> {
  rows
    .into_iter()
    .filter_map(|row| match Item::from_row(row) {
      Ok(item) => Some(item),
      Err(e) => {
        warn!(error = %e, "skipping undecodable item row");
        None
      }
    })
    .collect()
}

impl<B, G, P> Client<B, G, P>
where
  B: Backend,
  G: ImageGenerator,
  P: ImageProbe,
{
  /// PENDING items, newest first.
  pub async fn feed(&self, ctx: &SessionContext, filter: FeedFilter) -> Result<Vec<FeedCard>> {
    let mut query = Query::table(Table::Items).eq("status", ItemStatus::Pending.as_ref());
    if let FeedFilter::Kind(kind) = filter {
      query = query.eq("item_type", kind.as_ref());
    }
    let query = query.order("created_at", Direction::Descending);

    let rows = self.backend.query(&query).await?;
    debug!(rows = rows.len(), ?filter, "feed loaded");
    Ok(
      decode_items(rows)
        .iter()
        .map(|item| FeedCard::new(item, &ctx.viewer, Surface::Card))
        .collect(),
    )
  }

  pub async fn item_details(&self, ctx: &SessionContext, item_id: Uuid) -> Result<ItemDetails> {
    let item = self.load_item(item_id).await?;

    let reporter = Query::table(Table::Users)
      .select(&["full_name", "email"])
      .eq("user_id", item.reporter_id.to_string())
      .limit(1);
    let reporter = self.backend.query(&reporter).await?.into_iter().next();
    let field = |name: &str| {
      reporter
        .as_ref()
        .and_then(|row| row.get(name))
        .and_then(|v| v.as_str())
        .map(str::to_string)
    };

    let card = FeedCard::new(&item, &ctx.viewer, Surface::Detail);
    Ok(ItemDetails {
      claim_label: card.presentation.badge.claim_label(),
      reporter_name: field("full_name"),
      reporter_email: field("email"),
      card,
      item,
    })
  }

  /// Compose the email the viewer sends to the item's reporter.
  pub fn contact_owner(&self, ctx: &SessionContext, details: &ItemDetails) -> Result<ContactDraft> {
    compose_contact(
      &ctx.viewer,
      &ctx.profile.full_name,
      &details.item,
      details.reporter_email.as_deref(),
    )
  }
}
