//! The reporter's own items: listing, resolving and deleting.

use lostfound_core::{
  Error, Result,
  backend::{Backend, Direction, Query, Table},
  item::{Item, ItemKind, ItemStatus},
  visibility::{Surface, can_manage},
};
use lostfound_imaging::{ImageGenerator, ImageProbe};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{Client, FeedCard, SessionContext, feed::decode_items};

/// Buttons offered next to one of the viewer's own reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportActions {
  /// Label of the delete action, when the item may be deleted.
  pub delete:  Option<&'static str>,
  /// Label of the resolve action, when the item may be marked returned.
  pub resolve: Option<&'static str>,
}

impl ReportActions {
  pub fn for_item(kind: ItemKind, status: ItemStatus) -> Self {
    match (status, kind) {
      (ItemStatus::Claimed, _) => Self { delete: None, resolve: None },
      (ItemStatus::Pending, ItemKind::Lost) => {
        Self { delete: Some("I found it / Remove"), resolve: None }
      }
      (ItemStatus::Pending, ItemKind::Found) => {
        Self { delete: Some("Delete"), resolve: Some("Item Returned") }
      }
    }
  }

  /// Shown in place of the buttons when there are none.
  pub fn status_label(&self) -> Option<&'static str> {
    (self.delete.is_none() && self.resolve.is_none()).then_some("Resolved")
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
  pub card:    FeedCard,
  pub actions: ReportActions,
}

impl<B, G, P> Client<B, G, P>
where
  B: Backend,
  G: ImageGenerator,
  P: ImageProbe,
{
  /// All of the viewer's reports, pending and resolved, newest first.
  pub async fn my_reports(&self, ctx: &SessionContext) -> Result<Vec<ReportEntry>> {
    let query = Query::table(Table::Items)
      .eq("user_id", ctx.user_id().to_string())
      .order("created_at", Direction::Descending);
    let rows = self.backend.query(&query).await?;

    Ok(
      decode_items(rows)
        .iter()
        .map(|item| ReportEntry {
          card:    FeedCard::new(item, &ctx.viewer, Surface::Card),
          actions: ReportActions::for_item(item.kind(), item.status),
        })
        .collect(),
    )
  }

  /// Move a PENDING item to CLAIMED. The transition is one-way.
  pub async fn mark_resolved(&self, ctx: &SessionContext, item_id: Uuid) -> Result<()> {
    let item = self.managed_item(ctx, item_id).await?;
    if !item.status.can_transition_to(ItemStatus::Claimed) {
      return Err(Error::AlreadyClaimed(item_id));
    }

    self
      .backend
      .update(Table::Items, item_id, json!({ "status": ItemStatus::Claimed }))
      .await?;
    info!(%item_id, by = %ctx.user_id(), "item resolved");
    Ok(())
  }

  /// Remove a PENDING item. Resolved items stay on record.
  pub async fn delete_item(&self, ctx: &SessionContext, item_id: Uuid) -> Result<()> {
    let item = self.managed_item(ctx, item_id).await?;
    if item.status.is_terminal() {
      return Err(Error::AlreadyClaimed(item_id));
    }

    self.backend.delete(Table::Items, item_id).await?;
    info!(%item_id, by = %ctx.user_id(), "item deleted");
    Ok(())
  }

  async fn managed_item(&self, ctx: &SessionContext, item_id: Uuid) -> Result<Item> {
    let item = self.load_item(item_id).await?;
    if !can_manage(&ctx.viewer, &item) {
      return Err(Error::Forbidden);
    }
    Ok(item)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn actions_per_kind_and_status() {
    let lost = ReportActions::for_item(ItemKind::Lost, ItemStatus::Pending);
    assert_eq!(lost.delete, Some("I found it / Remove"));
    assert_eq!(lost.resolve, None);
    assert_eq!(lost.status_label(), None);

    let found = ReportActions::for_item(ItemKind::Found, ItemStatus::Pending);
    assert_eq!(found.delete, Some("Delete"));
    assert_eq!(found.resolve, Some("Item Returned"));

    for kind in [ItemKind::Lost, ItemKind::Found] {
      let done = ReportActions::for_item(kind, ItemStatus::Claimed);
      assert_eq!(done.status_label(), Some("Resolved"));
    }
  }
}
