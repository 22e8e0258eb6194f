//! Application flows for the Connect & Found client.
//!
//! A [`Client`] binds a [`Backend`] to an image [`AcquisitionPipeline`] and
//! exposes one async method per user-facing flow. Every flow that shows an
//! item routes it through [`lostfound_core::visibility::present`] with the
//! caller's [`SessionContext`]; nothing reads identity from ambient state.

mod feed;
mod manage;
mod profile;
mod report;
mod session;

use std::sync::Arc;

use lostfound_core::{
  Error, Result,
  backend::{Backend, Query, Table},
  item::Item,
  user::UserProfile,
};
use lostfound_imaging::{AcquisitionPipeline, ImageGenerator, ImageProbe};
use uuid::Uuid;

pub use feed::{FeedCard, FeedFilter, ItemDetails};
pub use manage::{ReportActions, ReportEntry};
pub use profile::{LeaderboardRow, ProfileSummary};
pub use report::{FoundReport, LostReport, PhotoUpload, ReportDraft};
pub use session::{Landing, LoggedIn, SessionContext, SignupForm, SignupOutcome};

/// Entry point for every flow.
pub struct Client<B, G, P> {
  backend:  Arc<B>,
  pipeline: AcquisitionPipeline<G, B, P>,
}

impl<B, G, P> Client<B, G, P>
where
  B: Backend,
  G: ImageGenerator,
  P: ImageProbe,
{
  /// `pipeline` should commit to the same backend it is given here.
  pub fn new(backend: Arc<B>, pipeline: AcquisitionPipeline<G, B, P>) -> Self {
    Self { backend, pipeline }
  }

  pub fn backend(&self) -> &B { &self.backend }

  // ─── Shared lookups ──────────────────────────────────────────────────────

  async fn load_profile(&self, user_id: Uuid) -> Result<UserProfile> {
    let query = Query::table(Table::Users)
      .eq("user_id", user_id.to_string())
      .limit(1);
    let row = self
      .backend
      .query(&query)
      .await?
      .into_iter()
      .next()
      .ok_or(Error::ProfileMissing(user_id))?;
    Ok(serde_json::from_value(row)?)
  }

  async fn load_item(&self, item_id: Uuid) -> Result<Item> {
    let query = Query::table(Table::Items)
      .eq("item_id", item_id.to_string())
      .limit(1);
    let row = self
      .backend
      .query(&query)
      .await?
      .into_iter()
      .next()
      .ok_or(Error::ItemNotFound(item_id))?;
    Item::from_row(row)
  }
}
