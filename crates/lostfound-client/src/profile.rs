//! Rewards leaderboard and the viewer's own profile.

use lostfound_core::{
  Error, Result,
  backend::{Backend, Direction, Query, Table},
  item::ItemKind,
  user::{LeaderboardEntry, Medal, ProfileUpdate, UserProfile},
};
use lostfound_imaging::{ImageGenerator, ImageProbe};
use serde::Deserialize;
use tracing::info;

use crate::{Client, SessionContext};

const LEADERBOARD_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
  pub medal: Medal,
  pub entry: LeaderboardEntry,
  /// The row belongs to the viewer.
  pub is_me: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSummary {
  pub profile:       UserProfile,
  pub lost_count:    usize,
  pub found_count:   usize,
  pub reward_points: u32,
}

#[derive(Deserialize)]
struct KindOnly {
  item_type: ItemKind,
}

impl<B, G, P> Client<B, G, P>
where
  B: Backend,
  G: ImageGenerator,
  P: ImageProbe,
{
  /// Top users by reward points.
  pub async fn leaderboard(&self, ctx: &SessionContext) -> Result<Vec<LeaderboardRow>> {
    let query = Query::table(Table::Users)
      .select(&["user_id", "full_name", "reward_points"])
      .order("reward_points", Direction::Descending)
      .limit(LEADERBOARD_SIZE);

    self
      .backend
      .query(&query)
      .await?
      .into_iter()
      .enumerate()
      .map(|(i, row)| -> Result<LeaderboardRow> {
        let entry: LeaderboardEntry = serde_json::from_value(row)?;
        Ok(LeaderboardRow {
          medal: Medal::for_index(i),
          is_me: entry.user_id == Some(ctx.user_id()),
          entry,
        })
      })
      .collect()
  }

  pub async fn profile_summary(&self, ctx: &SessionContext) -> Result<ProfileSummary> {
    let profile = self.load_profile(ctx.user_id()).await?;

    let query = Query::table(Table::Items)
      .select(&["item_type"])
      .eq("user_id", ctx.user_id().to_string());
    let mut lost_count = 0;
    let mut found_count = 0;
    for row in self.backend.query(&query).await? {
      match serde_json::from_value::<KindOnly>(row)?.item_type {
        ItemKind::Lost => lost_count += 1,
        ItemKind::Found => found_count += 1,
      }
    }

    Ok(ProfileSummary {
      reward_points: profile.reward_points,
      profile,
      lost_count,
      found_count,
    })
  }

  /// Patch the viewer's profile and return the merged result.
  pub async fn update_profile(
    &self,
    ctx: &mut SessionContext,
    update: &ProfileUpdate,
  ) -> Result<UserProfile> {
    if update.is_empty() {
      return Err(Error::Validation("nothing to update".into()));
    }

    self
      .backend
      .update(Table::Users, ctx.user_id(), serde_json::to_value(update)?)
      .await?;
    ctx.profile.apply(update);

    info!(user_id = %ctx.user_id(), "profile updated");
    Ok(ctx.profile.clone())
  }
}
