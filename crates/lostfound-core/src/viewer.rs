//! The explicit identity context threaded through policy checks and flows.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{item::Item, user::{Role, UserProfile}};

/// An authenticated actor looking at items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
  pub user_id: Uuid,
  pub role:    Role,
}

impl Viewer {
  pub fn new(user_id: Uuid, role: Role) -> Self { Self { user_id, role } }

  pub fn is_reporter_of(&self, item: &Item) -> bool { self.user_id == item.reporter_id }
}

impl From<&UserProfile> for Viewer {
  fn from(profile: &UserProfile) -> Self { Self::new(profile.user_id, profile.role) }
}
