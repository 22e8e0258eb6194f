//! User accounts as stored in the `users` table.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

// ─── Role ────────────────────────────────────────────────────────────────────

/// Authorization role of an account.
///
/// `PendingAdmin` is granted nothing beyond `User` until an administrator
/// promotes the account.
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
#[serde(rename_all = "snake_case", from = "Option<String>")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
  #[default]
  User,
  PendingAdmin,
  Admin,
  SuperAdmin,
}

impl Role {
  pub fn is_admin(self) -> bool { matches!(self, Self::Admin | Self::SuperAdmin) }
}

/// Missing or unrecognised roles decode as [`Role::User`].
impl From<Option<String>> for Role {
  fn from(raw: Option<String>) -> Self {
    raw
      .and_then(|s| s.trim().parse().ok())
      .unwrap_or_default()
  }
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// The extended profile row keyed by the auth user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
  pub user_id:       Uuid,
  #[serde(default, deserialize_with = "null_as_default")]
  pub full_name:     String,
  pub email:         Option<String>,
  pub user_type:     Option<String>,
  pub college_id:    Option<String>,
  pub contact_no:    Option<String>,
  pub course:        Option<String>,
  pub class_details: Option<String>,
  #[serde(default)]
  pub role:          Role,
  /// Only ever increased by an administrative rewarding action.
  #[serde(default, deserialize_with = "null_as_default")]
  pub reward_points: u32,
}

impl UserProfile {
  /// True when the profile lacks the fields the dashboard asks users to fill.
  pub fn needs_completion(&self) -> bool {
    is_blank(&self.college_id) || is_blank(&self.contact_no)
  }

  pub fn first_name(&self) -> &str {
    self.full_name.split_whitespace().next().unwrap_or("")
  }

  /// Apply a [`ProfileUpdate`] locally, mirroring what the backend stored.
  pub fn apply(&mut self, update: &ProfileUpdate) {
    if let Some(v) = &update.full_name {
      self.full_name = v.clone();
    }
    if let Some(v) = &update.college_id {
      self.college_id = Some(v.clone());
    }
    if let Some(v) = &update.course {
      self.course = Some(v.clone());
    }
    if let Some(v) = &update.class_details {
      self.class_details = Some(v.clone());
    }
    if let Some(v) = &update.contact_no {
      self.contact_no = Some(v.clone());
    }
  }
}

/// A `null` column decodes like a missing one.
fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de> + Default,
{
  Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

fn is_blank(v: &Option<String>) -> bool {
  v.as_deref().is_none_or(|s| s.trim().is_empty())
}

/// Insert record written right after a successful sign-up.
#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
  pub user_id:       Uuid,
  pub full_name:     String,
  pub email:         String,
  pub user_type:     String,
  pub college_id:    String,
  pub contact_no:    String,
  pub course:        String,
  pub class_details: String,
  pub role:          Role,
  pub reward_points: u32,
}

/// Partial profile patch. Unset fields are left untouched by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub full_name:     Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub college_id:    Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub course:        Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub class_details: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub contact_no:    Option<String>,
}

impl ProfileUpdate {
  pub fn is_empty(&self) -> bool { *self == Self::default() }
}

// ─── Leaderboard ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
  #[serde(default)]
  pub user_id:       Option<Uuid>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub full_name:     String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub reward_points: u32,
}

/// Rank marker shown next to a leaderboard entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medal {
  Gold,
  Silver,
  Bronze,
  Rank(usize),
}

impl Medal {
  /// `index` is zero-based.
  pub fn for_index(index: usize) -> Self {
    match index {
      0 => Self::Gold,
      1 => Self::Silver,
      2 => Self::Bronze,
      n => Self::Rank(n + 1),
    }
  }
}

impl fmt::Display for Medal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Gold => f.write_str("🥇"),
      Self::Silver => f.write_str("🥈"),
      Self::Bronze => f.write_str("🥉"),
      Self::Rank(n) => write!(f, "#{n}"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn profile(json: serde_json::Value) -> UserProfile {
    serde_json::from_value(json).unwrap()
  }

  #[test]
  fn role_wire_names() {
    assert_eq!(Role::PendingAdmin.to_string(), "pending_admin");
    assert_eq!(
      serde_json::to_value(Role::SuperAdmin).unwrap(),
      serde_json::json!("super_admin")
    );
    let r: Role = serde_json::from_value(serde_json::json!("admin")).unwrap();
    assert_eq!(r, Role::Admin);
  }

  #[test]
  fn unknown_or_null_role_is_plain_user() {
    let r: Role = serde_json::from_value(serde_json::json!("moderator")).unwrap();
    assert_eq!(r, Role::User);
    let r: Role = serde_json::from_value(serde_json::Value::Null).unwrap();
    assert_eq!(r, Role::User);
  }

  #[test]
  fn pending_admin_is_not_admin() {
    assert!(!Role::PendingAdmin.is_admin());
    assert!(!Role::User.is_admin());
    assert!(Role::Admin.is_admin());
    assert!(Role::SuperAdmin.is_admin());
  }

  #[test]
  fn profile_completion_check() {
    let id = Uuid::new_v4();
    let p = profile(serde_json::json!({
      "user_id": id, "full_name": "Asha Rao", "college_id": "C-12", "contact_no": "  "
    }));
    assert!(p.needs_completion());
    assert_eq!(p.role, Role::User);
    assert_eq!(p.reward_points, 0);
    assert_eq!(p.first_name(), "Asha");

    let p = profile(serde_json::json!({
      "user_id": id, "full_name": "Asha Rao", "college_id": "C-12",
      "contact_no": "555", "role": "pending_admin", "reward_points": 40
    }));
    assert!(!p.needs_completion());
    assert_eq!(p.role, Role::PendingAdmin);
  }

  #[test]
  fn null_points_and_name_decode_as_defaults() {
    let p = profile(serde_json::json!({
      "user_id": Uuid::new_v4(), "full_name": null, "reward_points": null, "role": null
    }));
    assert_eq!(p.reward_points, 0);
    assert_eq!(p.full_name, "");
    assert_eq!(p.role, Role::User);

    let e: LeaderboardEntry =
      serde_json::from_value(serde_json::json!({ "full_name": "Ravi", "reward_points": null }))
        .unwrap();
    assert_eq!(e.reward_points, 0);
  }

  #[test]
  fn update_skips_unset_fields() {
    let update = ProfileUpdate {
      contact_no: Some("555-0100".into()),
      ..Default::default()
    };
    assert_eq!(
      serde_json::to_value(&update).unwrap(),
      serde_json::json!({ "contact_no": "555-0100" })
    );
    assert!(ProfileUpdate::default().is_empty());
  }

  #[test]
  fn medals() {
    assert_eq!(Medal::for_index(0).to_string(), "🥇");
    assert_eq!(Medal::for_index(2), Medal::Bronze);
    assert_eq!(Medal::for_index(4).to_string(), "#5");
  }
}
