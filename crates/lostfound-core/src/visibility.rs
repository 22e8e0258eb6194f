//! Visibility policy: which image and contact affordance a viewer gets for an
//! item.
//!
//! Real photographs are sensitive. A finder's photo would let a false
//! claimant describe the object back to the finder, so only the reporter and
//! administrators ever see it; everyone else gets a redacted placeholder. The
//! generated illustration of a LOST item shows no real object and is shown to
//! everyone. Every render path goes through [`present`].

use serde::Serialize;

use crate::{
  item::{Item, ItemImages, ItemKind},
  viewer::Viewer,
};

/// Where the image will be rendered. Placeholders are sized per surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
  Card,
  Detail,
}

impl Surface {
  /// Redacted stand-in for a FOUND item's photo.
  pub fn redacted_placeholder(self) -> &'static str {
    match self {
      Self::Card => "https://placehold.co/400x300/10b981/white?text=Secure+Item",
      Self::Detail => {
        "https://placehold.co/600x400/10b981/white?text=Secure+Item+(Photo+Hidden)"
      }
    }
  }

  /// Shown to privileged viewers when the finder uploaded no photo.
  pub fn missing_photo_placeholder(self) -> &'static str {
    match self {
      Self::Card => "https://placehold.co/400x300?text=No+Photo",
      Self::Detail => "https://placehold.co/600x400?text=No+Photo",
    }
  }
}

/// The badge drawn over an item's image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge(pub ItemKind);

impl Badge {
  pub fn label(self) -> &'static str {
    match self.0 {
      ItemKind::Lost => "LOST",
      ItemKind::Found => "FOUND",
    }
  }

  /// Label of the claim/contact action on the detail view.
  pub fn claim_label(self) -> &'static str {
    match self.0 {
      ItemKind::Lost => "I Found This! (Contact Owner)",
      ItemKind::Found => "This is Mine! (Claim Item)",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayImage {
  pub url:      String,
  /// Set when `url` is the redacted placeholder; renderers blur it.
  pub redacted: bool,
}

impl DisplayImage {
  fn plain(url: impl Into<String>) -> Self { Self { url: url.into(), redacted: false } }
}

/// Result of running an item through the policy for one viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Presentation {
  pub image:           DisplayImage,
  pub badge:           Badge,
  pub contact_allowed: bool,
}

/// Whether `viewer` may see the item's real photograph.
pub fn can_view_sensitive(viewer: &Viewer, item: &Item) -> bool {
  viewer.role.is_admin() || viewer.is_reporter_of(item)
}

/// Whether `viewer` may resolve or delete the report. The same actors that
/// may see its real photo.
pub fn can_manage(viewer: &Viewer, item: &Item) -> bool { can_view_sensitive(viewer, item) }

/// Decide what `viewer` sees for `item` on `surface`.
pub fn present(item: &Item, viewer: &Viewer, surface: Surface) -> Presentation {
  let privileged = can_view_sensitive(viewer, item);

  let image = match (&item.images, privileged) {
    (ItemImages::Lost { ai_image, real_image }, true) => {
      DisplayImage::plain(real_image.as_deref().unwrap_or(ai_image))
    }
    (ItemImages::Lost { ai_image, .. }, false) => DisplayImage::plain(ai_image.as_str()),
    (ItemImages::Found { real_image }, true) => DisplayImage::plain(
      real_image
        .as_deref()
        .unwrap_or_else(|| surface.missing_photo_placeholder()),
    ),
    (ItemImages::Found { .. }, false) => DisplayImage {
      url:      surface.redacted_placeholder().to_string(),
      redacted: true,
    },
  };

  Presentation {
    image,
    badge: Badge(item.kind()),
    contact_allowed: !viewer.is_reporter_of(item),
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;
  use crate::{
    item::{ItemStatus, ReportDetails},
    user::Role,
  };

  const AI: &str = "https://cdn.test/ai-1.png";
  const REAL: &str = "https://cdn.test/real-1.jpg";

  const ROLES: [Role; 4] = [Role::User, Role::PendingAdmin, Role::Admin, Role::SuperAdmin];

  fn item(owner: Uuid, images: ItemImages) -> Item {
    Item {
      item_id: Uuid::new_v4(),
      reporter_id: owner,
      details: ReportDetails { title: "Laptop bag".into(), ..Default::default() },
      status: ItemStatus::Pending,
      images,
      created_at: None,
    }
  }

  fn lost(owner: Uuid, real: Option<&str>) -> Item {
    item(owner, ItemImages::Lost { ai_image: AI.into(), real_image: real.map(Into::into) })
  }

  fn found(owner: Uuid, real: Option<&str>) -> Item {
    item(owner, ItemImages::Found { real_image: real.map(Into::into) })
  }

  #[test]
  fn found_photo_hidden_from_non_privileged() {
    let owner = Uuid::new_v4();
    for role in [Role::User, Role::PendingAdmin] {
      let viewer = Viewer::new(Uuid::new_v4(), role);
      for surface in [Surface::Card, Surface::Detail] {
        for real in [Some(REAL), None] {
          let p = present(&found(owner, real), &viewer, surface);
          assert_eq!(p.image.url, surface.redacted_placeholder());
          assert!(p.image.redacted);
          assert_eq!(p.badge.label(), "FOUND");
          assert!(p.contact_allowed);
        }
      }
    }
  }

  #[test]
  fn found_photo_visible_to_reporter_and_admins() {
    let owner = Uuid::new_v4();
    let item = found(owner, Some(REAL));

    let reporter = Viewer::new(owner, Role::User);
    let p = present(&item, &reporter, Surface::Card);
    assert_eq!(p.image, DisplayImage { url: REAL.into(), redacted: false });
    assert!(!p.contact_allowed);

    for role in [Role::Admin, Role::SuperAdmin] {
      let p = present(&item, &Viewer::new(Uuid::new_v4(), role), Surface::Detail);
      assert_eq!(p.image.url, REAL);
      assert!(p.contact_allowed);
    }
  }

  #[test]
  fn found_without_photo_shows_missing_placeholder_to_reporter() {
    let owner = Uuid::new_v4();
    let p = present(&found(owner, None), &Viewer::new(owner, Role::User), Surface::Detail);
    assert_eq!(p.image.url, Surface::Detail.missing_photo_placeholder());
    assert!(!p.image.redacted);
  }

  #[test]
  fn lost_items_always_show_an_image() {
    let owner = Uuid::new_v4();
    for real in [Some(REAL), None] {
      for role in ROLES {
        for viewer in [Viewer::new(owner, role), Viewer::new(Uuid::new_v4(), role)] {
          let item = lost(owner, real);
          let p = present(&item, &viewer, Surface::Card);
          assert!(!p.image.url.is_empty());
          assert!(!p.image.redacted);
          assert_eq!(p.badge.label(), "LOST");
          if can_view_sensitive(&viewer, &item) {
            assert_eq!(p.image.url, real.unwrap_or(AI));
          } else {
            assert_eq!(p.image.url, AI);
          }
        }
      }
    }
  }

  #[test]
  fn lost_real_photo_hidden_from_other_users() {
    let item = lost(Uuid::new_v4(), Some(REAL));
    let p = present(&item, &Viewer::new(Uuid::new_v4(), Role::PendingAdmin), Surface::Card);
    assert_eq!(p.image.url, AI);
  }

  #[test]
  fn every_combination_lands_on_one_table_row() {
    let owner = Uuid::new_v4();
    for role in ROLES {
      for is_owner in [true, false] {
        let viewer = Viewer::new(if is_owner { owner } else { Uuid::new_v4() }, role);
        for item in [lost(owner, Some(REAL)), lost(owner, None), found(owner, Some(REAL)), found(owner, None)] {
          let p = present(&item, &viewer, Surface::Card);
          let privileged = is_owner || role.is_admin();
          let expected = match (item.kind(), privileged) {
            (ItemKind::Lost, true) => item.images.real_image().unwrap_or(AI).to_string(),
            (ItemKind::Lost, false) => AI.to_string(),
            (ItemKind::Found, true) => item
              .images
              .real_image()
              .unwrap_or(Surface::Card.missing_photo_placeholder())
              .to_string(),
            (ItemKind::Found, false) => Surface::Card.redacted_placeholder().to_string(),
          };
          assert_eq!(p.image.url, expected);
          assert_eq!(p.badge, Badge(item.kind()));
          assert_eq!(p.contact_allowed, !is_owner);
        }
      }
    }
  }

  #[test]
  fn presentation_is_deterministic() {
    let owner = Uuid::new_v4();
    let item = found(owner, Some(REAL));
    let viewer = Viewer::new(Uuid::new_v4(), Role::User);
    assert_eq!(
      present(&item, &viewer, Surface::Card),
      present(&item, &viewer, Surface::Card)
    );
  }

  #[test]
  fn claim_labels() {
    assert_eq!(Badge(ItemKind::Lost).claim_label(), "I Found This! (Contact Owner)");
    assert_eq!(Badge(ItemKind::Found).claim_label(), "This is Mine! (Claim Item)");
  }
}
