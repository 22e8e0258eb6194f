//! Composing the message a viewer sends to an item's reporter.

use serde::Serialize;

use crate::{Error, Result, item::Item, viewer::Viewer};

/// A ready-to-send email to the reporter of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactDraft {
  pub to:      String,
  pub subject: String,
  pub body:    String,
}

impl ContactDraft {
  /// Render as a `mailto:` link with an encoded subject and body.
  pub fn mailto(&self) -> String {
    format!(
      "mailto:{}?subject={}&body={}",
      self.to,
      urlencoding::encode(&self.subject),
      urlencoding::encode(&self.body),
    )
  }
}

/// Build the contact email for `item`.
///
/// `reporter_email` comes from the reporter's profile. A reporter without an
/// email is an error the user must see, and reporters cannot contact
/// themselves.
pub fn compose_contact(
  viewer: &Viewer,
  viewer_name: &str,
  item: &Item,
  reporter_email: Option<&str>,
) -> Result<ContactDraft> {
  if viewer.is_reporter_of(item) {
    return Err(Error::SelfContact);
  }

  let to = reporter_email
    .map(str::trim)
    .filter(|e| !e.is_empty())
    .ok_or(Error::MissingContact(item.item_id))?;

  let title = item.title();
  Ok(ContactDraft {
    to:      to.to_string(),
    subject: format!("Regarding: {title} (Connect & Found)"),
    body:    format!(
      "Hello,\n\nI am contacting you regarding the item \"{title}\" posted on \
       Connect & Found.\n\nPlease let me know if we can meet.\n\nThanks, \n{viewer_name}"
    ),
  })
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;
  use crate::{
    item::{ItemImages, ItemStatus, ReportDetails},
    user::Role,
  };

  fn item(owner: Uuid) -> Item {
    Item {
      item_id: Uuid::new_v4(),
      reporter_id: owner,
      details: ReportDetails { title: "Black & white scarf".into(), ..Default::default() },
      status: ItemStatus::Pending,
      images: ItemImages::Found { real_image: None },
      created_at: None,
    }
  }

  #[test]
  fn composes_mail_to_reporter() {
    let item = item(Uuid::new_v4());
    let viewer = Viewer::new(Uuid::new_v4(), Role::User);
    let draft = compose_contact(&viewer, "Ravi Kumar", &item, Some("finder@campus.edu")).unwrap();

    assert_eq!(draft.to, "finder@campus.edu");
    assert_eq!(draft.subject, "Regarding: Black & white scarf (Connect & Found)");
    assert!(draft.body.ends_with("Thanks, \nRavi Kumar"));

    let link = draft.mailto();
    assert!(link.starts_with("mailto:finder@campus.edu?subject=Regarding%3A%20Black%20%26%20white"));
    assert!(!link.contains('\n'));
  }

  #[test]
  fn missing_email_is_reported() {
    let item = item(Uuid::new_v4());
    let viewer = Viewer::new(Uuid::new_v4(), Role::Admin);
    for email in [None, Some(""), Some("   ")] {
      let err = compose_contact(&viewer, "A", &item, email).unwrap_err();
      assert!(matches!(err, Error::MissingContact(id) if id == item.item_id));
    }
  }

  #[test]
  fn reporter_cannot_contact_self() {
    let owner = Uuid::new_v4();
    let item = item(owner);
    let err = compose_contact(&Viewer::new(owner, Role::User), "A", &item, Some("a@b.c"))
      .unwrap_err();
    assert!(matches!(err, Error::SelfContact));
  }
}
