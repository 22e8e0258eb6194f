//! Plain-text rendering of flow results.

use lostfound_client::{FeedCard, ItemDetails, LeaderboardRow, ProfileSummary, ReportEntry};
use lostfound_core::item::ReportDetails;

fn when(details: &ReportDetails) -> String {
  match (details.date_incident, details.time_incident) {
    (Some(d), Some(t)) => format!("{d} {}", t.format("%H:%M")),
    (Some(d), None) => d.to_string(),
    (None, Some(t)) => t.format("%H:%M").to_string(),
    (None, None) => "-".to_string(),
  }
}

pub fn card(card: &FeedCard) {
  let image = &card.presentation.image;
  let hidden = if image.redacted { " (photo hidden)" } else { "" };
  println!("[{}] {}  {}", card.presentation.badge.label(), card.details.title, card.item_id);
  println!("    where: {}  when: {}", card.details.location, when(&card.details));
  println!("    image: {}{hidden}", image.url);
}

pub fn feed(cards: &[FeedCard]) {
  if cards.is_empty() {
    println!("No items found.");
    return;
  }
  for c in cards {
    card(c);
  }
}

pub fn details(view: &ItemDetails) {
  card(&view.card);
  if !view.card.details.description.is_empty() {
    println!("    {}", view.card.details.description);
  }
  println!(
    "    reported by: {}",
    view.reporter_name.as_deref().unwrap_or("unknown")
  );
  if view.card.presentation.contact_allowed {
    println!("    action: {}  (lostfound contact {})", view.claim_label, view.card.item_id);
  }
}

pub fn reports(entries: &[ReportEntry]) {
  if entries.is_empty() {
    println!("You have not reported anything yet.");
    return;
  }
  for entry in entries {
    card(&entry.card);
    let mut actions = Vec::new();
    if let Some(label) = entry.actions.resolve {
      actions.push(format!("{label}: lostfound resolve {}", entry.card.item_id));
    }
    if let Some(label) = entry.actions.delete {
      actions.push(format!("{label}: lostfound delete {}", entry.card.item_id));
    }
    match entry.actions.status_label() {
      Some(status) => println!("    {status}"),
      None => println!("    {}", actions.join("  |  ")),
    }
  }
}

pub fn leaderboard(rows: &[LeaderboardRow]) {
  for row in rows {
    let me = if row.is_me { "  <- you" } else { "" };
    println!("{:>4}  {:<28} {:>5} pts{me}", row.medal.to_string(), row.entry.full_name, row.entry.reward_points);
  }
}

pub fn profile(summary: &ProfileSummary) {
  let p = &summary.profile;
  let field = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
  println!("{}  ({})", p.full_name, p.role);
  println!("  email:       {}", field(&p.email));
  println!("  college id:  {}", field(&p.college_id));
  println!("  course:      {}", field(&p.course));
  println!("  class:       {}", field(&p.class_details));
  println!("  contact:     {}", field(&p.contact_no));
  println!("  reports:     {} lost, {} found", summary.lost_count, summary.found_count);
  println!("  points:      {}", summary.reward_points);
  if p.needs_completion() {
    println!("  Complete your profile with `lostfound profile-update`.");
  }
}
