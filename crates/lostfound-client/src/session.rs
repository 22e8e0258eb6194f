//! Sign-up, log-in and the per-session identity context.

use lostfound_core::{
  AuthError, Result, Viewer,
  backend::{Backend, Credentials, Query, Session, Table},
  user::{NewProfile, Role, UserProfile},
};
use lostfound_imaging::{ImageGenerator, ImageProbe};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::Client;

// ─── Types ───────────────────────────────────────────────────────────────────

/// Everything the registration form collects.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
  pub email:         String,
  pub password:      String,
  pub full_name:     String,
  pub user_type:     String,
  pub college_id:    String,
  pub contact_no:    String,
  pub course:        String,
  pub class_details: String,
  /// Registers the account as `pending_admin` instead of `user`.
  pub request_admin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignupOutcome {
  pub user_id:         Uuid,
  pub admin_requested: bool,
}

/// Where a freshly logged-in user is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Landing {
  Admin,
  Dashboard,
}

impl Landing {
  pub fn for_role(role: Role) -> Self {
    if role.is_admin() { Self::Admin } else { Self::Dashboard }
  }
}

#[derive(Debug, Clone)]
pub struct LoggedIn {
  pub session: Session,
  pub landing: Landing,
}

/// The authenticated identity every flow runs under.
#[derive(Debug, Clone)]
pub struct SessionContext {
  pub session: Session,
  pub profile: UserProfile,
  pub viewer:  Viewer,
}

impl SessionContext {
  pub fn new(session: Session, profile: UserProfile) -> Self {
    let viewer = Viewer::from(&profile);
    Self { session, profile, viewer }
  }

  pub fn user_id(&self) -> Uuid { self.viewer.user_id }

  /// True when the dashboard should prompt for missing profile fields.
  pub fn needs_completion(&self) -> bool { self.profile.needs_completion() }
}

fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

// ─── Flows ───────────────────────────────────────────────────────────────────

impl<B, G, P> Client<B, G, P>
where
  B: Backend,
  G: ImageGenerator,
  P: ImageProbe,
{
  /// Create the auth account, then its profile row.
  pub async fn sign_up(&self, form: &SignupForm) -> Result<SignupOutcome> {
    let email = normalize_email(&form.email);
    let credentials = Credentials { email: email.clone(), password: form.password.clone() };
    let session = self.backend.sign_up(&credentials).await?;

    let role = if form.request_admin { Role::PendingAdmin } else { Role::User };
    let profile = NewProfile {
      user_id: session.user_id,
      full_name: form.full_name.trim().to_string(),
      email,
      user_type: form.user_type.clone(),
      college_id: form.college_id.trim().to_string(),
      contact_no: form.contact_no.trim().to_string(),
      course: form.course.trim().to_string(),
      class_details: form.class_details.trim().to_string(),
      role,
      reward_points: 0,
    };
    self
      .backend
      .insert(Table::Users, serde_json::to_value(&profile)?)
      .await?;

    info!(user_id = %session.user_id, %role, "account created");
    Ok(SignupOutcome { user_id: session.user_id, admin_requested: form.request_admin })
  }

  /// Log in with email and password.
  ///
  /// Emails with no profile fail with [`AuthError::NotRegistered`] before
  /// the auth service is contacted.
  pub async fn log_in(&self, credentials: &Credentials) -> Result<LoggedIn> {
    let email = normalize_email(&credentials.email);
    let registered = Query::table(Table::Users)
      .select(&["user_id"])
      .eq("email", email.as_str())
      .limit(1);
    if self.backend.query(&registered).await?.is_empty() {
      return Err(AuthError::NotRegistered(email).into());
    }

    let credentials = Credentials { email, password: credentials.password.clone() };
    let session = self.backend.sign_in(&credentials).await?;
    let profile = self.load_profile(session.user_id).await?;
    let landing = Landing::for_role(profile.role);

    info!(user_id = %session.user_id, ?landing, "logged in");
    Ok(LoggedIn { session, landing })
  }

  /// Resolve a stored session into the context every other flow needs.
  pub async fn bootstrap(&self, session: Session) -> Result<SessionContext> {
    let profile = self.load_profile(session.user_id).await?;
    Ok(SessionContext::new(session, profile))
  }

  pub async fn log_out(&self, session: &Session) -> Result<()> {
    self.backend.sign_out(session).await?;
    info!(user_id = %session.user_id, "logged out");
    Ok(())
  }
}
