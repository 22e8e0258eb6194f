//! `lostfound`: command-line client for the Connect & Found campus
//! lost-and-found service.
//!
//! # Usage
//!
//! ```
//! lostfound --config lostfound.toml login --email asha@campus.edu
//! lostfound feed --kind found
//! lostfound report-lost --title "Red bottle" --description "steel, dented lid" --location Library
//! ```
//!
//! Settings come from the TOML file named by `--config` (default
//! `lostfound.toml`, optional) and `LOSTFOUND_*` environment variables.

mod output;
mod settings;

use std::{
  io::{self, BufRead, Write},
  path::PathBuf,
  sync::Arc,
  time::Duration,
};

use anyhow::{Context as _, Result, bail};
use bytes::Bytes;
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use lostfound_backend::{SupabaseBackend, SupabaseConfig};
use lostfound_client::{
  Client, FeedFilter, FoundReport, Landing, LostReport, PhotoUpload, ReportDraft, SessionContext,
  SignupForm,
};
use lostfound_core::{
  AuthError, Error,
  backend::{Credentials, Session},
  item::{ItemKind, ReportDetails},
  user::ProfileUpdate,
};
use lostfound_imaging::{AcquisitionPipeline, HfGenerator, HttpProbe, ImageSource};
use settings::Settings;
use tracing::{debug, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

type App = Client<SupabaseBackend, HfGenerator, HttpProbe>;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "lostfound", version, about = "Connect & Found campus lost-and-found client")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "lostfound.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create an account.
  Signup(SignupArgs),
  /// Log in and remember the session.
  Login {
    #[arg(long)]
    email:    String,
    /// Read from stdin when omitted.
    #[arg(long, env = "LOSTFOUND_PASSWORD", hide_env_values = true)]
    password: Option<String>,
  },
  /// End the session and forget it.
  Logout,
  /// Open reports, newest first.
  Feed {
    /// `lost` or `found`.
    #[arg(long)]
    kind: Option<ItemKind>,
  },
  /// Details of one report.
  Show { id: Uuid },
  /// Print a mailto link to the reporter of an item.
  Contact { id: Uuid },
  /// Report something you lost. An illustration is generated first.
  ReportLost {
    #[command(flatten)]
    details: DetailArgs,
    /// Submit the first generated image without asking.
    #[arg(long)]
    yes:     bool,
  },
  /// Report something you found.
  ReportFound {
    #[command(flatten)]
    details: DetailArgs,
  },
  /// Your own reports.
  Mine,
  /// Mark one of your found items as returned.
  Resolve { id: Uuid },
  /// Remove one of your open reports.
  Delete { id: Uuid },
  /// Reward points leaderboard.
  Rewards,
  /// Your profile and report counts.
  Profile,
  /// Change profile fields.
  ProfileUpdate(ProfileArgs),
}

#[derive(Args)]
struct SignupArgs {
  #[arg(long)]
  email:         String,
  #[arg(long)]
  name:          String,
  /// e.g. student or staff.
  #[arg(long, default_value = "student")]
  user_type:     String,
  #[arg(long, default_value = "")]
  college_id:    String,
  #[arg(long, default_value = "")]
  contact:       String,
  #[arg(long, default_value = "")]
  course:        String,
  #[arg(long, default_value = "")]
  class_details: String,
  /// Ask for administrator access. Granted by an existing admin.
  #[arg(long)]
  request_admin: bool,
}

#[derive(Args)]
struct DetailArgs {
  #[arg(long)]
  title:       String,
  #[arg(long, default_value = "")]
  description: String,
  #[arg(long, default_value = "")]
  location:    String,
  /// YYYY-MM-DD
  #[arg(long)]
  date:        Option<NaiveDate>,
  /// HH:MM
  #[arg(long)]
  time:        Option<NaiveTime>,
  /// A photo of the item. Only you and administrators will see it.
  #[arg(long, value_name = "FILE")]
  photo:       Option<PathBuf>,
}

impl DetailArgs {
  fn details(&self) -> ReportDetails {
    ReportDetails {
      title:         self.title.trim().to_string(),
      description:   self.description.trim().to_string(),
      location:      self.location.trim().to_string(),
      date_incident: self.date,
      time_incident: self.time,
    }
  }

  fn photo(&self) -> Result<Option<PhotoUpload>> {
    let Some(path) = &self.photo else {
      return Ok(None);
    };
    let bytes = std::fs::read(path).with_context(|| format!("reading photo {}", path.display()))?;
    let file_name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    Ok(Some(PhotoUpload { file_name, bytes: Bytes::from(bytes) }))
  }
}

#[derive(Args)]
struct ProfileArgs {
  #[arg(long)]
  name:          Option<String>,
  #[arg(long)]
  college_id:    Option<String>,
  #[arg(long)]
  course:        Option<String>,
  #[arg(long)]
  class_details: Option<String>,
  #[arg(long)]
  contact:       Option<String>,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;
  let session = settings::load_session(&settings.session_path)?;
  let client = build_client(&settings, session.clone())?;

  match cli.command {
    Command::Signup(args) => signup(&client, args).await,
    Command::Login { email, password } => login(&client, &settings, email, password).await,
    Command::Logout => {
      if let Some(session) = &session
        && let Err(e) = client.log_out(session).await
      {
        warn!(error = %e, "server-side logout failed");
      }
      settings::remove_session(&settings.session_path)?;
      println!("Logged out.");
      Ok(())
    }
    command => {
      let Some(session) = session else {
        bail!("not logged in; run `lostfound login --email <EMAIL>` first");
      };
      let ctx = client
        .bootstrap(session)
        .await
        .context("failed to load your profile")?;
      run(&client, ctx, command).await
    }
  }
}

fn build_client(settings: &Settings, session: Option<Session>) -> Result<App> {
  let mut backend = SupabaseBackend::new(SupabaseConfig {
    url:      settings.supabase_url.clone(),
    anon_key: settings.supabase_key.clone(),
  })
  .context("failed to build backend client")?;
  if let Some(session) = session {
    backend = backend.with_session(session);
  }
  let backend = Arc::new(backend);

  let http = reqwest::Client::builder()
    .timeout(Duration::from_secs(60))
    .build()
    .context("failed to build HTTP client")?;

  let generators = if settings.hf_token.is_empty() {
    debug!("no hf_token configured, image generation starts at the direct render");
    Vec::new()
  } else {
    [&settings.primary_model, &settings.secondary_model]
      .into_iter()
      .map(|model| HfGenerator::new(http.clone(), &settings.hf_endpoint, model, &settings.hf_token))
      .collect()
  };

  let pipeline = AcquisitionPipeline::new(generators, backend.clone(), HttpProbe::new(http))
    .with_config(settings.pipeline_config());
  Ok(Client::new(backend, pipeline))
}

// ─── Commands ────────────────────────────────────────────────────────────────

async fn signup(client: &App, args: SignupArgs) -> Result<()> {
  let password = prompt_line("Password: ")?;
  let form = SignupForm {
    email: args.email,
    password,
    full_name: args.name,
    user_type: args.user_type,
    college_id: args.college_id,
    contact_no: args.contact,
    course: args.course,
    class_details: args.class_details,
    request_admin: args.request_admin,
  };
  let outcome = client.sign_up(&form).await.context("sign-up failed")?;

  println!("Account created. Log in with `lostfound login --email {}`.", form.email.trim());
  if outcome.admin_requested {
    println!("Administrator access is pending approval.");
  }
  Ok(())
}

async fn login(
  client: &App,
  settings: &Settings,
  email: String,
  password: Option<String>,
) -> Result<()> {
  let password = match password {
    Some(p) => p,
    None => prompt_line("Password: ")?,
  };
  let credentials = Credentials { email, password };

  let logged_in = match client.log_in(&credentials).await {
    Ok(l) => l,
    Err(Error::Auth(AuthError::NotRegistered(email))) => {
      bail!("{email} is not registered. Please sign up first with `lostfound signup`.")
    }
    Err(Error::Auth(AuthError::IncorrectPassword)) => bail!("Incorrect password."),
    Err(e) => return Err(e).context("login failed"),
  };

  settings::save_session(&settings.session_path, &logged_in.session)?;
  match logged_in.landing {
    Landing::Admin => println!("Logged in as administrator."),
    Landing::Dashboard => println!("Logged in as {}.", logged_in.session.email),
  }
  Ok(())
}

async fn run(client: &App, mut ctx: SessionContext, command: Command) -> Result<()> {
  match command {
    Command::Feed { kind } => {
      let filter = kind.map_or(FeedFilter::All, FeedFilter::Kind);
      let cards = client.feed(&ctx, filter).await.context("failed to load items")?;
      output::feed(&cards);
    }
    Command::Show { id } => {
      let view = client.item_details(&ctx, id).await?;
      output::details(&view);
    }
    Command::Contact { id } => {
      let view = client.item_details(&ctx, id).await?;
      let mail = client.contact_owner(&ctx, &view)?;
      println!("To:      {}", mail.to);
      println!("Subject: {}", mail.subject);
      println!("{}", mail.mailto());
    }
    Command::ReportLost { details, yes } => report_lost(client, &ctx, details, yes).await?,
    Command::ReportFound { details } => {
      let report = FoundReport { details: details.details(), photo: details.photo()? };
      let id = client
        .report_found(&ctx, report)
        .await
        .context("failed to submit report")?;
      println!("Found item reported ({id}). Thank you!");
    }
    Command::Mine => {
      let entries = client.my_reports(&ctx).await?;
      output::reports(&entries);
    }
    Command::Resolve { id } => {
      client.mark_resolved(&ctx, id).await?;
      println!("Marked as returned.");
    }
    Command::Delete { id } => {
      client.delete_item(&ctx, id).await?;
      println!("Report removed.");
    }
    Command::Rewards => {
      let rows = client.leaderboard(&ctx).await?;
      output::leaderboard(&rows);
    }
    Command::Profile => {
      let summary = client.profile_summary(&ctx).await?;
      output::profile(&summary);
    }
    Command::ProfileUpdate(args) => {
      let update = ProfileUpdate {
        full_name:     args.name,
        college_id:    args.college_id,
        course:        args.course,
        class_details: args.class_details,
        contact_no:    args.contact,
      };
      client.update_profile(&mut ctx, &update).await?;
      println!("Profile updated.");
    }
    Command::Signup(_) | Command::Login { .. } | Command::Logout => {
      bail!("this command runs without a session")
    }
  }
  Ok(())
}

/// Generate a preview, let the user accept or regenerate it, then submit.
///
/// Ctrl-C while an image is being produced fires the draft's canceller; the
/// pipeline stops at its next checkpoint and the report is abandoned.
async fn report_lost(client: &App, ctx: &SessionContext, args: DetailArgs, yes: bool) -> Result<()> {
  let photo = args.photo()?;
  let mut draft = ReportDraft::new();

  loop {
    println!("Generating an illustration for \"{}\"...", args.title.trim());
    let preview = {
      let canceller = draft.canceller();
      let running = client.generate_preview(&mut draft, &args.title, &args.description);
      tokio::pin!(running);
      tokio::select! {
        preview = &mut running => preview,
        _ = tokio::signal::ctrl_c() => {
          canceller.cancel();
          running.await
        }
      }
    };
    let preview = match preview {
      Err(Error::Cancelled) => {
        println!("Report discarded.");
        return Ok(());
      }
      other => other?,
    };
    let origin = match &preview.source {
      ImageSource::Generated { model } => format!("generated by {model}"),
      ImageSource::DirectRender => "rendered on demand".to_string(),
      ImageSource::Placeholder => "placeholder".to_string(),
    };
    println!("Preview ({origin}): {}", preview.url);

    if yes {
      break;
    }
    match prompt_line("Submit with this image? [y]es / [r]egenerate / [n]o: ")?
      .to_ascii_lowercase()
      .as_str()
    {
      "y" | "yes" => break,
      "r" | "regenerate" => continue,
      _ => {
        draft.abandon();
        println!("Report discarded.");
        return Ok(());
      }
    }
  }

  let report = LostReport { details: args.details(), photo };
  let id = client
    .report_lost(ctx, &mut draft, report)
    .await
    .context("failed to submit report")?;
  println!("Lost item reported ({id}).");
  Ok(())
}

/// Read one line from stdin after printing `prompt`.
fn prompt_line(prompt: &str) -> Result<String> {
  print!("{prompt}");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}
