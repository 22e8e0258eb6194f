//! Filing LOST and FOUND reports.

use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use lostfound_core::{
  Error, Result,
  backend::{Backend, Bucket, Table},
  item::{NewItem, ReportDetails},
};
use lostfound_imaging::{
  AcquireRequest, Acquisition, CancelHandle, Canceller, ImageGenerator, ImageProbe, photo_name,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{Client, SessionContext};

/// Lifetime of the signed URL stored for an owner's photo of a lost item.
const LOST_PHOTO_TTL: Duration = Duration::from_secs(60 * 60);

const MIN_TITLE_CHARS: usize = 3;

// ─── Draft ───────────────────────────────────────────────────────────────────

/// State of the LOST report form between preview and submission.
///
/// Holds at most one image reference and the cancel handle its previews run
/// under. Take a [`Canceller`] before starting a preview to stop it from
/// elsewhere while the draft is borrowed.
#[derive(Debug, Default)]
pub struct ReportDraft {
  image:  Option<Acquisition>,
  cancel: CancelHandle,
}

impl ReportDraft {
  pub fn new() -> Self { Self::default() }

  pub fn image(&self) -> Option<&Acquisition> { self.image.as_ref() }

  /// Trigger for previews started from now until the next [`abandon`].
  ///
  /// [`abandon`]: Self::abandon
  pub fn canceller(&self) -> Canceller { self.cancel.canceller() }

  /// Cancel outstanding acquisitions and forget the current image.
  pub fn abandon(&mut self) {
    self.cancel.cancel();
    self.cancel = CancelHandle::new();
    self.image = None;
  }
}

// ─── Forms ───────────────────────────────────────────────────────────────────

/// A photo picked by the user.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
  pub file_name: String,
  pub bytes:     Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct LostReport {
  pub details: ReportDetails,
  /// The owner's own photo. Only the owner and admins ever see it.
  pub photo:   Option<PhotoUpload>,
}

#[derive(Debug, Clone, Default)]
pub struct FoundReport {
  pub details: ReportDetails,
  pub photo:   Option<PhotoUpload>,
}

fn require_title(title: &str) -> Result<()> {
  if title.trim().chars().count() < MIN_TITLE_CHARS {
    return Err(Error::Validation("Please enter a valid Item Name.".into()));
  }
  Ok(())
}

// ─── Flows ───────────────────────────────────────────────────────────────────

impl<B, G, P> Client<B, G, P>
where
  B: Backend,
  G: ImageGenerator,
  P: ImageProbe,
{
  /// Run the acquisition pipeline and store its reference in `draft`,
  /// replacing any earlier preview.
  ///
  /// Only a cancelled draft yields an error besides validation; in that case
  /// the draft is left untouched.
  pub async fn generate_preview(
    &self,
    draft: &mut ReportDraft,
    title: &str,
    description: &str,
  ) -> Result<Acquisition> {
    require_title(title)?;
    let request = AcquireRequest::new(title, description);

    let token = draft.cancel.token();
    let acquisition = self
      .pipeline
      .acquire(&request, &token)
      .await
      .map_err(|_| Error::Cancelled)?;

    info!(url = %acquisition.url, source = ?acquisition.source, "preview ready");
    draft.image = Some(acquisition.clone());
    Ok(acquisition)
  }

  /// File a LOST report using the draft's generated image.
  ///
  /// The draft is cleared only once the record is written; on any failure it
  /// keeps its image so the user can retry, and an already uploaded photo is
  /// removed again.
  pub async fn report_lost(
    &self,
    ctx: &SessionContext,
    draft: &mut ReportDraft,
    report: LostReport,
  ) -> Result<Uuid> {
    let LostReport { details, photo } = report;
    require_title(&details.title)?;
    let ai_image = draft
      .image()
      .map(|a| a.url.clone())
      .ok_or(Error::NoDraftImage)?;

    let photo_blob = match photo {
      Some(photo) => {
        let name = photo_name(Some("lost"), ctx.user_id(), &photo.file_name, Utc::now());
        self
          .backend
          .upload_blob(Bucket::AiImages, &name, photo.bytes)
          .await?;
        Some(name)
      }
      None => None,
    };

    let filed = async {
      let real_image = match &photo_blob {
        Some(name) => Some(
          self
            .backend
            .signed_url(Bucket::AiImages, name, LOST_PHOTO_TTL)
            .await?,
        ),
        None => None,
      };
      let record = NewItem::lost(ctx.user_id(), details, ai_image, real_image);
      self.insert_item(&record).await
    }
    .await;
    let item_id = self
      .settle(Bucket::AiImages, photo_blob.as_deref(), filed)
      .await?;

    draft.image = None;
    info!(%item_id, "lost report filed");
    Ok(item_id)
  }

  pub async fn report_found(&self, ctx: &SessionContext, report: FoundReport) -> Result<Uuid> {
    let FoundReport { details, photo } = report;
    require_title(&details.title)?;

    let photo_blob = match photo {
      Some(photo) => {
        let name = photo_name(None, ctx.user_id(), &photo.file_name, Utc::now());
        self
          .backend
          .upload_blob(Bucket::FoundImages, &name, photo.bytes)
          .await?;
        Some(name)
      }
      None => None,
    };

    let real_image = photo_blob
      .as_deref()
      .map(|name| self.backend.public_url(Bucket::FoundImages, name));
    let record = NewItem::found(ctx.user_id(), details, real_image);
    let filed = self.insert_item(&record).await;
    let item_id = self
      .settle(Bucket::FoundImages, photo_blob.as_deref(), filed)
      .await?;

    info!(%item_id, "found report filed");
    Ok(item_id)
  }

  async fn insert_item(&self, record: &NewItem) -> Result<Uuid> {
    let row = serde_json::to_value(record)?;
    Ok(self.backend.insert(Table::Items, row).await?)
  }

  /// Pass `filed` through, removing the report's photo from `bucket` when
  /// the record was not written.
  async fn settle(&self, bucket: Bucket, photo_blob: Option<&str>, filed: Result<Uuid>) -> Result<Uuid> {
    if filed.is_err()
      && let Some(name) = photo_blob
    {
      match self.backend.remove_blob(bucket, name).await {
        Ok(()) => debug!(%bucket, name, "removed photo of unfiled report"),
        Err(e) => warn!(%bucket, name, error = %e, "photo of unfiled report left in storage"),
      }
    }
    filed
  }
}
