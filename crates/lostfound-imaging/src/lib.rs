//! Image acquisition for lost-item reports.
//!
//! [`AcquisitionPipeline`] turns a short description into exactly one
//! displayable image reference. It tries the configured generators in order,
//! commits the first generated image to blob storage, and degrades to a
//! directly rendered URL and finally to a text placeholder. Failures along
//! the way are logged and never returned.

mod cancel;
mod generator;
mod naming;
mod pipeline;
mod probe;
mod render;
mod request;

pub mod error;

pub use cancel::{CancelHandle, CancelToken, Canceller};
pub use error::{Cancelled, GenerationError, LoadError};
pub use generator::{HfGenerator, ImageGenerator};
pub use naming::{blob_name, photo_name};
pub use pipeline::{Acquisition, AcquisitionPipeline, ImageSource, PipelineConfig};
pub use probe::{HttpProbe, ImageProbe};
pub use render::{DirectRender, Placeholder, random_seed};
pub use request::AcquireRequest;
