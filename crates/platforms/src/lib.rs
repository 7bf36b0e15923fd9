//! Resolution of Czech Television live channels and archive items to
//! playable HLS media manifests.
//!
//! ```no_run
//! use ct_platforms::{CeskaTelevize, QualitySelector};
//!
//! # async fn run() -> Result<(), ct_platforms::ExtractorError> {
//! let ct = CeskaTelevize::new(reqwest::Client::new())?;
//! let manifest = ct.resolve_channel("24", QualitySelector::MAX).await?;
//! println!("{manifest}");
//! # Ok(())
//! # }
//! ```

pub mod extractor;

pub use extractor::error::ExtractorError;
pub use extractor::platforms::ceskatelevize::{
    CeskaTelevize, Channel, ChannelDirectory, PlaylistKind,
};
pub use extractor::quality::{QualitySelector, select_quality};
