// HLS (HTTP Live Streaming) manifest model and parsing
mod error;
pub mod manifest;
pub mod segment;
pub mod variant;

// Export common types for ease of use
pub use error::ManifestError;
pub use manifest::{ManifestParser, ManifestSnapshot, ParseMode};
pub use segment::Segment;
pub use variant::{Resolution, VariantPlaylist, VariantStream, parse_variant_playlist};
