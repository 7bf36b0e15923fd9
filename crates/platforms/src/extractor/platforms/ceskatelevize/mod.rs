mod builder;
mod channels;
mod models;

pub use builder::{CeskaTelevize, PlaylistKind, URL_REGEX};
pub use channels::{Channel, ChannelDirectory};
