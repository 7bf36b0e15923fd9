//! Follows revolving HLS live manifests and delivers each new segment exactly once.
//!
//! [`LiveStream`] holds the reconciliation state, [`PlaylistFollower`] drives
//! the refresh loop over the [`ResourceFetcher`], [`Sleeper`] and
//! [`SegmentSink`] seams.

pub mod boundary;
pub mod config;
mod error;
pub mod fetcher;
pub mod follower;
pub mod sink;
pub mod sleeper;
pub mod stream;

pub use boundary::BoundaryKind;
pub use config::{FollowerConfig, HttpConfig, create_client};
pub use error::LiveError;
pub use fetcher::{HttpFetcher, ResourceFetcher};
pub use follower::{FollowSummary, PlaylistFollower};
pub use sink::{PlayerFeed, SegmentSink, UrlPrinter};
pub use sleeper::{Sleeper, TokioSleeper};
pub use stream::LiveStream;

pub use hls::ParseMode;
pub use tokio_util::sync::CancellationToken;
