//! Destinations for delivered segments.

use std::io::Write;

use async_trait::async_trait;
use hls::Segment;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};
use url::Url;

use crate::{LiveError, ResourceFetcher};

/// Receives segments in delivery order.
#[async_trait]
pub trait SegmentSink: Send {
    /// Handles one segment; `url` is its location resolved against the manifest URL.
    async fn deliver(&mut self, segment: &Segment, url: &Url) -> Result<(), LiveError>;

    /// Called once after the last segment of an ended stream.
    async fn finish(&mut self) -> Result<(), LiveError> {
        Ok(())
    }
}

/// Writes each segment URL on its own line.
#[derive(Debug)]
pub struct UrlPrinter<W> {
    out: W,
}

impl<W: Write + Send> UrlPrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait]
impl<W: Write + Send> SegmentSink for UrlPrinter<W> {
    async fn deliver(&mut self, _segment: &Segment, url: &Url) -> Result<(), LiveError> {
        writeln!(self.out, "{url}").map_err(LiveError::from_sink_io)?;
        self.out.flush().map_err(LiveError::from_sink_io)
    }
}

/// Downloads each segment and streams its bytes into a player's input.
pub struct PlayerFeed<F, W> {
    fetcher: F,
    input: W,
    bytes_written: u64,
}

impl<F, W> PlayerFeed<F, W>
where
    F: ResourceFetcher,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(fetcher: F, input: W) -> Self {
        Self {
            fetcher,
            input,
            bytes_written: 0,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn into_inner(self) -> W {
        self.input
    }
}

#[async_trait]
impl<F, W> SegmentSink for PlayerFeed<F, W>
where
    F: ResourceFetcher,
    W: AsyncWrite + Unpin + Send,
{
    async fn deliver(&mut self, segment: &Segment, url: &Url) -> Result<(), LiveError> {
        let body = self.fetcher.fetch_bytes(url).await?;
        self.input
            .write_all(&body)
            .await
            .map_err(LiveError::from_sink_io)?;
        self.input.flush().await.map_err(LiveError::from_sink_io)?;
        self.bytes_written += body.len() as u64;
        trace!(
            uri = %segment.uri,
            len = body.len(),
            total = self.bytes_written,
            "Fed segment to player"
        );
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), LiveError> {
        debug!(total = self.bytes_written, "Closing player input");
        self.input
            .shutdown()
            .await
            .map_err(LiveError::from_sink_io)
    }
}
