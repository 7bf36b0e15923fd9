//! Polling driver: refreshes a live manifest until the broadcast ends.
//!
//! The follower runs on a single task. Every step is awaited in turn: fetch
//! the manifest, merge it into the [`LiveStream`], hand the ready segments to
//! the sink, sleep for about one segment, repeat. The sleep and every fetch are
//! raced against the cancellation token, so an interrupt ends the loop without
//! waiting for the next refresh.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use hls::{ManifestParser, ManifestSnapshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};
use url::Url;

use crate::config::DEFAULT_FALLBACK_INTERVAL;
use crate::{FollowerConfig, LiveError, LiveStream, ResourceFetcher, SegmentSink, Sleeper};

/// Outcome of one [`PlaylistFollower::follow`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowSummary {
    pub segments_delivered: u64,
    /// Manifest fetches performed, including the first one.
    pub polls: u64,
    /// The run was stopped by cancellation before the stream ended.
    pub interrupted: bool,
}

pub struct PlaylistFollower<F, S> {
    fetcher: F,
    sleeper: S,
    config: FollowerConfig,
    token: CancellationToken,
}

impl<F, S> PlaylistFollower<F, S>
where
    F: ResourceFetcher,
    S: Sleeper,
{
    pub fn new(fetcher: F, sleeper: S, config: FollowerConfig, token: CancellationToken) -> Self {
        Self {
            fetcher,
            sleeper,
            config,
            token,
        }
    }

    /// Follows the media manifest at `manifest_url`, delivering every new
    /// segment to `sink` until the manifest signals the end of the stream.
    pub async fn follow<K>(&self, manifest_url: &Url, sink: &mut K) -> Result<FollowSummary, LiveError>
    where
        K: SegmentSink + ?Sized,
    {
        let parser = ManifestParser::new(self.config.parse_mode);
        let mut stream = LiveStream::with_history_capacity(self.config.history_capacity);
        let mut summary = FollowSummary::default();

        info!(url = %manifest_url, "Following live manifest");
        let Some(mut last_body) = self.fetch_manifest(manifest_url, &mut summary).await? else {
            return Ok(summary);
        };
        let snapshot = parser.parse_bytes(&last_body, Some(manifest_url))?;
        let mut target_duration = snapshot.target_duration;
        stream.update(&snapshot)?;

        while !stream.is_ended() {
            if !self.drain(&mut stream, manifest_url, sink, &mut summary).await? {
                return Ok(summary);
            }

            let interval = self.poll_interval(&stream, target_duration);
            trace!(?interval, "Waiting for manifest refresh");
            let slept = self.until_cancelled(self.sleeper.sleep(interval)).await;
            if slept.is_none() {
                info!("Cancellation requested while waiting for manifest refresh");
                summary.interrupted = true;
                return Ok(summary);
            }

            let Some(body) = self.fetch_manifest(manifest_url, &mut summary).await? else {
                return Ok(summary);
            };
            if body == last_body {
                trace!("Manifest unchanged since last refresh");
                continue;
            }

            let snapshot = parser.parse_bytes(&body, Some(manifest_url))?;
            target_duration = snapshot.target_duration;
            let added = stream.update(&snapshot)?;
            debug!(added, pending = stream.pending_len(), "Merged manifest refresh");
            last_body = body;
        }

        if !self.drain(&mut stream, manifest_url, sink, &mut summary).await? {
            return Ok(summary);
        }
        sink.finish().await?;
        info!(
            segments = summary.segments_delivered,
            polls = summary.polls,
            "Live stream ended"
        );
        Ok(summary)
    }

    /// Parses one manifest without following it.
    pub async fn snapshot(&self, manifest_url: &Url) -> Result<ManifestSnapshot, LiveError> {
        let body = self.fetcher.fetch_bytes(manifest_url).await?;
        Ok(ManifestParser::new(self.config.parse_mode).parse_bytes(&body, Some(manifest_url))?)
    }

    /// Seconds until the next refresh: the last delivered segment's length,
    /// else the manifest's target duration, else the configured fallback.
    fn poll_interval(&self, stream: &LiveStream, target_duration: f64) -> Duration {
        stream
            .last_delivered()
            .map(|s| s.duration)
            .into_iter()
            .chain(std::iter::once(target_duration))
            .find(|secs| secs.is_finite() && *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or_else(|| self.fallback_interval())
    }

    fn fallback_interval(&self) -> Duration {
        if self.config.fallback_interval.is_zero() {
            DEFAULT_FALLBACK_INTERVAL
        } else {
            self.config.fallback_interval
        }
    }

    /// Returns `None` when cancelled.
    async fn fetch_manifest(
        &self,
        manifest_url: &Url,
        summary: &mut FollowSummary,
    ) -> Result<Option<Bytes>, LiveError> {
        match self
            .until_cancelled(self.fetcher.fetch_bytes(manifest_url))
            .await
        {
            Some(body) => {
                summary.polls += 1;
                body.map(Some)
            }
            None => {
                info!("Cancellation requested while fetching manifest");
                summary.interrupted = true;
                Ok(None)
            }
        }
    }

    /// Hands every ready segment to the sink; returns `false` when cancelled.
    async fn drain<K>(
        &self,
        stream: &mut LiveStream,
        manifest_url: &Url,
        sink: &mut K,
        summary: &mut FollowSummary,
    ) -> Result<bool, LiveError>
    where
        K: SegmentSink + ?Sized,
    {
        while let Some(segment) = stream.pop() {
            let url = segment.absolute_url(manifest_url)?;
            debug!(sequence = ?segment.sequence, url = %url, "Delivering segment");
            match self.until_cancelled(sink.deliver(&segment, &url)).await {
                Some(delivered) => delivered?,
                None => {
                    info!("Cancellation requested while delivering segment");
                    summary.interrupted = true;
                    return Ok(false);
                }
            }
            summary.segments_delivered += 1;
        }
        Ok(true)
    }

    async fn until_cancelled<T>(&self, fut: impl Future<Output = T>) -> Option<T> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            out = fut => Some(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use hls::{ParseMode, Segment};

    use crate::UrlPrinter;

    const FIRST: &str = "#EXTM3U
#EXT-X-TARGETDURATION:8
#EXT-X-MEDIA-SEQUENCE:58877187
#EXTINF:8.0,
1502/58877187.ts
#EXTINF:8.0,
1502/58877188.ts
#EXTINF:8.0,
1502/58877189.ts
";

    const SECOND: &str = "#EXTM3U
#EXT-X-TARGETDURATION:8
#EXT-X-MEDIA-SEQUENCE:58877188
#EXTINF:8.0,
1502/58877188.ts
#EXTINF:8.0,
1502/58877189.ts
#EXTINF:6.0,
1502/58877190.ts
";

    const LAST: &str = "#EXTM3U
#EXT-X-TARGETDURATION:8
#EXT-X-MEDIA-SEQUENCE:58877189
#EXTINF:8.0,
1502/58877189.ts
#EXTINF:6.0,
1502/58877190.ts
#EXTINF:4.0,
1502/58877191.ts
#EXT-X-ENDLIST
";

    /// Serves manifest revisions in order, repeating the last one.
    struct ScriptedFetcher {
        revisions: Mutex<VecDeque<&'static str>>,
        requests: Mutex<Vec<Url>>,
    }

    impl ScriptedFetcher {
        fn new(revisions: &[&'static str]) -> Self {
            Self {
                revisions: Mutex::new(revisions.iter().copied().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ResourceFetcher for ScriptedFetcher {
        async fn fetch_bytes(&self, url: &Url) -> Result<Bytes, LiveError> {
            self.requests.lock().unwrap().push(url.clone());
            let mut revisions = self.revisions.lock().unwrap();
            let body = if revisions.len() > 1 {
                revisions.pop_front()
            } else {
                revisions.front().copied()
            };
            Ok(Bytes::from_static(body.unwrap_or("").as_bytes()))
        }
    }

    /// Records requested intervals; cancels the token on the `cancel_at`-th sleep.
    #[derive(Default)]
    struct RecordingSleeper {
        slept: Mutex<Vec<Duration>>,
        cancel_at: Option<(usize, CancellationToken)>,
    }

    impl RecordingSleeper {
        fn cancelling(at: usize, token: CancellationToken) -> Self {
            Self {
                slept: Mutex::new(Vec::new()),
                cancel_at: Some((at, token)),
            }
        }

        fn intervals(&self) -> Vec<Duration> {
            self.slept.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            let count = {
                let mut slept = self.slept.lock().unwrap();
                slept.push(duration);
                slept.len()
            };
            if let Some((at, token)) = &self.cancel_at
                && count >= *at
            {
                token.cancel();
                std::future::pending::<()>().await;
            }
        }
    }

    /// Collects delivered URLs and whether the sink was finished.
    #[derive(Default)]
    struct CollectingSink {
        urls: Vec<String>,
        finished: bool,
        fail_after: Option<usize>,
    }

    #[async_trait]
    impl SegmentSink for CollectingSink {
        async fn deliver(&mut self, _segment: &Segment, url: &Url) -> Result<(), LiveError> {
            if self.fail_after.is_some_and(|n| self.urls.len() >= n) {
                return Err(LiveError::SinkClosed);
            }
            self.urls.push(url.to_string());
            Ok(())
        }

        async fn finish(&mut self) -> Result<(), LiveError> {
            self.finished = true;
            Ok(())
        }
    }

    fn manifest_url() -> Url {
        Url::parse("http://80.188.78.151/atip/1502.m3u8").unwrap()
    }

    fn follower<'a>(
        fetcher: &'a ScriptedFetcher,
        sleeper: &'a RecordingSleeper,
        token: CancellationToken,
    ) -> PlaylistFollower<&'a ScriptedFetcher, &'a RecordingSleeper> {
        PlaylistFollower::new(fetcher, sleeper, FollowerConfig::default(), token)
    }

    #[tokio::test]
    async fn follows_until_end_marker() {
        let fetcher = ScriptedFetcher::new(&[FIRST, SECOND, LAST]);
        let sleeper = RecordingSleeper::default();
        let mut sink = CollectingSink::default();

        let summary = follower(&fetcher, &sleeper, CancellationToken::new())
            .follow(&manifest_url(), &mut sink)
            .await
            .unwrap();

        assert_eq!(
            sink.urls,
            (58877187..=58877191)
                .map(|n| format!("http://80.188.78.151/atip/1502/{n}.ts"))
                .collect::<Vec<_>>()
        );
        assert!(sink.finished);
        assert_eq!(
            summary,
            FollowSummary {
                segments_delivered: 5,
                polls: 3,
                interrupted: false,
            }
        );
        assert_eq!(
            sleeper.intervals(),
            vec![Duration::from_secs(8), Duration::from_secs(6)]
        );
        assert!(fetcher.requests.lock().unwrap().iter().all(|u| *u == manifest_url()));
    }

    #[tokio::test]
    async fn unchanged_manifest_keeps_polling() {
        let fetcher = ScriptedFetcher::new(&[FIRST, FIRST, FIRST, LAST]);
        let sleeper = RecordingSleeper::default();
        let mut sink = CollectingSink::default();

        let summary = follower(&fetcher, &sleeper, CancellationToken::new())
            .follow(&manifest_url(), &mut sink)
            .await
            .unwrap();

        assert_eq!(summary.polls, 4);
        assert_eq!(summary.segments_delivered, 5);
        assert_eq!(sleeper.intervals().len(), 3);
    }

    #[tokio::test]
    async fn ended_manifest_needs_no_refresh() {
        let fetcher = ScriptedFetcher::new(&[LAST]);
        let sleeper = RecordingSleeper::default();
        let mut printer = UrlPrinter::new(Vec::new());

        let summary = follower(&fetcher, &sleeper, CancellationToken::new())
            .follow(&manifest_url(), &mut printer)
            .await
            .unwrap();

        assert_eq!(summary.polls, 1);
        assert_eq!(summary.segments_delivered, 3);
        assert!(sleeper.intervals().is_empty());
        let out = String::from_utf8(printer.into_inner()).unwrap();
        assert_eq!(out.lines().count(), 3);
        assert!(out.ends_with("1502/58877191.ts\n"));
    }

    #[tokio::test]
    async fn cancellation_during_sleep_interrupts() {
        let token = CancellationToken::new();
        let fetcher = ScriptedFetcher::new(&[FIRST, SECOND]);
        let sleeper = RecordingSleeper::cancelling(2, token.clone());
        let mut sink = CollectingSink::default();

        let summary = follower(&fetcher, &sleeper, token)
            .follow(&manifest_url(), &mut sink)
            .await
            .unwrap();

        assert!(summary.interrupted);
        assert_eq!(summary.segments_delivered, 4);
        assert_eq!(summary.polls, 2);
        assert!(!sink.finished);
        assert_eq!(fetcher.request_count(), 2);
    }

    #[tokio::test]
    async fn cancelled_before_start_fetches_nothing() {
        let token = CancellationToken::new();
        token.cancel();
        let fetcher = ScriptedFetcher::new(&[FIRST]);
        let sleeper = RecordingSleeper::default();
        let mut sink = CollectingSink::default();

        let summary = follower(&fetcher, &sleeper, token)
            .follow(&manifest_url(), &mut sink)
            .await
            .unwrap();

        assert!(summary.interrupted);
        assert_eq!(summary.polls, 0);
        assert_eq!(fetcher.request_count(), 0);
    }

    #[tokio::test]
    async fn interval_falls_back_without_segments() {
        let fetcher = ScriptedFetcher::new(&[
            "#EXTM3U\n#EXT-X-MEDIA-SEQUENCE:0\n",
            "#EXTM3U\n#EXT-X-TARGETDURATION:6\n#EXT-X-MEDIA-SEQUENCE:0\n",
            "#EXTM3U\n#EXT-X-TARGETDURATION:6\n#EXT-X-MEDIA-SEQUENCE:0\n#EXT-X-ENDLIST\n",
        ]);
        let sleeper = RecordingSleeper::default();
        let mut sink = CollectingSink::default();
        let config = FollowerConfig::default().with_fallback_interval(Duration::from_millis(500));

        let summary = PlaylistFollower::new(&fetcher, &sleeper, config, CancellationToken::new())
            .follow(&manifest_url(), &mut sink)
            .await
            .unwrap();

        assert_eq!(summary.segments_delivered, 0);
        assert!(sink.finished);
        assert_eq!(
            sleeper.intervals(),
            vec![Duration::from_millis(500), Duration::from_secs(6)]
        );
    }

    #[tokio::test]
    async fn malformed_manifest_is_fatal() {
        let fetcher = ScriptedFetcher::new(&[FIRST, "<html>gone</html>"]);
        let sleeper = RecordingSleeper::default();
        let mut sink = CollectingSink::default();

        let err = follower(&fetcher, &sleeper, CancellationToken::new())
            .follow(&manifest_url(), &mut sink)
            .await
            .unwrap_err();

        assert!(matches!(err, LiveError::Manifest { .. }));
        assert_eq!(sink.urls.len(), 3);
    }

    #[tokio::test]
    async fn strict_mode_rejects_unknown_directive() {
        let text: &'static str = "#EXTM3U
#EXT-X-MEDIA-SEQUENCE:1
#EXT-X-VENDOR-HINT:1
#EXTINF:8.0,
1.ts
";
        let fetcher = ScriptedFetcher::new(&[text]);
        let sleeper = RecordingSleeper::default();
        let config = FollowerConfig::default().with_parse_mode(ParseMode::Strict);
        let follower = PlaylistFollower::new(&fetcher, &sleeper, config, CancellationToken::new());

        let err = follower.snapshot(&manifest_url()).await.unwrap_err();
        assert!(matches!(err, LiveError::Manifest { .. }));
    }

    #[tokio::test]
    async fn closed_sink_stops_following() {
        let fetcher = ScriptedFetcher::new(&[FIRST, SECOND, LAST]);
        let sleeper = RecordingSleeper::default();
        let mut sink = CollectingSink {
            fail_after: Some(2),
            ..Default::default()
        };

        let err = follower(&fetcher, &sleeper, CancellationToken::new())
            .follow(&manifest_url(), &mut sink)
            .await
            .unwrap_err();

        assert!(err.is_interruption());
        assert_eq!(sink.urls.len(), 2);
        assert_eq!(fetcher.request_count(), 1);
    }
}
