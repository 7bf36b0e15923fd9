use std::future::Future;
use std::io;
use std::time::Duration;

#[cfg(feature = "colored-output")]
use colored::*;
use ct_platforms::{CeskaTelevize, ChannelDirectory, QualitySelector};
use live_engine::{
    CancellationToken, FollowSummary, FollowerConfig, HttpConfig, HttpFetcher, LiveError,
    ParseMode, PlayerFeed, PlaylistFollower, SegmentSink, TokioSleeper, UrlPrinter,
    create_client,
};
use process_utils::PlayerCommand;
#[cfg(feature = "table-output")]
use tabled::{Table, Tabled, settings::Style};
use tracing::{debug, info, warn};
use url::Url;

use crate::cli::{Args, OutputMode};
use crate::error::{AppError, Result};

pub struct CommandExecutor {
    client: reqwest::Client,
    televize: CeskaTelevize,
    player: PlayerCommand,
    quality: QualitySelector,
    output: OutputMode,
    follower_config: FollowerConfig,
    token: CancellationToken,
}

impl CommandExecutor {
    pub fn new(args: &Args, token: CancellationToken) -> Result<Self> {
        let http = HttpConfig::default().with_timeout(Duration::from_secs(args.timeout));
        let client = create_client(&http)?;
        let televize = CeskaTelevize::new(client.clone())?;
        let player = PlayerCommand::parse(&args.player)?;

        let parse_mode = if args.strict {
            ParseMode::Strict
        } else {
            ParseMode::Lenient
        };

        Ok(Self {
            client,
            televize,
            player,
            quality: args.quality,
            output: args.output,
            follower_config: FollowerConfig::default().with_parse_mode(parse_mode),
            token,
        })
    }

    pub fn list_channels(&self) -> Result<()> {
        println!("{}", format_channels(self.televize.channels()));
        Ok(())
    }

    pub async fn play_live(&self, channel: &str) -> Result<()> {
        let resolving = self.televize.resolve_channel(channel, self.quality);
        match self.interruptible(resolving).await? {
            Some(manifest) => self.play(manifest).await,
            None => Ok(()),
        }
    }

    pub async fn play_episode(&self, target: &str) -> Result<()> {
        let resolving = self.televize.resolve_episode(target, self.quality);
        match self.interruptible(resolving).await? {
            Some(manifest) => self.play(manifest).await,
            None => Ok(()),
        }
    }

    /// Awaits `fut` unless interrupted first, which yields `None`.
    async fn interruptible<T, E>(
        &self,
        fut: impl Future<Output = std::result::Result<T, E>>,
    ) -> Result<Option<T>>
    where
        AppError: From<E>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                info!("Interrupted");
                Ok(None)
            }
            result = fut => Ok(Some(result?)),
        }
    }

    async fn play(&self, manifest: Url) -> Result<()> {
        info!(url = %manifest, mode = ?self.output, "Resolved media manifest");
        match self.output {
            OutputMode::Direct => self.play_direct(&manifest).await,
            OutputMode::Print => {
                let mut printer = UrlPrinter::new(io::stdout());
                self.follow(&manifest, &mut printer).await.map(|_| ())
            }
            OutputMode::Feed => self.play_feed(&manifest).await,
        }
    }

    async fn play_direct(&self, manifest: &Url) -> Result<()> {
        let player = self.player.spawn_with_url(manifest.as_str())?;
        tokio::select! {
            status = player.wait() => {
                let status = status?;
                if !status.success() {
                    warn!(%status, "Player exited with failure");
                }
            }
            _ = self.token.cancelled() => info!("Interrupted, stopping player"),
        }
        Ok(())
    }

    async fn play_feed(&self, manifest: &Url) -> Result<()> {
        let mut player = self.player.spawn_piped()?;
        let stdin = player.take_stdin()?;
        let mut feed = PlayerFeed::new(HttpFetcher::new(self.client.clone()), stdin);

        let summary = self.follow(manifest, &mut feed).await?;
        debug!(bytes = feed.bytes_written(), "Finished feeding player");
        drop(feed);

        if summary.is_some_and(|s| !s.interrupted) {
            info!("Waiting for the player to finish");
            tokio::select! {
                status = player.wait() => { status?; }
                _ = self.token.cancelled() => info!("Interrupted, stopping player"),
            }
        }
        Ok(())
    }

    /// Runs the follower; `None` when the sink went away before the stream ended.
    async fn follow<K: SegmentSink>(
        &self,
        manifest: &Url,
        sink: &mut K,
    ) -> Result<Option<FollowSummary>> {
        let follower = PlaylistFollower::new(
            HttpFetcher::new(self.client.clone()),
            TokioSleeper,
            self.follower_config,
            self.token.clone(),
        );

        match follower.follow(manifest, sink).await {
            Ok(summary) => {
                if summary.interrupted {
                    info!("Interrupted");
                } else {
                    info!(
                        segments = summary.segments_delivered,
                        "Playback finished"
                    );
                }
                Ok(Some(summary))
            }
            Err(LiveError::SinkClosed) => {
                info!("Player closed its input");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(feature = "table-output")]
#[derive(Tabled)]
struct ChannelRow {
    #[tabled(rename = "Channel")]
    slug: &'static str,
    #[tabled(rename = "Name")]
    name: &'static str,
}

#[cfg(feature = "table-output")]
fn format_channels(channels: &ChannelDirectory) -> String {
    let rows = channels.iter().map(|c| ChannelRow {
        slug: c.slug,
        name: c.name,
    });
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    format!("{}\n{table}", heading("Channels:"))
}

#[cfg(not(feature = "table-output"))]
fn format_channels(channels: &ChannelDirectory) -> String {
    let mut output = heading("Channels:");
    for channel in channels.iter() {
        output.push_str(&format!("\n  {:<6} {}", channel.slug, channel.name));
    }
    output
}

fn heading(text: &str) -> String {
    #[cfg(feature = "colored-output")]
    {
        text.green().bold().to_string()
    }
    #[cfg(not(feature = "colored-output"))]
    {
        text.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_listing_names_every_slug() {
        let directory = ChannelDirectory::default();
        let listing = format_channels(&directory);
        for channel in directory.iter() {
            assert!(listing.contains(channel.slug), "{listing}");
            assert!(listing.contains(channel.name), "{listing}");
        }
    }
}
