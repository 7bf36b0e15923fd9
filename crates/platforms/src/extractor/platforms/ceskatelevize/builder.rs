use std::fmt;
use std::sync::LazyLock;

use hls::{VariantPlaylist, parse_variant_playlist};
use regex::Regex;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use super::channels::ChannelDirectory;
use super::models::{ClientPlaylistResponse, PlaylistMetadata};
use crate::extractor::error::ExtractorError;
use crate::extractor::platform_extractor::Extractor;
use crate::extractor::quality::{QualitySelector, select_quality};
use crate::extractor::utils::{capture_group_1, is_numeric_id};

/// Archive item URL: `/ivysilani/<show>/<item id>[-title][/]`.
pub static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?ceskatelevize\.cz/ivysilani/[^/?#]+/(\d+)(?:[-/?#]|$)")
        .unwrap()
});

static ITEM_PATH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/ivysilani/[^/?#]+/(\d+)(?:[-/?#]|$)").unwrap());

static DATA_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<a\b[^>]*\bdata-id="(\d+)""#).unwrap());

static HREF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<a\b[^>]*\bhref="([^"]+)""#).unwrap());

/// Kind of content a playlist is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistKind {
    Channel,
    Episode,
}

impl PlaylistKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::Episode => "episode",
        }
    }
}

impl fmt::Display for PlaylistKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client of the Czech Television playlist service.
///
/// Resolution takes three requests: a form POST that returns a session-scoped
/// pointer, a GET of that pointer that returns playlist metadata, and a GET of
/// the metadata's stream URL that returns the top-level manifest.
pub struct CeskaTelevize {
    extractor: Extractor,
    base_url: Url,
    channels: ChannelDirectory,
}

impl CeskaTelevize {
    pub const BASE_URL: &str = "http://www.ceskatelevize.cz";
    const PLAYLIST_PATH: &str = "/ivysilani/ajax/get-client-playlist";

    pub fn new(client: Client) -> Result<Self, ExtractorError> {
        let base_url = Url::parse(Self::BASE_URL)
            .map_err(|e| ExtractorError::InvalidUrl(format!("{}: {e}", Self::BASE_URL)))?;
        Ok(Self::with_base_url(client, base_url))
    }

    /// Points the client at another host serving the same API.
    pub fn with_base_url(client: Client, base_url: Url) -> Self {
        let extractor = Extractor::new("CeskaTelevize", client);
        Self {
            extractor,
            base_url,
            channels: ChannelDirectory::default(),
        }
    }

    pub fn channels(&self) -> &ChannelDirectory {
        &self.channels
    }

    /// Resolves a live channel slug to the media manifest of the selected quality.
    pub async fn resolve_channel(
        &self,
        slug: &str,
        selector: QualitySelector,
    ) -> Result<Url, ExtractorError> {
        let channel = self
            .channels
            .get(slug)
            .ok_or_else(|| ExtractorError::ChannelNotFound(slug.to_owned()))?;
        info!(channel = %channel, quality = %selector, "Resolving live channel");

        let variants = self
            .variant_playlist(&channel.id.to_string(), PlaylistKind::Channel)
            .await?;
        Ok(select_quality(&variants, selector)?.url)
    }

    /// Resolves an archive item, given as a bare id or a page URL, to a media manifest.
    pub async fn resolve_episode(
        &self,
        input: &str,
        selector: QualitySelector,
    ) -> Result<Url, ExtractorError> {
        let id = self.episode_id(input).await?;
        info!(id = %id, quality = %selector, "Resolving archive item");

        let variants = self.variant_playlist(&id, PlaylistKind::Episode).await?;
        Ok(select_quality(&variants, selector)?.url)
    }

    /// Finds the playlist id of an archive item.
    pub async fn episode_id(&self, input: &str) -> Result<String, ExtractorError> {
        let input = input.trim();
        if is_numeric_id(input) {
            return Ok(input.to_owned());
        }
        if let Some(id) = capture_group_1(&URL_REGEX, input) {
            return Ok(id.to_owned());
        }

        let page = Url::parse(input).map_err(|e| ExtractorError::InvalidUrl(format!("{input}: {e}")))?;
        debug!(url = %page, "Scraping page for a playable item");
        let html = self
            .extractor
            .send_checked(self.extractor.get(page.as_str()))
            .await?
            .text()
            .await?;

        scrape_item_id(&html, &page)
            .ok_or_else(|| ExtractorError::ContentNotFound(format!("no playable item on {page}")))
    }

    /// Fetches the top-level manifest listing the qualities of a channel or item.
    pub async fn variant_playlist(
        &self,
        id: &str,
        kind: PlaylistKind,
    ) -> Result<VariantPlaylist, ExtractorError> {
        let pointer = self.client_playlist_url(id, kind).await?;
        let stream_url = self.stream_url(&pointer).await?;

        let text = self
            .extractor
            .send_checked(self.extractor.get(stream_url.as_str()))
            .await?
            .text()
            .await?;
        let variants = parse_variant_playlist(&text, &stream_url)?;
        if variants.is_empty() {
            return Err(ExtractorError::ContentNotFound(format!(
                "{kind} {id} offers no playable variant"
            )));
        }
        debug!(count = variants.variants.len(), "Fetched variant manifest");
        Ok(variants)
    }

    async fn client_playlist_url(
        &self,
        id: &str,
        kind: PlaylistKind,
    ) -> Result<Url, ExtractorError> {
        let endpoint = self.join(&self.base_url, Self::PLAYLIST_PATH)?;
        let form = [
            ("playlist[0][id]", id),
            ("playlist[0][type]", kind.as_str()),
            ("requestUrl", "/ivysilani/"),
            ("requestSource", "iVysilani"),
            ("addCommercials", "0"),
            ("type", "html"),
        ];

        let body = self
            .extractor
            .send_checked(
                self.extractor
                    .post(endpoint.as_str())
                    .header("x-addr", "127.0.0.1")
                    .form(&form),
            )
            .await?
            .text()
            .await?;
        let response: ClientPlaylistResponse = serde_json::from_str(&body)?;

        match response.url.as_str() {
            ClientPlaylistResponse::REGION_ERROR => Err(ExtractorError::RegionLocked),
            "" => Err(ExtractorError::ContentNotFound(format!("{kind} {id}"))),
            url => self.join(&endpoint, url),
        }
    }

    async fn stream_url(&self, pointer: &Url) -> Result<Url, ExtractorError> {
        let body = self
            .extractor
            .send_checked(self.extractor.get(pointer.as_str()))
            .await?
            .text()
            .await?;
        let metadata: PlaylistMetadata = serde_json::from_str(&body)?;

        let item = metadata
            .playlist
            .into_iter()
            .next()
            .ok_or_else(|| ExtractorError::ContentNotFound("empty playlist metadata".to_owned()))?;
        if let Some(title) = &item.title {
            debug!(title = %title, "Playlist metadata");
        }
        self.join(pointer, &item.stream_urls.main)
    }

    fn join(&self, base: &Url, reference: &str) -> Result<Url, ExtractorError> {
        base.join(reference)
            .map_err(|e| ExtractorError::InvalidUrl(format!("{reference}: {e}")))
    }
}

/// Extracts the playlist id of the play anchor of an item page.
fn scrape_item_id(html: &str, page: &Url) -> Option<String> {
    if let Some(id) = capture_group_1(&DATA_ID_REGEX, html) {
        return Some(id.to_owned());
    }
    HREF_REGEX
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .filter_map(|href| page.join(href.as_str()).ok())
        .find_map(|target| capture_group_1(&ITEM_PATH_REGEX, target.path()).map(ToOwned::to_owned))
}
