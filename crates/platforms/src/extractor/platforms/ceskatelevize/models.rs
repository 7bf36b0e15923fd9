use serde::Deserialize;

/// Reply of the client-playlist endpoint: a session-scoped pointer to the playlist metadata.
#[derive(Deserialize, Debug)]
pub(crate) struct ClientPlaylistResponse {
    pub url: String,
}

impl ClientPlaylistResponse {
    /// Geo-blocked content is answered with this marker instead of a URL.
    pub const REGION_ERROR: &str = "error_region";
}

#[derive(Deserialize, Debug)]
pub(crate) struct PlaylistMetadata {
    #[serde(default)]
    pub playlist: Vec<PlaylistItem>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlaylistItem {
    #[serde(default)]
    pub title: Option<String>,
    pub stream_urls: StreamUrls,
}

#[derive(Deserialize, Debug)]
pub(crate) struct StreamUrls {
    pub main: String,
}
