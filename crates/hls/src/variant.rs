use std::fmt;

use m3u8_rs::parse_playlist_res;
use tracing::debug;
use url::Url;

use crate::ManifestError;
use crate::manifest::strip_to_header;

/// Video resolution information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u64,
    pub height: u64,
}

impl Resolution {
    #[inline]
    pub fn new(width: u64, height: u64) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A sub-manifest reference of a top-level manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantStream {
    /// Absolute URL of the media manifest.
    pub url: Url,
    /// Peak bandwidth in bits per second.
    pub bandwidth: u64,
    pub resolution: Option<Resolution>,
}

impl fmt::Display for VariantStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolution {
            Some(resolution) => write!(f, "{} bps ({resolution})", self.bandwidth),
            None => write!(f, "{} bps", self.bandwidth),
        }
    }
}

/// Top-level manifest listing the same broadcast in several qualities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantPlaylist {
    pub variants: Vec<VariantStream>,
}

impl VariantPlaylist {
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Variants ordered by ascending bandwidth.
    pub fn by_bandwidth(&self) -> Vec<VariantStream> {
        let mut sorted = self.variants.clone();
        sorted.sort_by_key(|v| v.bandwidth);
        sorted
    }
}

/// Parses a top-level manifest, resolving variant locations against `base_url`.
///
/// I-frame-only variants are skipped; they cannot be played on their own.
pub fn parse_variant_playlist(text: &str, base_url: &Url) -> Result<VariantPlaylist, ManifestError> {
    let body = strip_to_header(text)?;
    let master = match parse_playlist_res(body.as_bytes()) {
        Ok(m3u8_rs::Playlist::MasterPlaylist(pl)) => pl,
        Ok(m3u8_rs::Playlist::MediaPlaylist(_)) => {
            return Err(ManifestError::malformed(
                "expected a variant manifest, found a media manifest",
            ));
        }
        Err(e) => return Err(ManifestError::malformed(e.to_string())),
    };

    let mut variants = Vec::with_capacity(master.variants.len());
    for variant in master.variants.iter().filter(|v| !v.is_i_frame) {
        if variant.bandwidth == 0 {
            return Err(ManifestError::malformed(format!(
                "variant `{}` has no BANDWIDTH attribute",
                variant.uri
            )));
        }
        let url = base_url
            .join(variant.uri.trim())
            .map_err(|e| ManifestError::invalid_uri(variant.uri.clone(), e.to_string()))?;
        variants.push(VariantStream {
            url,
            bandwidth: variant.bandwidth,
            resolution: variant
                .resolution
                .map(|r| Resolution::new(r.width, r.height)),
        });
    }

    debug!(count = variants.len(), "Parsed variant manifest");
    Ok(VariantPlaylist { variants })
}
