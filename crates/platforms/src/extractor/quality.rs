use std::fmt;
use std::str::FromStr;

use hls::{VariantPlaylist, VariantStream};
use tracing::debug;

use crate::extractor::error::ExtractorError;

/// Which variant of a multi-quality broadcast to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualitySelector {
    /// Position in the variants sorted by ascending bandwidth; negative counts from the end.
    Index(isize),
    /// Variant whose vertical resolution matches, e.g. `720p`.
    Height(u64),
}

impl QualitySelector {
    pub const MIN: Self = Self::Index(0);
    pub const MAX: Self = Self::Index(-1);
}

impl Default for QualitySelector {
    fn default() -> Self {
        Self::MAX
    }
}

impl fmt::Display for QualitySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::MIN => f.write_str("min"),
            Self::MAX => f.write_str("max"),
            Self::Index(index) => write!(f, "{index}"),
            Self::Height(height) => write!(f, "{height}p"),
        }
    }
}

impl FromStr for QualitySelector {
    type Err = ExtractorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ExtractorError::InvalidQuality(s.to_owned());

        match s.to_ascii_lowercase().as_str() {
            "min" => return Ok(Self::MIN),
            "max" => return Ok(Self::MAX),
            _ => {}
        }

        if let Ok(index) = s.parse::<isize>() {
            return Ok(Self::Index(index));
        }

        let height = if let Some(height) = s.strip_suffix(['p', 'P']) {
            height
        } else if let Some((_, height)) = s.split_once(['x', 'X']) {
            height
        } else {
            return Err(invalid());
        };

        match height.parse::<u64>() {
            Ok(height) if height > 0 => Ok(Self::Height(height)),
            _ => Err(invalid()),
        }
    }
}

/// Picks one variant of a top-level manifest.
///
/// Variants are ordered by ascending bandwidth before an index is applied.
/// A height selector picks the highest-bandwidth variant of that height.
pub fn select_quality(
    playlist: &VariantPlaylist,
    selector: QualitySelector,
) -> Result<VariantStream, ExtractorError> {
    let sorted = playlist.by_bandwidth();
    let unavailable = || ExtractorError::QualityUnavailable {
        requested: selector.to_string(),
        available: sorted.len(),
    };

    let chosen = match selector {
        QualitySelector::Index(index) => {
            let len = sorted.len() as isize;
            let position = if index < 0 { len + index } else { index };
            usize::try_from(position)
                .ok()
                .and_then(|position| sorted.get(position))
        }
        QualitySelector::Height(height) => sorted
            .iter()
            .rev()
            .find(|v| v.resolution.is_some_and(|r| r.height == height)),
    };

    let chosen = chosen.cloned().ok_or_else(unavailable)?;
    debug!(%selector, variant = %chosen, url = %chosen.url, "Selected quality");
    Ok(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hls::Resolution;
    use url::Url;

    fn variant(bandwidth: u64, height: Option<u64>) -> VariantStream {
        VariantStream {
            url: Url::parse(&format!("http://example.cz/{bandwidth}.m3u8")).unwrap(),
            bandwidth,
            resolution: height.map(|h| Resolution::new(h * 16 / 9, h)),
        }
    }

    fn playlist() -> VariantPlaylist {
        VariantPlaylist {
            variants: vec![
                variant(2048000, Some(576)),
                variant(500000, Some(288)),
                variant(3584000, Some(720)),
                variant(1032000, None),
            ],
        }
    }

    fn bandwidth(selector: &str) -> Result<u64, ExtractorError> {
        let selector: QualitySelector = selector.parse()?;
        select_quality(&playlist(), selector).map(|v| v.bandwidth)
    }

    #[test]
    fn parses_selectors() {
        assert_eq!("min".parse::<QualitySelector>().unwrap(), QualitySelector::MIN);
        assert_eq!("MAX".parse::<QualitySelector>().unwrap(), QualitySelector::MAX);
        assert_eq!("-2".parse::<QualitySelector>().unwrap(), QualitySelector::Index(-2));
        assert_eq!("720p".parse::<QualitySelector>().unwrap(), QualitySelector::Height(720));
        assert_eq!(
            "1280x720".parse::<QualitySelector>().unwrap(),
            QualitySelector::Height(720)
        );
        assert!(matches!(
            "best".parse::<QualitySelector>(),
            Err(ExtractorError::InvalidQuality(_))
        ));
        assert!("0p".parse::<QualitySelector>().is_err());
    }

    #[test]
    fn display_round_trips_keywords() {
        assert_eq!(QualitySelector::MIN.to_string(), "min");
        assert_eq!(QualitySelector::MAX.to_string(), "max");
        assert_eq!(QualitySelector::Index(2).to_string(), "2");
        assert_eq!(QualitySelector::Height(576).to_string(), "576p");
    }

    #[test]
    fn selects_by_sorted_index() {
        assert_eq!(bandwidth("min").unwrap(), 500000);
        assert_eq!(bandwidth("0").unwrap(), 500000);
        assert_eq!(bandwidth("1").unwrap(), 1032000);
        assert_eq!(bandwidth("max").unwrap(), 3584000);
        assert_eq!(bandwidth("-1").unwrap(), 3584000);
        assert_eq!(bandwidth("-4").unwrap(), 500000);
    }

    #[test]
    fn out_of_range_index_is_unavailable() {
        for selector in ["42", "4", "-5"] {
            let err = bandwidth(selector).unwrap_err();
            assert!(
                matches!(err, ExtractorError::QualityUnavailable { available: 4, .. }),
                "{selector}: {err}"
            );
        }
    }

    #[test]
    fn selects_by_height() {
        assert_eq!(bandwidth("576p").unwrap(), 2048000);
        assert_eq!(bandwidth("1280x720").unwrap(), 3584000);
        assert!(matches!(
            bandwidth("1080p"),
            Err(ExtractorError::QualityUnavailable { .. })
        ));
    }

    #[test]
    fn empty_playlist_has_no_quality() {
        let err = select_quality(&VariantPlaylist::default(), QualitySelector::MAX).unwrap_err();
        assert!(matches!(err, ExtractorError::QualityUnavailable { available: 0, .. }));
    }
}
