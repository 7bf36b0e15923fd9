//! Media manifest snapshots.
//!
//! A [`ManifestSnapshot`] is the parsed content of one fetch of a media
//! manifest. Parsing delegates the grammar to `m3u8-rs` and adds the checks
//! that the library does not perform on its own: the position of the
//! `#EXTM3U` header, whether `#EXT-X-MEDIA-SEQUENCE` was declared at all, and
//! the unknown-tag policy selected by [`ParseMode`].

use chrono::Utc;
use m3u8_rs::{ExtTag, MediaPlaylist, parse_playlist_res};
use tracing::{debug, trace, warn};
use url::Url;

use crate::{ManifestError, Segment};

pub(crate) const HEADER_TAG: &str = "#EXTM3U";
const MEDIA_SEQUENCE_TAG: &str = "#EXT-X-MEDIA-SEQUENCE";
const SEGMENT_TAG: &str = "#EXTINF";

/// Policy for tags the manifest grammar does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Log and skip unknown tags.
    #[default]
    Lenient,
    /// Reject unknown tags and segments listed before the media-sequence base.
    Strict,
}

/// One fetch's worth of a media manifest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestSnapshot {
    pub segments: Vec<Segment>,
    /// Sequence number of the first segment; 0 when the manifest does not declare it.
    pub media_sequence_base: u64,
    /// Whether `#EXT-X-MEDIA-SEQUENCE` was present in the source text.
    pub explicit_media_sequence: bool,
    /// Set by `#EXT-X-ENDLIST`: no segment will ever be appended.
    pub end_of_stream: bool,
    /// Advisory refresh interval in seconds.
    pub target_duration: f64,
    /// URL the manifest was fetched from, when known.
    pub base_url: Option<Url>,
}

impl ManifestSnapshot {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Sequence number of the segment at `index`.
    pub fn sequence_at(&self, index: usize) -> u64 {
        self.media_sequence_base.saturating_add(index as u64)
    }

    /// A snapshot has a shape when it tells something about how its segments are identified.
    pub fn has_shape(&self) -> bool {
        self.explicit_media_sequence || !self.segments.is_empty()
    }
}

/// Parser for media manifests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestParser {
    mode: ParseMode,
}

impl ManifestParser {
    pub fn new(mode: ParseMode) -> Self {
        Self { mode }
    }

    pub fn lenient() -> Self {
        Self::new(ParseMode::Lenient)
    }

    pub fn strict() -> Self {
        Self::new(ParseMode::Strict)
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    pub fn parse_bytes(
        &self,
        bytes: &[u8],
        base_url: Option<&Url>,
    ) -> Result<ManifestSnapshot, ManifestError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ManifestError::malformed(format!("manifest is not valid UTF-8: {e}")))?;
        self.parse(text, base_url)
    }

    pub fn parse(
        &self,
        text: &str,
        base_url: Option<&Url>,
    ) -> Result<ManifestSnapshot, ManifestError> {
        let body = strip_to_header(text)?;
        let scan = DirectiveScan::of(body);

        if self.mode == ParseMode::Strict && scan.segment_before_sequence {
            return Err(ManifestError::malformed(format!(
                "{SEGMENT_TAG} found before {MEDIA_SEQUENCE_TAG}"
            )));
        }

        let playlist = match parse_playlist_res(body.as_bytes()) {
            Ok(m3u8_rs::Playlist::MediaPlaylist(pl)) => pl,
            Ok(m3u8_rs::Playlist::MasterPlaylist(_)) => {
                return Err(ManifestError::malformed(
                    "expected a media manifest, found a variant manifest",
                ));
            }
            Err(e) => return Err(ManifestError::malformed(e.to_string())),
        };

        if scan.segment_tags != playlist.segments.len() {
            return Err(ManifestError::malformed(format!(
                "{} {SEGMENT_TAG} directives describe {} segments",
                scan.segment_tags,
                playlist.segments.len()
            )));
        }
        self.check_unknown_tags(&playlist)?;

        let mut segments = Vec::with_capacity(playlist.segments.len());
        for (index, segment) in playlist.segments.iter().enumerate() {
            let uri = segment.uri.trim();
            if uri.is_empty() {
                if self.mode == ParseMode::Strict {
                    return Err(ManifestError::malformed(format!(
                        "segment at position {index} has no location"
                    )));
                }
                warn!(index, "Skipping segment with empty location");
                continue;
            }

            let mut parsed = Segment::new(uri, f64::from(segment.duration));
            if scan.media_sequence_declared {
                parsed = parsed.with_sequence(playlist.media_sequence + index as u64);
            }
            if let Some(pdt) = segment.program_date_time {
                parsed = parsed.with_program_date_time(pdt.with_timezone(&Utc));
            }
            segments.push(parsed);
        }

        let snapshot = ManifestSnapshot {
            segments,
            media_sequence_base: playlist.media_sequence,
            explicit_media_sequence: scan.media_sequence_declared,
            end_of_stream: playlist.end_list,
            target_duration: playlist.target_duration as f64,
            base_url: base_url.cloned(),
        };
        trace!(
            segments = snapshot.segments.len(),
            media_sequence = snapshot.media_sequence_base,
            end = snapshot.end_of_stream,
            "Parsed media manifest"
        );
        Ok(snapshot)
    }

    fn check_unknown_tags(&self, playlist: &MediaPlaylist) -> Result<(), ManifestError> {
        let unknown = playlist
            .unknown_tags
            .iter()
            .chain(playlist.segments.iter().flat_map(|s| s.unknown_tags.iter()));

        for tag in unknown {
            match self.mode {
                ParseMode::Strict => {
                    return Err(ManifestError::malformed(format!(
                        "unknown directive {}",
                        describe_tag(tag)
                    )));
                }
                ParseMode::Lenient => debug!("Ignoring unknown directive {}", describe_tag(tag)),
            }
        }
        Ok(())
    }
}

fn describe_tag(tag: &ExtTag) -> String {
    match tag.rest.as_deref() {
        Some(rest) => format!("#EXT-{}:{rest}", tag.tag),
        None => format!("#EXT-{}", tag.tag),
    }
}

/// Returns the text starting at the header line, or fails when the first
/// non-empty line is something else.
pub(crate) fn strip_to_header(text: &str) -> Result<&str, ManifestError> {
    let body = text.trim_start_matches('\u{feff}').trim_start();
    match body.lines().next().map(str::trim_end) {
        Some(HEADER_TAG) => Ok(body),
        Some(other) => Err(ManifestError::malformed(format!(
            "expected {HEADER_TAG} header, found `{other}`"
        ))),
        None => Err(ManifestError::malformed("empty manifest")),
    }
}

/// Facts about the raw directive order that the parsed playlist no longer carries.
#[derive(Debug, Default)]
struct DirectiveScan {
    media_sequence_declared: bool,
    segment_before_sequence: bool,
    segment_tags: usize,
}

impl DirectiveScan {
    fn of(body: &str) -> Self {
        let mut scan = Self::default();
        for line in body.lines().map(str::trim) {
            if line.starts_with(MEDIA_SEQUENCE_TAG) {
                scan.media_sequence_declared = true;
            } else if line.starts_with(SEGMENT_TAG) {
                scan.segment_tags += 1;
                scan.segment_before_sequence |= !scan.media_sequence_declared;
            }
        }
        scan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};

    const PLAYLIST: &str = "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-TARGETDURATION:10
#EXT-X-MEDIA-SEQUENCE:57481956
#EXTINF:7.0,
1502/57481956.ts
#EXTINF:8.0,
1502/57481957.ts
#EXTINF:9.0,
1502/57481958.ts
";

    fn base() -> Url {
        Url::parse("http://example.cz/").unwrap()
    }

    #[test]
    fn parses_media_manifest() {
        let snapshot = ManifestParser::lenient()
            .parse(PLAYLIST, Some(&base()))
            .expect("manifest should parse");

        assert_eq!(snapshot.media_sequence_base, 57481956);
        assert!(snapshot.explicit_media_sequence);
        assert!(!snapshot.end_of_stream);
        assert_eq!(snapshot.target_duration, 10.0);
        assert_eq!(snapshot.base_url, Some(base()));
        assert_eq!(
            snapshot.segments,
            vec![
                Segment::new("1502/57481956.ts", 7.0).with_sequence(57481956),
                Segment::new("1502/57481957.ts", 8.0).with_sequence(57481957),
                Segment::new("1502/57481958.ts", 9.0).with_sequence(57481958),
            ]
        );
    }

    #[test]
    fn parses_end_marker() {
        let text = format!("{PLAYLIST}#EXT-X-ENDLIST\n");
        let snapshot = ManifestParser::strict().parse(&text, None).unwrap();
        assert!(snapshot.end_of_stream);
        assert_eq!(snapshot.len(), 3);
    }

    #[test]
    fn rejects_missing_header() {
        let text = PLAYLIST.trim_start_matches("#EXTM3U\n");
        let err = ManifestParser::lenient().parse(text, None).unwrap_err();
        assert!(err.is_malformed());

        let err = ManifestParser::lenient().parse("", None).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn accepts_blank_lines_before_header() {
        let text = format!("\n\n{PLAYLIST}");
        let snapshot = ManifestParser::strict().parse(&text, None).unwrap();
        assert_eq!(snapshot.len(), 3);
    }

    #[test]
    fn unknown_directive_depends_on_mode() {
        let text = PLAYLIST.replace(
            "#EXTINF:8.0,",
            "#EXT-X-BROADCASTER-HINT:foo=bar\n#EXTINF:8.0,",
        );

        let snapshot = ManifestParser::lenient().parse(&text, None).unwrap();
        assert_eq!(snapshot.len(), 3);

        let err = ManifestParser::strict().parse(&text, None).unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("X-BROADCASTER-HINT"));
    }

    #[test]
    fn segment_before_media_sequence() {
        let text = "#EXTM3U
#EXT-X-TARGETDURATION:10
#EXTINF:7.0,
a.ts
#EXT-X-MEDIA-SEQUENCE:3
#EXTINF:7.0,
b.ts
";
        let err = ManifestParser::strict().parse(text, None).unwrap_err();
        assert!(err.is_malformed());

        let lenient = ManifestParser::lenient().parse(text, None).unwrap();
        assert_eq!(lenient.len(), 2);
    }

    #[test]
    fn missing_media_sequence_leaves_segments_unnumbered() {
        let text = "#EXTM3U
#EXT-X-TARGETDURATION:6
#EXTINF:6.0,
a.ts
";
        let snapshot = ManifestParser::lenient().parse(text, None).unwrap();
        assert!(!snapshot.explicit_media_sequence);
        assert_eq!(snapshot.media_sequence_base, 0);
        assert_eq!(snapshot.segments[0].sequence, None);
        assert!(snapshot.has_shape());
    }

    #[test]
    fn explicit_zero_media_sequence_is_declared() {
        let text = "#EXTM3U
#EXT-X-TARGETDURATION:6
#EXT-X-MEDIA-SEQUENCE:0
";
        let snapshot = ManifestParser::strict().parse(text, None).unwrap();
        assert!(snapshot.explicit_media_sequence);
        assert!(snapshot.is_empty());
        assert!(snapshot.has_shape());
    }

    #[test]
    fn program_date_time_attaches_to_following_segment() {
        let text = "#EXTM3U
#EXT-X-TARGETDURATION:6
#EXT-X-PROGRAM-DATE-TIME:2016-03-10T12:00:00.000+01:00
#EXTINF:6.0,
a.ts
#EXTINF:6.0,
b.ts
";
        let snapshot = ManifestParser::lenient().parse(text, None).unwrap();
        let expected: DateTime<Utc> = Utc.with_ymd_and_hms(2016, 3, 10, 11, 0, 0).unwrap();
        assert_eq!(snapshot.segments[0].program_date_time, Some(expected));
        assert_eq!(snapshot.segments[1].program_date_time, None);
    }

    #[test]
    fn segment_without_location_is_malformed() {
        let text = "#EXTM3U
#EXT-X-TARGETDURATION:8
#EXT-X-MEDIA-SEQUENCE:100
#EXTINF:8.0,
100.ts
#EXTINF:8.0,

#EXTINF:8.0,
102.ts
";
        for parser in [ManifestParser::lenient(), ManifestParser::strict()] {
            let err = parser.parse(text, None).unwrap_err();
            assert!(err.is_malformed(), "{err}");
        }
    }

    #[test]
    fn rejects_variant_manifest() {
        let text = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=500000
1502.m3u8
";
        let err = ManifestParser::lenient().parse(text, None).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn rejects_invalid_utf8() {
        let err = ManifestParser::lenient()
            .parse_bytes(&[0x23, 0xff, 0xfe], None)
            .unwrap_err();
        assert!(err.is_malformed());
    }
}
