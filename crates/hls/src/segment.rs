use chrono::{DateTime, TimeDelta, Utc};
use url::Url;

use crate::ManifestError;

/// One addressable chunk of a broadcast, as listed by a media manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Location as written in the manifest, possibly relative.
    pub uri: String,
    /// Duration in seconds.
    pub duration: f64,
    /// Absolute timestamp from `#EXT-X-PROGRAM-DATE-TIME`, if the manifest tagged this segment.
    pub program_date_time: Option<DateTime<Utc>>,
    /// Media sequence number, present when the manifest declared a media-sequence base.
    pub sequence: Option<u64>,
}

impl Segment {
    pub fn new(uri: impl Into<String>, duration: f64) -> Self {
        Self {
            uri: uri.into(),
            duration,
            program_date_time: None,
            sequence: None,
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = Some(sequence);
        self
    }

    pub fn with_program_date_time(mut self, program_date_time: DateTime<Utc>) -> Self {
        self.program_date_time = Some(program_date_time);
        self
    }

    /// Duration as a calendar delta, rounded to microseconds.
    pub fn time_delta(&self) -> TimeDelta {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return TimeDelta::zero();
        }
        TimeDelta::microseconds((self.duration * 1_000_000.0).round() as i64)
    }

    /// Resolves the segment location against the URL of the manifest that listed it.
    pub fn absolute_url(&self, base: &Url) -> Result<Url, ManifestError> {
        base.join(self.uri.trim())
            .map_err(|e| ManifestError::invalid_uri(self.uri.clone(), e.to_string()))
    }
}
