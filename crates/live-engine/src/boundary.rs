//! Trailing-edge detection between already-known and new segments.
//!
//! A live manifest is a sliding window: each revision repeats some of the
//! segments of the previous one and appends new ones. Which listed segments
//! are new depends on how the manifest identifies them, and that scheme is
//! fixed for a stream once it is first observed.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use hls::{ManifestSnapshot, Segment};
use tracing::{debug, warn};

/// The identification scheme a stream was found to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    /// Segments are numbered from an explicit `#EXT-X-MEDIA-SEQUENCE` base.
    Sequence,
    /// Segments are placed on a timeline by `#EXT-X-PROGRAM-DATE-TIME`.
    Timestamp,
    /// Nothing identifies segments across revisions.
    Unidentified,
}

impl fmt::Display for BoundaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sequence => "sequence",
            Self::Timestamp => "timestamp",
            Self::Unidentified => "unidentified",
        };
        f.write_str(name)
    }
}

/// Start and length of the most recently accepted segment on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TimedEdge {
    start: DateTime<Utc>,
    duration: TimeDelta,
}

impl TimedEdge {
    /// Starts at or before this instant belong to already-known segments:
    /// half a segment before the end of the last known one, to absorb
    /// re-stamped windows.
    fn threshold(&self) -> DateTime<Utc> {
        self.start + self.duration - self.duration / 2
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BoundaryDetector {
    Sequence { last_accepted: Option<u64> },
    Timestamp { edge: Option<TimedEdge> },
    Unidentified,
}

impl BoundaryDetector {
    /// Picks the scheme for a stream from its first snapshot that has a shape.
    ///
    /// A single `#EXT-X-PROGRAM-DATE-TIME` anywhere in the window places every
    /// segment on the timeline.
    pub(crate) fn select(snapshot: &ManifestSnapshot) -> Option<Self> {
        if !snapshot.has_shape() {
            return None;
        }
        let detector = if snapshot.explicit_media_sequence {
            Self::Sequence {
                last_accepted: None,
            }
        } else if snapshot
            .segments
            .iter()
            .any(|s| s.program_date_time.is_some())
        {
            Self::Timestamp { edge: None }
        } else {
            Self::Unidentified
        };
        debug!(kind = %detector.kind(), "Selected segment boundary detection");
        Some(detector)
    }

    pub(crate) fn kind(&self) -> BoundaryKind {
        match self {
            Self::Sequence { .. } => BoundaryKind::Sequence,
            Self::Timestamp { .. } => BoundaryKind::Timestamp,
            Self::Unidentified => BoundaryKind::Unidentified,
        }
    }

    /// Returns the segments of `snapshot` past the trailing edge, in manifest
    /// order, and advances the edge over them.
    ///
    /// `has_known` tells whether the stream holds any pending or delivered segment.
    pub(crate) fn split_new(&mut self, snapshot: &ManifestSnapshot, has_known: bool) -> Vec<Segment> {
        match self {
            Self::Sequence { last_accepted } => Self::split_by_sequence(last_accepted, snapshot),
            Self::Timestamp { edge } => Self::split_by_timestamp(edge, snapshot),
            Self::Unidentified => {
                if has_known {
                    if !snapshot.is_empty() {
                        warn!(
                            listed = snapshot.len(),
                            "Manifest segments carry no sequence or timestamp, ignoring revision"
                        );
                    }
                    Vec::new()
                } else {
                    snapshot.segments.clone()
                }
            }
        }
    }

    fn split_by_sequence(last_accepted: &mut Option<u64>, snapshot: &ManifestSnapshot) -> Vec<Segment> {
        let mut fresh = Vec::new();
        for (index, segment) in snapshot.segments.iter().enumerate() {
            // Segments keep the number the parser gave them even when the
            // window has holes; a snapshot without a declared base falls back
            // to its position.
            let sequence = segment
                .sequence
                .unwrap_or_else(|| snapshot.sequence_at(index));
            if last_accepted.is_some_and(|last| sequence <= last) {
                continue;
            }
            *last_accepted = Some(sequence);
            fresh.push(segment.clone());
        }
        fresh
    }

    fn split_by_timestamp(edge: &mut Option<TimedEdge>, snapshot: &ManifestSnapshot) -> Vec<Segment> {
        let mut fresh = Vec::new();
        for (segment, start) in snapshot.segments.iter().zip(segment_starts(snapshot)) {
            let Some(start) = start else {
                warn!(uri = %segment.uri, "Skipping segment without a computable start time");
                continue;
            };
            if edge.is_some_and(|e| start <= e.threshold()) {
                continue;
            }
            *edge = Some(TimedEdge {
                start,
                duration: segment.time_delta(),
            });
            fresh.push(segment.clone().with_program_date_time(start));
        }
        fresh
    }
}

/// Start time of every listed segment.
///
/// Untagged segments are placed right after the previous one, or right before
/// the next one when no tagged segment precedes them. All starts are `None`
/// when nothing in the snapshot is tagged.
fn segment_starts(snapshot: &ManifestSnapshot) -> Vec<Option<DateTime<Utc>>> {
    let segments = &snapshot.segments;
    let mut starts: Vec<Option<DateTime<Utc>>> = Vec::with_capacity(segments.len());
    for (index, segment) in segments.iter().enumerate() {
        let extrapolated = index
            .checked_sub(1)
            .and_then(|prev| starts[prev].map(|start| start + segments[prev].time_delta()));
        starts.push(segment.program_date_time.or(extrapolated));
    }

    if let Some(first_known) = starts.iter().position(Option::is_some) {
        for index in (0..first_known).rev() {
            starts[index] = starts[index + 1].map(|next| next - segments[index].time_delta());
        }
    }
    starts
}
