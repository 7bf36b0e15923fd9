use std::collections::VecDeque;

use hls::{ManifestSnapshot, Segment};
use tracing::{debug, info};

use crate::LiveError;
use crate::boundary::{BoundaryDetector, BoundaryKind};

pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Running state of one followed broadcast.
///
/// Each fetched revision of the manifest is merged with [`LiveStream::update`];
/// segments that were not seen before are queued and handed out in order by
/// [`LiveStream::pop`]. A segment is never handed out twice, even when later
/// revisions still list it.
#[derive(Debug, Clone)]
pub struct LiveStream {
    pending: VecDeque<Segment>,
    history: VecDeque<Segment>,
    history_capacity: usize,
    ended: bool,
    detector: Option<BoundaryDetector>,
}

impl Default for LiveStream {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveStream {
    pub fn new() -> Self {
        Self::with_history_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// A capacity of zero is raised to one: the last delivered segment is always kept.
    pub fn with_history_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            pending: VecDeque::new(),
            history: VecDeque::with_capacity(capacity),
            history_capacity: capacity,
            ended: false,
            detector: None,
        }
    }

    /// Merges a freshly fetched manifest revision and returns how many segments it added.
    pub fn update(&mut self, snapshot: &ManifestSnapshot) -> Result<usize, LiveError> {
        if self.ended {
            return Err(LiveError::StreamAlreadyEnded);
        }

        if self.detector.is_none() {
            self.detector = BoundaryDetector::select(snapshot);
        }

        let has_known = !self.pending.is_empty() || !self.history.is_empty();
        let fresh = match self.detector.as_mut() {
            Some(detector) => detector.split_new(snapshot, has_known),
            None => Vec::new(),
        };

        let added = fresh.len();
        if added > 0 {
            debug!(
                added,
                first = fresh.first().map(|s| s.uri.as_str()),
                "Queued new segments"
            );
        }
        self.pending.extend(fresh);

        if snapshot.end_of_stream {
            info!(pending = self.pending.len(), "Manifest signalled end of stream");
            self.ended = true;
        }
        Ok(added)
    }

    /// Takes the next segment to deliver.
    pub fn pop(&mut self) -> Option<Segment> {
        let segment = self.pending.pop_front()?;
        if self.history.len() == self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(segment.clone());
        Some(segment)
    }

    pub fn last_delivered(&self) -> Option<&Segment> {
        self.history.back()
    }

    /// Recently delivered segments, oldest first.
    pub fn delivered_history(&self) -> impl Iterator<Item = &Segment> {
        self.history.iter()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// The identification scheme in use, once a revision with a shape was merged.
    pub fn boundary_kind(&self) -> Option<BoundaryKind> {
        self.detector.as_ref().map(BoundaryDetector::kind)
    }
}
