// WHY: Read-only search structure built once per loaded timeline and queried on
// every playback tick; lookups must stay logarithmic

use crate::timeline::{CurrentPosition, ReadingTimeline, WordTimelineEntry};

/// Time-ordered word entries answering "which word is active at time T"
#[derive(Debug, Clone, Default)]
pub struct TimelineIndex {
    entries: Vec<WordTimelineEntry>,
}

impl TimelineIndex {
    /// Build from entries already ordered by start time
    pub fn new(entries: Vec<WordTimelineEntry>) -> Self {
        Self { entries }
    }

    pub fn from_timeline(timeline: &ReadingTimeline) -> Self {
        Self::new(timeline.word_timeline.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<&WordTimelineEntry> {
        self.entries.get(index)
    }

    /// End of the last word, 0 when empty
    pub fn total_duration(&self) -> u64 {
        self.entries.last().map_or(0, |e| e.end_time)
    }

    /// Position of the word being spoken at `time_ms`
    ///
    /// During silence between words the previous word stays current. Times before
    /// the first word or after the last one yield `None`.
    pub fn locate(&self, time_ms: u64) -> Option<CurrentPosition> {
        self.locate_entry(time_ms).map(WordTimelineEntry::position)
    }

    /// Index of the entry active at `time_ms`
    pub fn locate_index(&self, time_ms: u64) -> Option<usize> {
        let last = self.entries.last()?;
        if time_ms > last.end_time {
            return None;
        }

        // Interval hit
        let mut left = 0;
        let mut right = self.entries.len();
        while left < right {
            let mid = left + (right - left) / 2;
            let entry = &self.entries[mid];
            if entry.contains(time_ms) {
                return Some(mid);
            }
            if time_ms < entry.start_time {
                right = mid;
            } else {
                left = mid + 1;
            }
        }

        // Gap: hold the most recently started word
        let started = self.entries.partition_point(|e| e.start_time <= time_ms);
        started.checked_sub(1)
    }

    pub fn locate_entry(&self, time_ms: u64) -> Option<&WordTimelineEntry> {
        self.locate_index(time_ms).map(|i| &self.entries[i])
    }
}
