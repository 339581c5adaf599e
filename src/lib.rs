pub mod config;
pub mod index;
pub mod segmenter;
pub mod timeline;
pub mod timing;
pub mod tracker;

// Re-export main types for convenient access
pub use timeline::{
    CurrentPosition, Paragraph, ReadingTimeline, Sentence, TimelineMetadata, Word, WordTimelineEntry,
};

pub use segmenter::{segment, SegmentedText, Segmenter};

pub use timing::{build_timeline, CharacterAlignment, TimingSource};

pub use index::TimelineIndex;

pub use tracker::{PlaybackSession, PlaybackState, PositionTracker, PositionUpdate};
