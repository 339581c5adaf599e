// WHY: Reading timeline document shared by the offline generator and the runtime reader
// The JSON shape here is the wire contract; field names must stay camelCase

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// Longest title kept verbatim before truncation
const TITLE_MAX_CHARS: usize = 50;

/// Leaf timing unit, times in whole milliseconds
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub text: String,
    pub start_time: u64,
    pub end_time: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Sentence {
    pub text: String,
    pub start_time: u64,
    pub end_time: u64,
    pub words: Vec<Word>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    pub text: String,
    pub start_time: u64,
    pub end_time: u64,
    pub sentences: Vec<Sentence>,
}

/// Flat pointer back into the paragraph tree, one per word
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WordTimelineEntry {
    pub start_time: u64,
    pub end_time: u64,
    pub paragraph_index: usize,
    pub sentence_index: usize,
    pub word_index: usize,
}

impl WordTimelineEntry {
    pub fn contains(&self, time_ms: u64) -> bool {
        time_ms >= self.start_time && time_ms <= self.end_time
    }

    pub fn position(&self) -> CurrentPosition {
        CurrentPosition {
            paragraph_index: self.paragraph_index,
            sentence_index: self.sentence_index,
            word_index: self.word_index,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineMetadata {
    pub voice_id: String,
    /// RFC 3339 generation timestamp
    pub generated_at: String,
    pub word_count: usize,
    pub sentence_count: usize,
}

/// Coordinate of the word being spoken right now
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct CurrentPosition {
    pub paragraph_index: usize,
    pub sentence_index: usize,
    pub word_index: usize,
}

/// Generated narration timeline for one story
/// WHY: immutable once produced; readers only ever load and query it
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReadingTimeline {
    pub title: String,
    pub total_duration: u64,
    pub paragraphs: Vec<Paragraph>,
    pub word_timeline: Vec<WordTimelineEntry>,
    pub metadata: TimelineMetadata,
}

impl ReadingTimeline {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse reading timeline JSON")
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a timeline document from disk
    pub async fn load(path: &Path) -> Result<Self> {
        debug!("Loading reading timeline from {}", path.display());
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read timeline {}", path.display()))?;
        let timeline = Self::from_json(&content)
            .with_context(|| format!("Invalid timeline document {}", path.display()))?;
        info!(
            words = timeline.word_timeline.len(),
            total_duration_ms = timeline.total_duration,
            "Loaded reading timeline"
        );
        Ok(timeline)
    }

    /// Persist the timeline as pretty JSON, creating parent directories as needed
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(path, self.to_json_pretty()?)
            .await
            .with_context(|| format!("Failed to write timeline {}", path.display()))?;
        info!("Saved reading timeline to {}", path.display());
        Ok(())
    }

    /// Resolve a position back to the word it points at
    pub fn word_at(&self, position: CurrentPosition) -> Option<&Word> {
        self.paragraphs
            .get(position.paragraph_index)?
            .sentences
            .get(position.sentence_index)?
            .words
            .get(position.word_index)
    }

    pub fn sentence_count(&self) -> usize {
        self.paragraphs.iter().map(|p| p.sentences.len()).sum()
    }

    /// Check every structural invariant of the document
    /// WHY: returns all violations instead of the first so the CLI can report them together
    pub fn validate(&self) -> Vec<TimelineViolation> {
        let mut violations = Vec::new();

        for (p_idx, paragraph) in self.paragraphs.iter().enumerate() {
            match (paragraph.sentences.first(), paragraph.sentences.last()) {
                (Some(first), Some(last)) => {
                    if paragraph.start_time != first.start_time || paragraph.end_time != last.end_time {
                        violations.push(TimelineViolation::ParagraphBounds { paragraph: p_idx });
                    }
                }
                _ => violations.push(TimelineViolation::EmptyParagraph { paragraph: p_idx }),
            }

            for (s_idx, sentence) in paragraph.sentences.iter().enumerate() {
                match (sentence.words.first(), sentence.words.last()) {
                    (Some(first), Some(last)) => {
                        if sentence.start_time != first.start_time || sentence.end_time != last.end_time {
                            violations.push(TimelineViolation::SentenceBounds {
                                paragraph: p_idx,
                                sentence: s_idx,
                            });
                        }
                    }
                    _ => violations.push(TimelineViolation::EmptySentence {
                        paragraph: p_idx,
                        sentence: s_idx,
                    }),
                }

                for (w_idx, word) in sentence.words.iter().enumerate() {
                    if word.start_time > word.end_time {
                        violations.push(TimelineViolation::InvertedWord {
                            position: CurrentPosition {
                                paragraph_index: p_idx,
                                sentence_index: s_idx,
                                word_index: w_idx,
                            },
                        });
                    }
                }
            }
        }

        let mut previous: Option<&WordTimelineEntry> = None;
        for (i, entry) in self.word_timeline.iter().enumerate() {
            if let Some(prev) = previous {
                if entry.start_time < prev.end_time || entry.start_time < prev.start_time {
                    violations.push(TimelineViolation::Overlap { entry: i });
                }
            }
            match self.word_at(entry.position()) {
                Some(word) if word.start_time == entry.start_time && word.end_time == entry.end_time => {}
                Some(_) => violations.push(TimelineViolation::EntryMismatch { entry: i }),
                None => violations.push(TimelineViolation::DanglingEntry { entry: i }),
            }
            previous = Some(entry);
        }

        let word_count: usize = self
            .paragraphs
            .iter()
            .flat_map(|p| &p.sentences)
            .map(|s| s.words.len())
            .sum();
        if word_count != self.word_timeline.len() {
            violations.push(TimelineViolation::MissingEntries {
                words: word_count,
                entries: self.word_timeline.len(),
            });
        }

        let last_end = self.word_timeline.last().map_or(0, |e| e.end_time);
        if self.total_duration < last_end {
            violations.push(TimelineViolation::ShortDuration {
                total_duration: self.total_duration,
                last_word_end: last_end,
            });
        }

        if self.metadata.word_count != word_count || self.metadata.sentence_count != self.sentence_count() {
            violations.push(TimelineViolation::MetadataCounts);
        }

        violations
    }
}

/// A broken invariant found by [`ReadingTimeline::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineViolation {
    EmptyParagraph { paragraph: usize },
    EmptySentence { paragraph: usize, sentence: usize },
    ParagraphBounds { paragraph: usize },
    SentenceBounds { paragraph: usize, sentence: usize },
    InvertedWord { position: CurrentPosition },
    Overlap { entry: usize },
    EntryMismatch { entry: usize },
    DanglingEntry { entry: usize },
    MissingEntries { words: usize, entries: usize },
    ShortDuration { total_duration: u64, last_word_end: u64 },
    MetadataCounts,
}

impl std::fmt::Display for TimelineViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyParagraph { paragraph } => write!(f, "paragraph {paragraph} has no sentences"),
            Self::EmptySentence { paragraph, sentence } => {
                write!(f, "sentence {paragraph}.{sentence} has no words")
            }
            Self::ParagraphBounds { paragraph } => {
                write!(f, "paragraph {paragraph} bounds differ from its sentences")
            }
            Self::SentenceBounds { paragraph, sentence } => {
                write!(f, "sentence {paragraph}.{sentence} bounds differ from its words")
            }
            Self::InvertedWord { position } => write!(
                f,
                "word {}.{}.{} ends before it starts",
                position.paragraph_index, position.sentence_index, position.word_index
            ),
            Self::Overlap { entry } => write!(f, "timeline entry {entry} overlaps its predecessor"),
            Self::EntryMismatch { entry } => {
                write!(f, "timeline entry {entry} disagrees with its word's bounds")
            }
            Self::DanglingEntry { entry } => write!(f, "timeline entry {entry} points at no word"),
            Self::MissingEntries { words, entries } => {
                write!(f, "{words} words but {entries} timeline entries")
            }
            Self::ShortDuration { total_duration, last_word_end } => write!(
                f,
                "total duration {total_duration}ms ends before last word at {last_word_end}ms"
            ),
            Self::MetadataCounts => write!(f, "metadata counts do not match the document"),
        }
    }
}

/// Derive a display title from the first line of the story text
pub fn extract_title(text: &str) -> String {
    let first_line = text.split('\n').next().unwrap_or("").trim();
    if first_line.chars().count() <= TITLE_MAX_CHARS {
        return first_line.to_string();
    }
    let mut title: String = first_line.chars().take(TITLE_MAX_CHARS - 3).collect();
    title.push_str("...");
    title
}
