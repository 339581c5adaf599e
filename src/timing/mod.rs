// WHY: Exact and estimated timing share one tree walk so downstream consumers
// cannot tell which source produced a timeline

pub mod alignment;
pub mod estimator;
pub mod reconciler;

pub use alignment::{CharTiming, CharacterAlignment, NarrationResponse};
pub use estimator::TimingEstimator;
pub use reconciler::TimingReconciler;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::info;

use crate::config::{EstimatorConfig, GenerationConfig};
use crate::segmenter::{SegmentedText, Segmenter};
use crate::timeline::{
    extract_title, Paragraph, ReadingTimeline, Sentence, TimelineMetadata, Word, WordTimelineEntry,
};

/// Millisecond bounds assigned to one word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordSpan {
    pub start_ms: u64,
    pub end_ms: u64,
}

/// A forward-only cursor handing out word spans in reading order
pub trait WordClock {
    /// Span for the next word; never earlier than the previous span's end
    fn next_word(&mut self, word: &str) -> WordSpan;

    /// Called after the last word of every sentence
    fn end_sentence(&mut self) {}

    /// Called after the last sentence of every paragraph
    fn end_paragraph(&mut self) {}

    /// Total duration once every word has been placed
    fn total_duration(&self, last_word_end: Option<u64>) -> u64;
}

/// Where word timings come from
#[derive(Debug, Clone)]
pub enum TimingSource {
    /// Observed per-character timings from a narration service
    Alignment(CharacterAlignment),
    /// Synthetic timings from length heuristics
    Estimated(EstimatorConfig),
}

impl TimingSource {
    pub fn is_exact(&self) -> bool {
        matches!(self, TimingSource::Alignment(_))
    }
}

/// Segment text and assign timings from the given source
pub fn build_timeline(text: &str, source: &TimingSource, config: &GenerationConfig) -> ReadingTimeline {
    build_timeline_at(text, source, config, Utc::now())
}

/// Same as [`build_timeline`] with a fixed generation timestamp
pub fn build_timeline_at(
    text: &str,
    source: &TimingSource,
    config: &GenerationConfig,
    generated_at: DateTime<Utc>,
) -> ReadingTimeline {
    let segmented = Segmenter::with_default_rules().segment(text);
    let voice_id = config.resolve_voice_id(source.is_exact());

    let timeline = match source {
        TimingSource::Alignment(alignment) => {
            let mut clock = TimingReconciler::new(alignment.to_char_timings());
            assemble_timeline(text, &segmented, &mut clock, voice_id, generated_at)
        }
        TimingSource::Estimated(estimator) => {
            let mut clock = TimingEstimator::new(estimator.clone());
            assemble_timeline(text, &segmented, &mut clock, voice_id, generated_at)
        }
    };

    info!(
        exact = source.is_exact(),
        words = timeline.metadata.word_count,
        sentences = timeline.metadata.sentence_count,
        total_duration_ms = timeline.total_duration,
        "Built reading timeline"
    );
    timeline
}

/// Walk the segmented tree with a clock, deriving sentence/paragraph bounds and
/// the flat word timeline in a single pass
pub fn assemble_timeline<C: WordClock>(
    text: &str,
    segmented: &SegmentedText,
    clock: &mut C,
    voice_id: String,
    generated_at: DateTime<Utc>,
) -> ReadingTimeline {
    let mut paragraphs = Vec::with_capacity(segmented.paragraphs.len());
    let mut word_timeline = Vec::with_capacity(segmented.word_count());

    for (paragraph_index, paragraph_text) in segmented.paragraphs.iter().enumerate() {
        let mut sentences = Vec::with_capacity(paragraph_text.sentences.len());

        for (sentence_index, sentence_text) in paragraph_text.sentences.iter().enumerate() {
            let mut words = Vec::with_capacity(sentence_text.words.len());

            for (word_index, word_text) in sentence_text.words.iter().enumerate() {
                let span = clock.next_word(word_text);
                words.push(Word {
                    text: word_text.clone(),
                    start_time: span.start_ms,
                    end_time: span.end_ms,
                });
                word_timeline.push(WordTimelineEntry {
                    start_time: span.start_ms,
                    end_time: span.end_ms,
                    paragraph_index,
                    sentence_index,
                    word_index,
                });
            }

            if let (Some(first), Some(last)) = (words.first(), words.last()) {
                sentences.push(Sentence {
                    text: sentence_text.text.clone(),
                    start_time: first.start_time,
                    end_time: last.end_time,
                    words,
                });
                clock.end_sentence();
            }
        }

        if let (Some(first), Some(last)) = (sentences.first(), sentences.last()) {
            paragraphs.push(Paragraph {
                text: paragraph_text.text.clone(),
                start_time: first.start_time,
                end_time: last.end_time,
                sentences,
            });
            clock.end_paragraph();
        }
    }

    let total_duration = clock.total_duration(word_timeline.last().map(|e| e.end_time));
    let sentence_count = paragraphs.iter().map(|p| p.sentences.len()).sum();

    ReadingTimeline {
        title: extract_title(text),
        total_duration,
        metadata: TimelineMetadata {
            voice_id,
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            word_count: word_timeline.len(),
            sentence_count,
        },
        paragraphs,
        word_timeline,
    }
}
