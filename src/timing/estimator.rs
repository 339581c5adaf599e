// WHY: Synthetic timing for content prepared without a narration alignment
// Same forward cursor as the reconciler, driven by computed durations

use super::{WordClock, WordSpan};
use crate::config::EstimatorConfig;

/// Assigns heuristic word durations with fixed word/sentence/paragraph gaps
///
/// Gaps stack: the last word of a sentence is followed by the word gap plus the
/// sentence gap, and a paragraph break adds the paragraph gap on top of both.
#[derive(Debug, Clone)]
pub struct TimingEstimator {
    config: EstimatorConfig,
    cursor_ms: u64,
    /// Silence inserted before the next word; zero before the first one
    pending_gap_ms: u64,
}

impl TimingEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self {
            config,
            cursor_ms: 0,
            pending_gap_ms: 0,
        }
    }

    /// Estimated spoken duration of a word
    pub fn word_duration(&self, word: &str) -> u64 {
        let length = word.chars().count() as u64;
        let bonus = (length * self.config.per_char_bonus_ms).min(self.config.max_length_bonus_ms);
        self.config.base_word_ms + bonus
    }
}

impl Default for TimingEstimator {
    fn default() -> Self {
        Self::new(EstimatorConfig::default())
    }
}

impl WordClock for TimingEstimator {
    fn next_word(&mut self, word: &str) -> WordSpan {
        let start_ms = self.cursor_ms + self.pending_gap_ms;
        let end_ms = start_ms + self.word_duration(word);
        self.cursor_ms = end_ms;
        self.pending_gap_ms = self.config.word_gap_ms;
        WordSpan { start_ms, end_ms }
    }

    fn end_sentence(&mut self) {
        self.pending_gap_ms += self.config.sentence_gap_ms;
    }

    fn end_paragraph(&mut self) {
        self.pending_gap_ms += self.config.paragraph_gap_ms;
    }

    fn total_duration(&self, last_word_end: Option<u64>) -> u64 {
        last_word_end.unwrap_or(0)
    }
}
