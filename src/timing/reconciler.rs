// WHY: Walks the character alignment and the word tree in lockstep with one cursor
// that never rewinds, so word timings come out in reading order by construction

use super::{CharTiming, WordClock, WordSpan};

/// Punctuation that shares the timing span of the word before it
pub const TRAILING_PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', ';', ':', '\'', '"', ')', ']', '}', '\u{201D}', '\u{2019}',
];

/// Characters that count toward a word's core length
pub fn is_core_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '\'' | '\u{2019}' | '-')
}

/// Number of core characters in a word (punctuation stripped)
pub fn core_len(word: &str) -> usize {
    word.chars().filter(|&c| is_core_char(c)).count()
}

/// Assigns exact word timings from observed per-character timings
#[derive(Debug, Clone)]
pub struct TimingReconciler {
    chars: Vec<CharTiming>,
    cursor: usize,
    /// End of the last placed word; later words never start before it
    floor_ms: u64,
}

impl TimingReconciler {
    pub fn new(chars: Vec<CharTiming>) -> Self {
        Self { chars, cursor: 0, floor_ms: 0 }
    }

    /// Characters not yet consumed by any word
    pub fn remaining(&self) -> usize {
        self.chars.len() - self.cursor
    }

    fn skip_whitespace(&mut self) {
        while self.chars.get(self.cursor).is_some_and(|c| c.ch.is_whitespace()) {
            self.cursor += 1;
        }
    }
}

impl WordClock for TimingReconciler {
    fn next_word(&mut self, word: &str) -> WordSpan {
        self.skip_whitespace();

        // WHY: an exhausted alignment pins the word to the last reached time instead of failing
        let start_ms = self
            .chars
            .get(self.cursor)
            .map_or(self.floor_ms, |c| c.start_ms.max(self.floor_ms));
        let mut end_ms = start_ms;

        let target = core_len(word);
        let mut matched = 0;
        while let Some(timing) = self.chars.get(self.cursor) {
            if timing.ch.is_whitespace() {
                self.cursor += 1;
                continue;
            }

            end_ms = timing.end_ms.max(end_ms);
            self.cursor += 1;
            matched += 1;

            if matched >= target {
                while let Some(punct) = self.chars.get(self.cursor) {
                    if !TRAILING_PUNCTUATION.contains(&punct.ch) {
                        break;
                    }
                    end_ms = punct.end_ms.max(end_ms);
                    self.cursor += 1;
                }
                break;
            }
        }

        self.floor_ms = end_ms;
        WordSpan { start_ms, end_ms }
    }

    fn total_duration(&self, last_word_end: Option<u64>) -> u64 {
        let last_char_end = self.chars.last().map_or(0, |c| c.end_ms);
        last_char_end.max(last_word_end.unwrap_or(0))
    }
}
