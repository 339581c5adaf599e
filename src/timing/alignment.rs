// WHY: Narration services report per-character timings in seconds; everything
// downstream works in whole milliseconds, so conversion and sanitizing happen once here

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Per-character timing as returned by the narration service
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CharacterAlignment {
    pub characters: Vec<String>,
    pub character_start_times_seconds: Vec<f64>,
    pub character_end_times_seconds: Vec<f64>,
}

/// Full narration response document: audio plus alignment
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NarrationResponse {
    pub audio_base64: String,
    pub alignment: CharacterAlignment,
    #[serde(default)]
    pub normalized_alignment: Option<CharacterAlignment>,
}

impl NarrationResponse {
    /// Raw alignment, or the normalized one when the raw alignment is empty
    pub fn best_alignment(&self) -> &CharacterAlignment {
        match &self.normalized_alignment {
            Some(normalized) if self.alignment.is_empty() => normalized,
            _ => &self.alignment,
        }
    }
}

/// One aligned character with millisecond bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharTiming {
    pub ch: char,
    pub start_ms: u64,
    pub end_ms: u64,
}

impl CharacterAlignment {
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Convert to millisecond timings
    /// WHY: mismatched array lengths are normal for real TTS output; truncate instead of failing
    pub fn to_char_timings(&self) -> Vec<CharTiming> {
        let usable = self
            .characters
            .len()
            .min(self.character_start_times_seconds.len())
            .min(self.character_end_times_seconds.len());

        if usable != self.characters.len()
            || usable != self.character_start_times_seconds.len()
            || usable != self.character_end_times_seconds.len()
        {
            warn!(
                characters = self.characters.len(),
                starts = self.character_start_times_seconds.len(),
                ends = self.character_end_times_seconds.len(),
                "Alignment arrays differ in length, truncating to {}",
                usable
            );
        }

        (0..usable)
            .map(|i| {
                let start_ms = seconds_to_ms(self.character_start_times_seconds[i]);
                let end_ms = seconds_to_ms(self.character_end_times_seconds[i]).max(start_ms);
                CharTiming {
                    // Empty entries behave like whitespace and are skipped by the reconciler
                    ch: self.characters[i].chars().next().unwrap_or(' '),
                    start_ms,
                    end_ms,
                }
            })
            .collect()
    }
}

/// Round seconds to whole milliseconds, clamping garbage to zero
pub fn seconds_to_ms(seconds: f64) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds * 1000.0).round() as u64
}
