// WHY: Every tunable constant of generation and playback in one serializable place
// so the CLI can print the effective configuration and tests can pin it

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::timing::{CharacterAlignment, TimingSource};

/// Voice recorded in metadata for estimated timelines
pub const PLACEHOLDER_VOICE_ID: &str = "placeholder";

/// Narration voice used when the caller does not name one
pub const DEFAULT_NARRATION_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

/// Constants for synthetic word timing
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EstimatorConfig {
    /// Base duration of every word
    pub base_word_ms: u64,
    /// Extra duration per character of the word
    pub per_char_bonus_ms: u64,
    /// Upper bound on the per-character bonus
    pub max_length_bonus_ms: u64,
    /// Silence between words of one sentence
    pub word_gap_ms: u64,
    /// Silence between sentences of one paragraph
    pub sentence_gap_ms: u64,
    /// Silence between paragraphs
    pub paragraph_gap_ms: u64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            // WHY: ~150 words per minute narration pace
            base_word_ms: 350,
            per_char_bonus_ms: 20,
            max_length_bonus_ms: 200,
            word_gap_ms: 80,
            sentence_gap_ms: 300,
            paragraph_gap_ms: 600,
        }
    }
}

/// Offline generation settings
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationConfig {
    /// Voice id written to metadata; falls back per timing source when unset
    pub voice_id: Option<String>,
    pub estimator: EstimatorConfig,
}

impl GenerationConfig {
    /// Voice id for a timeline produced with or without a character alignment
    pub fn resolve_voice_id(&self, has_alignment: bool) -> String {
        match (&self.voice_id, has_alignment) {
            (Some(voice_id), _) => voice_id.clone(),
            (None, true) => DEFAULT_NARRATION_VOICE_ID.to_string(),
            (None, false) => PLACEHOLDER_VOICE_ID.to_string(),
        }
    }

    /// Exact timing when an alignment is available, otherwise the configured estimator
    pub fn timing_source(&self, alignment: Option<CharacterAlignment>) -> TimingSource {
        match alignment {
            Some(alignment) => TimingSource::Alignment(alignment),
            None => TimingSource::Estimated(self.estimator.clone()),
        }
    }
}

/// How the tracker learns about playback position
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClockMode {
    /// Pick from the device's capabilities at load time
    Auto,
    /// Device pushes status updates
    Callbacks,
    /// Poll the device on a fixed interval
    Polling,
}

/// Runtime playback settings
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlaybackConfig {
    pub poll_interval_ms: u64,
    pub default_skip_seconds: u64,
    pub clock_mode: ClockMode,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            // WHY: 20Hz keeps word highlighting visually in step with speech
            poll_interval_ms: 50,
            default_skip_seconds: 10,
            clock_mode: ClockMode::Auto,
        }
    }
}

impl PlaybackConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
