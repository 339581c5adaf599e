// WHY: Pure playback state machine kept apart from the async session so every
// transition and position publication can be tested without a device or a clock

pub mod clock;
pub mod device;
pub mod session;

pub use clock::{ClockKind, ClockSource};
pub use device::{AudioSource, PlaybackDevice, PlaybackStatus, SimulatedDevice};
pub use session::PlaybackSession;

use anyhow::{bail, Result};
use serde::Serialize;
use tracing::debug;

use crate::index::TimelineIndex;
use crate::timeline::{CurrentPosition, ReadingTimeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// No audio loaded
    Idle,
    Loading,
    ReadyPaused,
    Playing,
    Finished,
}

/// What highlighting and auto-scroll consumers receive on every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionUpdate {
    pub elapsed_ms: u64,
    pub duration_ms: u64,
    pub position: Option<CurrentPosition>,
    /// True when `position` differs from the previous publication
    pub changed: bool,
    pub state: PlaybackState,
}

/// Tracks playback state and the active word for one reading session
#[derive(Debug)]
pub struct PositionTracker {
    index: TimelineIndex,
    state: PlaybackState,
    duration_ms: u64,
    elapsed_ms: u64,
    position: Option<CurrentPosition>,
}

impl PositionTracker {
    pub fn new(timeline: &ReadingTimeline) -> Self {
        Self::with_index(TimelineIndex::from_timeline(timeline), timeline.total_duration)
    }

    /// `duration_ms` is used until the device reports a real media duration
    pub fn with_index(index: TimelineIndex, duration_ms: u64) -> Self {
        Self {
            index,
            state: PlaybackState::Idle,
            duration_ms,
            elapsed_ms: 0,
            position: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn position(&self) -> Option<CurrentPosition> {
        self.position
    }

    pub fn index(&self) -> &TimelineIndex {
        &self.index
    }

    pub fn begin_load(&mut self) -> Result<()> {
        self.transition(PlaybackState::Loading)
    }

    pub fn load_succeeded(&mut self) -> Result<()> {
        self.transition(PlaybackState::ReadyPaused)
    }

    /// Failed loads return to idle so the caller can retry
    pub fn load_failed(&mut self) -> Result<()> {
        self.transition(PlaybackState::Idle)
    }

    pub fn play(&mut self) -> Result<()> {
        if self.state == PlaybackState::Playing {
            return Ok(());
        }
        self.transition(PlaybackState::Playing)
    }

    pub fn pause(&mut self) -> Result<()> {
        if self.state == PlaybackState::ReadyPaused {
            return Ok(());
        }
        self.transition(PlaybackState::ReadyPaused)
    }

    /// Drop back to idle, forgetting all session state
    pub fn unload(&mut self) {
        self.state = PlaybackState::Idle;
        self.elapsed_ms = 0;
        self.position = None;
    }

    fn transition(&mut self, to: PlaybackState) -> Result<()> {
        use PlaybackState::*;

        let allowed = matches!(
            (self.state, to),
            (Idle, Loading)
                | (Loading, ReadyPaused)
                | (Loading, Idle)
                | (ReadyPaused, Playing)
                | (Playing, ReadyPaused)
                | (Playing, Finished)
                | (Finished, Playing)
                | (Finished, ReadyPaused)
        );
        if !allowed {
            bail!("Invalid playback transition {:?} -> {:?}", self.state, to);
        }
        debug!(from = ?self.state, to = ?to, "Playback state transition");
        self.state = to;
        Ok(())
    }

    /// Clamp a requested time to the media bounds
    pub fn seek_target(&self, time_ms: u64) -> u64 {
        time_ms.min(self.duration_ms)
    }

    pub fn skip_forward_target(&self, seconds: u64) -> u64 {
        self.seek_target(self.elapsed_ms.saturating_add(seconds.saturating_mul(1000)))
    }

    pub fn skip_backward_target(&self, seconds: u64) -> u64 {
        self.elapsed_ms.saturating_sub(seconds.saturating_mul(1000))
    }

    /// Record a clock reading and look up the active word
    pub fn apply_position(&mut self, time_ms: u64) -> PositionUpdate {
        self.elapsed_ms = time_ms;
        let position = self.index.locate(time_ms);
        self.publish(position)
    }

    /// Fold a device status report into the tracker
    /// WHY: the device is the source of truth for play/pause and media duration
    pub fn on_status(&mut self, status: &PlaybackStatus) -> Option<PositionUpdate> {
        if !status.is_loaded || matches!(self.state, PlaybackState::Idle | PlaybackState::Loading) {
            return None;
        }

        if let Some(duration) = status.duration_ms.filter(|&d| d > 0) {
            self.duration_ms = duration;
        }

        if status.did_finish {
            if self.state != PlaybackState::Finished {
                self.state = PlaybackState::Finished;
                debug!("Playback finished");
            }
            self.elapsed_ms = 0;
            return Some(self.publish(None));
        }

        match (status.is_playing, self.state) {
            (true, PlaybackState::ReadyPaused | PlaybackState::Finished) => {
                self.state = PlaybackState::Playing;
            }
            (false, PlaybackState::Playing) => self.state = PlaybackState::ReadyPaused,
            _ => {}
        }

        Some(self.apply_position(status.position_ms))
    }

    fn publish(&mut self, position: Option<CurrentPosition>) -> PositionUpdate {
        let changed = position != self.position;
        self.position = position;
        PositionUpdate {
            elapsed_ms: self.elapsed_ms,
            duration_ms: self.duration_ms,
            position,
            changed,
            state: self.state,
        }
    }
}
