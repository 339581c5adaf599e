// WHY: Effectful side of playback: owns the device and the clock for one reader view
// and publishes every position update to watchers

use anyhow::{bail, Context, Result};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::clock::{ClockKind, ClockSource};
use super::device::{AudioSource, PlaybackDevice};
use super::{PlaybackState, PositionTracker, PositionUpdate};
use crate::config::PlaybackConfig;
use crate::timeline::ReadingTimeline;

/// One playback session over a loaded reading timeline
pub struct PlaybackSession<D: PlaybackDevice> {
    device: D,
    tracker: PositionTracker,
    config: PlaybackConfig,
    clock: Option<ClockSource>,
    updates: watch::Sender<Option<PositionUpdate>>,
}

impl<D: PlaybackDevice> PlaybackSession<D> {
    pub fn new(device: D, timeline: &ReadingTimeline, config: PlaybackConfig) -> Self {
        let (updates, _) = watch::channel(None);
        Self {
            device,
            tracker: PositionTracker::new(timeline),
            config,
            clock: None,
            updates,
        }
    }

    /// Receiver of published updates; compare successive values to detect changes
    pub fn subscribe(&self) -> watch::Receiver<Option<PositionUpdate>> {
        self.updates.subscribe()
    }

    pub fn state(&self) -> PlaybackState {
        self.tracker.state()
    }

    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }

    pub fn clock_kind(&self) -> Option<ClockKind> {
        self.clock.as_ref().map(ClockSource::kind)
    }

    /// Load audio and select the clock source; on failure the session returns to idle
    pub async fn load(&mut self, source: &AudioSource) -> Result<()> {
        self.tracker.begin_load()?;
        info!(?source, "Loading narration audio");

        match self.device.load(source).await {
            Ok(()) => {
                self.clock = Some(ClockSource::select(&mut self.device, &self.config));
                self.tracker.load_succeeded()?;
                Ok(())
            }
            Err(e) => {
                warn!("Audio load failed: {:#}", e);
                self.tracker.load_failed()?;
                Err(e).context("Failed to load narration audio")
            }
        }
    }

    pub async fn play(&mut self) -> Result<()> {
        if self.tracker.state() == PlaybackState::Finished {
            // Replay from the start, or from wherever the caller seeked after finishing
            self.device.seek(self.tracker.elapsed_ms()).await?;
        }
        self.device.play().await?;
        self.tracker.play()?;
        self.resync_clock();
        if let Some(clock) = self.clock.as_mut() {
            clock.restart();
        }
        Ok(())
    }

    pub async fn pause(&mut self) -> Result<()> {
        self.device.pause().await?;
        self.resync_clock();
        self.tracker.pause()
    }

    /// Seek to `time_ms` clamped to the media bounds; returns the target used
    pub async fn seek(&mut self, time_ms: u64) -> Result<u64> {
        let target = self.tracker.seek_target(time_ms);
        if matches!(self.tracker.state(), PlaybackState::Idle | PlaybackState::Loading) {
            debug!(target, "Seek ignored, no audio loaded");
            return Ok(target);
        }

        self.device.seek(target).await?;
        self.resync_clock();

        // WHY: polling reports nothing until the next tick, and a paused or finished session
        // reads no reports at all; the target also becomes the resume point for play
        if self.clock_kind() == Some(ClockKind::Polling) || self.tracker.state() != PlaybackState::Playing {
            let update = self.tracker.apply_position(target);
            self.updates.send_replace(Some(update));
        }
        Ok(target)
    }

    /// Forget device reports that predate the last command
    fn resync_clock(&mut self) {
        if let Some(clock) = self.clock.as_mut() {
            let dropped = clock.discard_pending();
            if dropped > 0 {
                debug!(dropped, "Discarded stale device reports");
            }
        }
    }

    pub async fn skip_forward(&mut self, seconds: Option<u64>) -> Result<u64> {
        let seconds = seconds.unwrap_or(self.config.default_skip_seconds);
        let target = self.tracker.skip_forward_target(seconds);
        self.seek(target).await
    }

    pub async fn skip_backward(&mut self, seconds: Option<u64>) -> Result<u64> {
        let seconds = seconds.unwrap_or(self.config.default_skip_seconds);
        let target = self.tracker.skip_backward_target(seconds);
        self.seek(target).await
    }

    /// Wait for the next clock event and publish the resulting update
    pub async fn next_update(&mut self) -> Result<Option<PositionUpdate>> {
        let poll_device = self.tracker.state() == PlaybackState::Playing;
        let Some(clock) = self.clock.as_mut() else {
            bail!("No audio loaded");
        };

        let Some(status) = clock.next_status(&mut self.device, poll_device).await? else {
            return Ok(None);
        };

        let update = self.tracker.on_status(&status);
        if let Some(update) = update {
            self.updates.send_replace(Some(update));
        }
        Ok(update)
    }

    /// Drive updates until playback finishes or pauses, calling `on_update` for each
    pub async fn run_until_stopped<F>(&mut self, mut on_update: F) -> Result<PlaybackState>
    where
        F: FnMut(&PositionUpdate),
    {
        while self.tracker.state() == PlaybackState::Playing {
            if let Some(update) = self.next_update().await? {
                on_update(&update);
            }
        }
        Ok(self.tracker.state())
    }

    /// End the session: stop the clock, unload the device, clear published state
    pub async fn close(mut self) -> Result<()> {
        self.clock = None;
        self.tracker.unload();
        self.updates.send_replace(None);
        self.device.unload().await?;
        info!("Playback session closed");
        Ok(())
    }
}
