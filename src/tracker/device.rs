// WHY: Narrow async seam to the audio player; the engine never touches decoding or output

use anyhow::{bail, Result};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Audio to load into a playback device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    File(PathBuf),
    Uri(String),
}

/// One status report from a playback device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackStatus {
    pub is_loaded: bool,
    pub is_playing: bool,
    pub position_ms: u64,
    /// Absent when the platform cannot report media length
    pub duration_ms: Option<u64>,
    /// Set once, on the report where playback reached the end
    pub did_finish: bool,
}

/// External audio player driven by a playback session
#[allow(async_fn_in_trait)]
pub trait PlaybackDevice {
    async fn load(&mut self, source: &AudioSource) -> Result<()>;

    async fn unload(&mut self) -> Result<()>;

    async fn play(&mut self) -> Result<()>;

    async fn pause(&mut self) -> Result<()>;

    async fn seek(&mut self, position_ms: u64) -> Result<()>;

    /// Query the current status
    async fn status(&mut self) -> Result<PlaybackStatus>;

    /// Channel of pushed status updates, for devices whose callbacks are reliable
    ///
    /// Devices push a report only when the status changed, so a paused device
    /// leaves the channel quiet.
    fn subscribe(&mut self) -> Option<mpsc::UnboundedReceiver<PlaybackStatus>> {
        None
    }
}

#[derive(Debug)]
struct SimState {
    duration_ms: u64,
    speed: f64,
    loaded: bool,
    playing: bool,
    anchor_position_ms: u64,
    anchor_at: Instant,
    finish_pending: bool,
    failed_loads_remaining: u32,
}

impl SimState {
    fn position_at(&self, now: Instant) -> u64 {
        if !self.playing {
            return self.anchor_position_ms;
        }
        let elapsed = now.saturating_duration_since(self.anchor_at).as_secs_f64() * 1000.0 * self.speed;
        (self.anchor_position_ms + elapsed.round() as u64).min(self.duration_ms)
    }

    fn reanchor(&mut self, position_ms: u64) {
        self.anchor_position_ms = position_ms.min(self.duration_ms);
        self.anchor_at = Instant::now();
    }

    fn snapshot(&mut self) -> PlaybackStatus {
        let now = Instant::now();
        let position_ms = self.position_at(now);
        if self.playing && position_ms >= self.duration_ms {
            self.playing = false;
            self.anchor_position_ms = self.duration_ms;
            self.anchor_at = now;
            self.finish_pending = true;
        }

        let did_finish = std::mem::take(&mut self.finish_pending);
        PlaybackStatus {
            is_loaded: self.loaded,
            is_playing: self.playing,
            position_ms,
            duration_ms: self.loaded.then_some(self.duration_ms),
            did_finish,
        }
    }
}

/// Wall-clock driven stand-in for a real audio player
#[derive(Debug)]
pub struct SimulatedDevice {
    state: Arc<Mutex<SimState>>,
    push_interval: Option<Duration>,
    pusher: Option<JoinHandle<()>>,
}

impl SimulatedDevice {
    /// Device playing `duration_ms` of silent media at `speed`× real time
    pub fn new(duration_ms: u64, speed: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                duration_ms,
                speed: if speed.is_finite() && speed > 0.0 { speed } else { 1.0 },
                loaded: false,
                playing: false,
                anchor_position_ms: 0,
                anchor_at: Instant::now(),
                finish_pending: false,
                failed_loads_remaining: 0,
            })),
            push_interval: None,
            pusher: None,
        }
    }

    /// Push status updates on `interval` instead of relying on polling
    pub fn with_callbacks(mut self, interval: Duration) -> Self {
        self.push_interval = Some(interval);
        self
    }

    /// Fail the next `count` load attempts
    pub fn failing_loads(self, count: u32) -> Self {
        self.with_state(|s| s.failed_loads_remaining = count);
        self
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut SimState) -> T) -> T {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    fn stop_pusher(&mut self) {
        if let Some(pusher) = self.pusher.take() {
            pusher.abort();
        }
    }
}

impl PlaybackDevice for SimulatedDevice {
    async fn load(&mut self, source: &AudioSource) -> Result<()> {
        let failed = self.with_state(|s| {
            if s.failed_loads_remaining > 0 {
                s.failed_loads_remaining -= 1;
                return true;
            }
            s.loaded = true;
            s.playing = false;
            s.reanchor(0);
            false
        });
        if failed {
            bail!("Simulated device could not load {:?}", source);
        }
        info!(?source, "Simulated device loaded audio");
        Ok(())
    }

    async fn unload(&mut self) -> Result<()> {
        self.stop_pusher();
        self.with_state(|s| {
            s.loaded = false;
            s.playing = false;
        });
        Ok(())
    }

    async fn play(&mut self) -> Result<()> {
        self.with_state(|s| {
            if !s.loaded {
                bail!("Cannot play: no audio loaded");
            }
            let position = s.position_at(Instant::now());
            s.playing = true;
            s.reanchor(position);
            Ok(())
        })
    }

    async fn pause(&mut self) -> Result<()> {
        self.with_state(|s| {
            let position = s.position_at(Instant::now());
            s.playing = false;
            s.reanchor(position);
        });
        Ok(())
    }

    async fn seek(&mut self, position_ms: u64) -> Result<()> {
        self.with_state(|s| s.reanchor(position_ms));
        Ok(())
    }

    async fn status(&mut self) -> Result<PlaybackStatus> {
        Ok(self.with_state(SimState::snapshot))
    }

    fn subscribe(&mut self) -> Option<mpsc::UnboundedReceiver<PlaybackStatus>> {
        let interval = self.push_interval?;
        self.stop_pusher();

        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::clone(&self.state);
        self.pusher = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut last_sent = None;
            loop {
                ticker.tick().await;
                if !push_changed_status(&state, &tx, &mut last_sent) {
                    debug!("Status subscriber dropped, stopping simulated callbacks");
                    break;
                }
            }
        }));
        Some(rx)
    }
}

/// Send the current status if it differs from the last one sent; false once the receiver is gone
/// WHY: sent under the state lock so no report can predate a play/pause/seek that already returned
fn push_changed_status(
    state: &Mutex<SimState>,
    tx: &mpsc::UnboundedSender<PlaybackStatus>,
    last_sent: &mut Option<PlaybackStatus>,
) -> bool {
    let mut guard = match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    let status = guard.snapshot();
    if *last_sent == Some(status) {
        return !tx.is_closed();
    }
    *last_sent = Some(status);
    tx.send(status).is_ok()
}

impl Drop for SimulatedDevice {
    fn drop(&mut self) {
        self.stop_pusher();
    }
}
