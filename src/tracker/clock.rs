// WHY: Exactly one position source per session, chosen at load time, so pushed
// callbacks and a polling timer can never publish interleaved positions

use anyhow::{bail, Result};
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{info, warn};

use super::device::{PlaybackDevice, PlaybackStatus};
use crate::config::{ClockMode, PlaybackConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockKind {
    Callbacks,
    Polling,
}

/// Where the session's status updates come from
#[derive(Debug)]
pub enum ClockSource {
    /// Statuses pushed by the device
    Callbacks(mpsc::UnboundedReceiver<PlaybackStatus>),
    /// Fixed-interval polling; the interval is dropped with the session
    Polling(Interval),
}

impl ClockSource {
    /// Pick the clock for a freshly loaded device
    pub fn select<D: PlaybackDevice>(device: &mut D, config: &PlaybackConfig) -> Self {
        let source = match config.clock_mode {
            ClockMode::Polling => Self::polling(config),
            ClockMode::Auto | ClockMode::Callbacks => match device.subscribe() {
                Some(rx) => ClockSource::Callbacks(rx),
                None => {
                    if config.clock_mode == ClockMode::Callbacks {
                        warn!("Device has no status callbacks, falling back to polling");
                    }
                    Self::polling(config)
                }
            },
        };
        info!(kind = ?source.kind(), poll_interval_ms = config.poll_interval_ms, "Selected playback clock");
        source
    }

    pub fn polling(config: &PlaybackConfig) -> Self {
        let mut interval = tokio::time::interval(config.poll_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ClockSource::Polling(interval)
    }

    pub fn kind(&self) -> ClockKind {
        match self {
            ClockSource::Callbacks(_) => ClockKind::Callbacks,
            ClockSource::Polling(_) => ClockKind::Polling,
        }
    }

    /// Restart the polling cadence, e.g. when playback resumes
    pub fn restart(&mut self) {
        if let ClockSource::Polling(interval) = self {
            interval.reset_immediately();
        }
    }

    /// Drop pushed reports queued before a play, pause or seek; returns how many were dropped
    pub fn discard_pending(&mut self) -> usize {
        let ClockSource::Callbacks(rx) = self else {
            return 0;
        };
        let mut dropped = 0;
        while rx.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }

    /// Wait for the next status report
    ///
    /// With `poll_device` false the polling clock still paces the caller but the
    /// device is left alone, returning `None`.
    pub async fn next_status<D: PlaybackDevice>(
        &mut self,
        device: &mut D,
        poll_device: bool,
    ) -> Result<Option<PlaybackStatus>> {
        match self {
            ClockSource::Callbacks(rx) => match rx.recv().await {
                Some(status) => Ok(Some(status)),
                None => bail!("Device status channel closed"),
            },
            ClockSource::Polling(interval) => {
                interval.tick().await;
                if !poll_device {
                    return Ok(None);
                }
                Ok(Some(device.status().await?))
            }
        }
    }
}
