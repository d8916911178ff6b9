//! Event types for navigator notifications

use crate::locator::Locator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Playback state reported by a media navigator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Paused,
    Loading,
    Playing,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Loading => write!(f, "loading"),
            PlaybackState::Playing => write!(f, "playing"),
        }
    }
}

/// Snapshot of the playback position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaPlaybackInfo {
    /// Index of the current resource in the reading order
    pub resource_index: usize,
    pub state: PlaybackState,
    /// Position in the current resource, in seconds
    pub time: f64,
    /// Duration of the current resource, in seconds
    pub duration: Option<f64>,
}

impl MediaPlaybackInfo {
    /// Fraction of the current resource already played
    pub fn progress(&self) -> Option<f64> {
        self.duration
            .filter(|duration| *duration > 0.0)
            .map(|duration| (self.time / duration).clamp(0.0, 1.0))
    }
}

/// Navigator notifications in serializable form
///
/// Hosts that forward delegate callbacks (logs, JSON lines, IPC) use this
/// instead of the callback signatures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NavigatorEvent {
    /// Playback state changed
    StateChanged {
        state: PlaybackState,
        timestamp: DateTime<Utc>,
    },

    /// Current time or duration changed
    TimeChanged {
        time: f64,
        duration: Option<f64>,
        timestamp: DateTime<Utc>,
    },

    /// Current location changed
    LocationChanged {
        locator: Locator,
        timestamp: DateTime<Utc>,
    },

    /// Buffered ranges of the current resource changed
    LoadedRangesChanged {
        ranges: Vec<Range<f64>>,
        timestamp: DateTime<Utc>,
    },
}

impl NavigatorEvent {
    pub fn state_changed(state: PlaybackState) -> Self {
        NavigatorEvent::StateChanged {
            state,
            timestamp: Utc::now(),
        }
    }

    pub fn time_changed(time: f64, duration: Option<f64>) -> Self {
        NavigatorEvent::TimeChanged {
            time,
            duration,
            timestamp: Utc::now(),
        }
    }

    pub fn location_changed(locator: Locator) -> Self {
        NavigatorEvent::LocationChanged {
            locator,
            timestamp: Utc::now(),
        }
    }

    pub fn loaded_ranges_changed(ranges: Vec<Range<f64>>) -> Self {
        NavigatorEvent::LoadedRangesChanged {
            ranges,
            timestamp: Utc::now(),
        }
    }

    /// Short event name, used in log lines
    pub fn event_type(&self) -> &'static str {
        match self {
            NavigatorEvent::StateChanged { .. } => "StateChanged",
            NavigatorEvent::TimeChanged { .. } => "TimeChanged",
            NavigatorEvent::LocationChanged { .. } => "LocationChanged",
            NavigatorEvent::LoadedRangesChanged { .. } => "LoadedRangesChanged",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            NavigatorEvent::StateChanged { timestamp, .. }
            | NavigatorEvent::TimeChanged { timestamp, .. }
            | NavigatorEvent::LocationChanged { timestamp, .. }
            | NavigatorEvent::LoadedRangesChanged { timestamp, .. } => *timestamp,
        }
    }
}
