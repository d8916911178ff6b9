//! Media player abstraction
//!
//! The navigator drives playback through [`MediaPlayer`]. Implementations
//! report asynchronous changes as [`PlayerSignal`]s sent to the channels
//! registered with [`MediaPlayer::subscribe`]. Every subscription returns a
//! [`SubscriptionToken`] that must be handed back to
//! [`MediaPlayer::unsubscribe`] when the subscriber goes away.

pub mod simulated;

pub use simulated::SimulatedPlayer;

use abnav_common::PlaybackState;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;
use uuid::Uuid;

/// Identity of an item loaded into a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point on a player timeline
///
/// Players may report times that are not numbers yet (unknown duration of a
/// stream, nothing loaded).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaTime {
    Seconds(f64),
    Indefinite,
    Invalid,
}

impl MediaTime {
    /// Seconds, if the time is a finite number
    pub fn seconds(self) -> Option<f64> {
        match self {
            MediaTime::Seconds(seconds) if seconds.is_finite() => Some(seconds),
            _ => None,
        }
    }

    pub fn seconds_or_zero(self) -> f64 {
        self.seconds().unwrap_or(0.0)
    }

    pub fn is_numeric(self) -> bool {
        self.seconds().is_some()
    }
}

/// Time-control status reported by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeControlStatus {
    Paused,
    WaitingToPlayAtSpecifiedRate,
    Playing,
    /// A status this crate does not know about
    Unknown,
}

impl From<TimeControlStatus> for PlaybackState {
    fn from(status: TimeControlStatus) -> Self {
        match status {
            TimeControlStatus::Paused => PlaybackState::Paused,
            TimeControlStatus::WaitingToPlayAtSpecifiedRate => PlaybackState::Loading,
            TimeControlStatus::Playing => PlaybackState::Playing,
            TimeControlStatus::Unknown => PlaybackState::Loading,
        }
    }
}

/// A buffered span of the current item, as reported by the player
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadedTimeRange {
    pub start: MediaTime,
    pub duration: MediaTime,
}

impl LoadedTimeRange {
    pub fn new(start: f64, duration: f64) -> Self {
        Self {
            start: MediaTime::Seconds(start),
            duration: MediaTime::Seconds(duration),
        }
    }

    /// Half-open `start..start + duration` interval in seconds
    pub fn to_range(self) -> std::ops::Range<f64> {
        let start = self.start.seconds_or_zero();
        start..start + self.duration.seconds_or_zero()
    }
}

/// Signals a subscriber can register for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalKind {
    /// Periodic position ticks while time advances, plus time jumps
    PeriodicTime { interval: Duration },
    /// Time-control status changes
    TimeControlStatus,
    /// Current item replaced
    CurrentItem,
    /// Buffered ranges of one item changed
    LoadedTimeRanges { item: ItemId },
    /// An item played to its end
    DidPlayToEnd,
}

/// Signals delivered to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerSignal {
    PeriodicTime { time: MediaTime },
    TimeControlStatusChanged { status: TimeControlStatus },
    CurrentItemChanged { item: Option<ItemId> },
    LoadedTimeRangesChanged { item: ItemId },
    DidPlayToEnd { item: ItemId },
}

impl PlayerSignal {
    /// Whether this signal is delivered to a subscription of `kind`
    pub fn matches(&self, kind: &SignalKind) -> bool {
        match (self, kind) {
            (PlayerSignal::PeriodicTime { .. }, SignalKind::PeriodicTime { .. }) => true,
            (PlayerSignal::TimeControlStatusChanged { .. }, SignalKind::TimeControlStatus) => true,
            (PlayerSignal::CurrentItemChanged { .. }, SignalKind::CurrentItem) => true,
            (
                PlayerSignal::LoadedTimeRangesChanged { item },
                SignalKind::LoadedTimeRanges { item: subscribed },
            ) => item == subscribed,
            (PlayerSignal::DidPlayToEnd { .. }, SignalKind::DidPlayToEnd) => true,
            _ => false,
        }
    }
}

/// Channel end a player delivers signals to
pub type SignalSender = mpsc::UnboundedSender<PlayerSignal>;

/// Receiving end of a signal channel
pub type SignalReceiver = mpsc::UnboundedReceiver<PlayerSignal>;

/// Handle for one registered subscription
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(pub(crate) u64);

impl SubscriptionToken {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Audio player driven by a navigator
///
/// Volume and rate use the player's native `f32`. Implementations are
/// expected to keep the requested rate across item replacement: loading a
/// new item while playing keeps playing.
pub trait MediaPlayer {
    /// Item currently loaded, if any
    fn current_item(&self) -> Option<ItemId>;

    /// Replace the current item with the resource at `url` (or unload)
    fn replace_current_item(&mut self, url: Option<&Url>) -> Option<ItemId>;

    fn play(&mut self);

    fn pause(&mut self);

    /// Seek the current item to `seconds`
    fn seek(&mut self, seconds: f64);

    fn current_time(&self) -> MediaTime;

    /// Duration of the current item; `None` when no item is loaded
    fn current_item_duration(&self) -> Option<MediaTime>;

    fn volume(&self) -> f32;

    fn set_volume(&mut self, volume: f32);

    fn rate(&self) -> f32;

    fn set_rate(&mut self, rate: f32);

    fn time_control_status(&self) -> TimeControlStatus;

    /// Buffered ranges of the current item, in player order
    fn loaded_time_ranges(&self) -> Vec<LoadedTimeRange>;

    /// Register `sink` for signals of `kind`
    fn subscribe(&mut self, kind: SignalKind, sink: SignalSender) -> SubscriptionToken;

    /// Release a subscription; unknown tokens are ignored
    fn unsubscribe(&mut self, token: SubscriptionToken);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_time_numeric() {
        assert_eq!(MediaTime::Seconds(2.5).seconds(), Some(2.5));
        assert_eq!(MediaTime::Seconds(f64::NAN).seconds(), None);
        assert_eq!(MediaTime::Seconds(f64::INFINITY).seconds_or_zero(), 0.0);
        assert_eq!(MediaTime::Indefinite.seconds_or_zero(), 0.0);
        assert!(!MediaTime::Invalid.is_numeric());
    }

    #[test]
    fn test_status_to_playback_state() {
        assert_eq!(PlaybackState::from(TimeControlStatus::Paused), PlaybackState::Paused);
        assert_eq!(
            PlaybackState::from(TimeControlStatus::WaitingToPlayAtSpecifiedRate),
            PlaybackState::Loading
        );
        assert_eq!(PlaybackState::from(TimeControlStatus::Playing), PlaybackState::Playing);
        assert_eq!(PlaybackState::from(TimeControlStatus::Unknown), PlaybackState::Loading);
    }

    #[test]
    fn test_loaded_range_to_half_open_interval() {
        assert_eq!(LoadedTimeRange::new(10.0, 2.0).to_range(), 10.0..12.0);

        let unknown = LoadedTimeRange {
            start: MediaTime::Invalid,
            duration: MediaTime::Seconds(3.0),
        };
        assert_eq!(unknown.to_range(), 0.0..3.0);
    }

    #[test]
    fn test_loaded_ranges_signal_matches_only_its_item() {
        let item = ItemId::new();
        let other = ItemId::new();
        let signal = PlayerSignal::LoadedTimeRangesChanged { item };

        assert!(signal.matches(&SignalKind::LoadedTimeRanges { item }));
        assert!(!signal.matches(&SignalKind::LoadedTimeRanges { item: other }));
        assert!(!signal.matches(&SignalKind::CurrentItem));
    }

    #[test]
    fn test_periodic_signal_matches_any_interval() {
        let signal = PlayerSignal::PeriodicTime {
            time: MediaTime::Seconds(1.0),
        };
        assert!(signal.matches(&SignalKind::PeriodicTime {
            interval: Duration::from_millis(250)
        }));
        assert!(!signal.matches(&SignalKind::DidPlayToEnd));
    }
}
