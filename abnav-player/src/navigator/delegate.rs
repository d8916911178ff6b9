//! Navigator observers
//!
//! Every callback has an empty default so observers implement only what they
//! need. Callbacks receive the navigator as a shared reference: observers can
//! read it but cannot drive it from inside a notification.

use super::{MediaNavigator, Navigator};
use abnav_common::human_time::format_playback_time;
use abnav_common::{Locator, NavigatorEvent, PlaybackState};
use std::ops::Range;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

/// Observer of location changes
pub trait NavigatorDelegate: Send + Sync {
    fn location_did_change(&self, _navigator: &dyn Navigator, _locator: &Locator) {}
}

/// Observer of media playback
pub trait MediaNavigatorDelegate: NavigatorDelegate {
    /// Called when the playback state changes
    fn state_did_change(&self, _navigator: &dyn MediaNavigator, _state: PlaybackState) {}

    /// Called when the duration or current time changes
    fn time_did_change(&self, _navigator: &dyn MediaNavigator, _time: f64, _duration: Option<f64>) {}

    /// Called when the buffered ranges of the current resource change
    fn loaded_time_ranges_did_change(&self, _navigator: &dyn MediaNavigator, _ranges: &[Range<f64>]) {}
}

/// Observer of an [`AudiobookNavigator`](super::AudiobookNavigator)
pub trait AudiobookNavigatorDelegate: MediaNavigatorDelegate {}

/// Delegate that logs notifications and forwards them as [`NavigatorEvent`]s
///
/// Used by hosts that consume notifications away from the callback, such as
/// the CLI printing JSON lines.
pub struct EventForwarder {
    tx: mpsc::UnboundedSender<NavigatorEvent>,
}

impl EventForwarder {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NavigatorEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, event: NavigatorEvent) {
        if self.tx.send(event).is_err() {
            trace!("Navigator event receiver dropped");
        }
    }
}

impl NavigatorDelegate for EventForwarder {
    fn location_did_change(&self, _navigator: &dyn Navigator, locator: &Locator) {
        trace!("Location: {} {:?}", locator.href, locator.locations.fragments);
        self.forward(NavigatorEvent::location_changed(locator.clone()));
    }
}

impl MediaNavigatorDelegate for EventForwarder {
    fn state_did_change(&self, _navigator: &dyn MediaNavigator, state: PlaybackState) {
        info!("Playback {}", state);
        self.forward(NavigatorEvent::state_changed(state));
    }

    fn time_did_change(&self, _navigator: &dyn MediaNavigator, time: f64, duration: Option<f64>) {
        let typical_max = duration.unwrap_or(time);
        debug!(
            "Time {} / {}",
            format_playback_time(time, typical_max),
            duration
                .map(|d| format_playback_time(d, typical_max))
                .unwrap_or_else(|| "?".to_string())
        );
        self.forward(NavigatorEvent::time_changed(time, duration));
    }

    fn loaded_time_ranges_did_change(&self, _navigator: &dyn MediaNavigator, ranges: &[Range<f64>]) {
        trace!("Loaded ranges: {:?}", ranges);
        self.forward(NavigatorEvent::loaded_ranges_changed(ranges.to_vec()));
    }
}

impl AudiobookNavigatorDelegate for EventForwarder {}
