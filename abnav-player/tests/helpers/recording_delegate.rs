//! Delegate that records every notification

use abnav_common::{Locator, PlaybackState};
use abnav_player::navigator::{
    AudiobookNavigatorDelegate, MediaNavigator, MediaNavigatorDelegate, Navigator,
    NavigatorDelegate,
};
use std::ops::Range;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    State(PlaybackState),
    Time {
        time: f64,
        duration: Option<f64>,
        /// Navigator's `current_time()` when the callback ran
        player_time: f64,
    },
    Location(Locator),
    LoadedRanges(Vec<Range<f64>>),
}

#[derive(Default)]
pub struct RecordingDelegate {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.notifications.lock().unwrap())
    }

    pub fn times(&self) -> Vec<(f64, Option<f64>)> {
        self.notifications()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Time { time, duration, .. } => Some((time, duration)),
                _ => None,
            })
            .collect()
    }

    pub fn locations(&self) -> Vec<Locator> {
        self.notifications()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Location(locator) => Some(locator),
                _ => None,
            })
            .collect()
    }

    pub fn loaded_ranges(&self) -> Vec<Vec<Range<f64>>> {
        self.notifications()
            .into_iter()
            .filter_map(|n| match n {
                Notification::LoadedRanges(ranges) => Some(ranges),
                _ => None,
            })
            .collect()
    }

    fn record(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}

impl NavigatorDelegate for RecordingDelegate {
    fn location_did_change(&self, _navigator: &dyn Navigator, locator: &Locator) {
        self.record(Notification::Location(locator.clone()));
    }
}

impl MediaNavigatorDelegate for RecordingDelegate {
    fn state_did_change(&self, _navigator: &dyn MediaNavigator, state: PlaybackState) {
        self.record(Notification::State(state));
    }

    fn time_did_change(&self, navigator: &dyn MediaNavigator, time: f64, duration: Option<f64>) {
        self.record(Notification::Time {
            time,
            duration,
            player_time: navigator.current_time(),
        });
    }

    fn loaded_time_ranges_did_change(&self, _navigator: &dyn MediaNavigator, ranges: &[Range<f64>]) {
        self.record(Notification::LoadedRanges(ranges.to_vec()));
    }
}

impl AudiobookNavigatorDelegate for RecordingDelegate {}
