//! Navigators over publications
//!
//! [`Navigator`] moves through a publication; [`MediaNavigator`] adds
//! playback control for time-based media. [`AudiobookNavigator`] implements
//! both on top of a [`MediaPlayer`](crate::player::MediaPlayer).

pub mod audiobook;
pub mod delegate;

pub use audiobook::{AudiobookNavigator, NavigatorOptions};
pub use delegate::{
    AudiobookNavigatorDelegate, EventForwarder, MediaNavigatorDelegate, NavigatorDelegate,
};

use abnav_common::{Link, Locator, PlaybackState};

/// Moves through the resources of a publication
///
/// Navigation methods return whether the request was applied. Failures
/// (unknown href, index out of range, unsupported direction) leave the
/// navigator unchanged.
pub trait Navigator {
    /// Current position in the publication
    fn current_location(&self) -> Option<Locator>;

    fn go(&mut self, locator: &Locator) -> bool;

    /// Go to the start of a linked resource
    fn go_to_link(&mut self, link: &Link) -> bool {
        self.go(&Locator::from_link(link))
    }

    fn go_forward(&mut self) -> bool;

    fn go_backward(&mut self) -> bool;
}

/// Navigator for time-based media
pub trait MediaNavigator: Navigator {
    /// Current playback position in seconds
    fn current_time(&self) -> f64;

    /// Volume of playback, from 0.0 to 1.0
    fn volume(&self) -> f64;

    /// Panics when `volume` is outside 0.0..=1.0
    fn set_volume(&mut self, volume: f64);

    /// Speed of playback, 1.0 by default
    fn rate(&self) -> f64;

    /// Panics when `rate` is negative
    fn set_rate(&mut self, rate: f64);

    fn state(&self) -> PlaybackState;

    /// Resume or start playback
    fn play(&mut self);

    fn pause(&mut self);

    fn toggle_playback(&mut self) {
        match self.state() {
            PlaybackState::Loading | PlaybackState::Playing => self.pause(),
            PlaybackState::Paused => self.play(),
        }
    }
}
