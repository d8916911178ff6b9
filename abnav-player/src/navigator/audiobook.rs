//! Audiobook navigator - reading order over a media player
//!
//! **Responsibilities:**
//! - Map navigation requests (locator, link, resource index) to player loads
//!   and seeks
//! - Track which reading-order resource is loaded
//! - Turn player signals into delegate notifications
//! - Advance to the next resource when the current one plays to its end
//!
//! Player signals are queued on a channel and handled when the host calls
//! [`AudiobookNavigator::process_signals`] (or awaits
//! [`AudiobookNavigator::next_signal`] and calls
//! [`AudiobookNavigator::handle_signal`]). Delegates are invoked
//! synchronously from those handlers.
//!
//! `go` never starts or stops playback. The player keeps its requested rate
//! across item replacement: navigating while playing keeps playing, and
//! navigating while paused stays paused.

use super::{AudiobookNavigatorDelegate, MediaNavigator, Navigator};
use crate::player::{
    ItemId, MediaPlayer, MediaTime, PlayerSignal, SignalKind, SignalReceiver, SignalSender,
    SubscriptionToken,
};
use abnav_common::config::PlaybackConfig;
use abnav_common::locator::time_fragment;
use abnav_common::{
    Locations, Locator, MediaPlaybackInfo, PlaybackState, Publication,
};
use std::ops::Range;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// Media type of locators built for resources that declare none
pub const DEFAULT_AUDIO_TYPE: &str = "audio/*";

/// Navigator construction options
#[derive(Debug, Clone, PartialEq)]
pub struct NavigatorOptions {
    /// Cadence of periodic time notifications
    pub time_update_interval: Duration,
}

impl Default for NavigatorOptions {
    fn default() -> Self {
        Self {
            time_update_interval: Duration::from_millis(500),
        }
    }
}

impl From<&PlaybackConfig> for NavigatorOptions {
    fn from(config: &PlaybackConfig) -> Self {
        Self {
            time_update_interval: config.time_update_interval(),
        }
    }
}

/// Navigator playing an audiobook's reading order through a [`MediaPlayer`]
pub struct AudiobookNavigator<P: MediaPlayer> {
    publication: Arc<Publication>,
    player: P,
    delegate: Option<Weak<dyn AudiobookNavigatorDelegate>>,

    /// Location used by the first `play()` when nothing is loaded yet
    initial_location: Option<Locator>,

    /// Index of the loaded resource in the reading order
    resource_index: usize,

    /// Set when the last resource played to its end
    finished: bool,

    signals_tx: SignalSender,
    signals_rx: SignalReceiver,

    /// Subscriptions held for the navigator's lifetime
    subscriptions: Vec<SubscriptionToken>,

    /// Buffered-range subscription of the current item
    loaded_ranges_subscription: Option<(ItemId, SubscriptionToken)>,
}

impl<P: MediaPlayer> AudiobookNavigator<P> {
    /// Create a navigator with default options
    ///
    /// Without `initial_location`, playback starts at the first resource of
    /// the reading order.
    pub fn new(
        publication: impl Into<Arc<Publication>>,
        initial_location: Option<Locator>,
        player: P,
    ) -> Self {
        Self::with_options(publication, initial_location, player, NavigatorOptions::default())
    }

    pub fn with_options(
        publication: impl Into<Arc<Publication>>,
        initial_location: Option<Locator>,
        player: P,
        options: NavigatorOptions,
    ) -> Self {
        let publication = publication.into();
        let initial_location = initial_location
            .or_else(|| publication.reading_order.first().map(Locator::from_link));
        let resource_index = initial_location
            .as_ref()
            .and_then(|locator| publication.index_of_href(&locator.href))
            .unwrap_or(0);
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();

        let mut navigator = Self {
            publication,
            player,
            delegate: None,
            initial_location,
            resource_index,
            finished: false,
            signals_tx,
            signals_rx,
            subscriptions: Vec::new(),
            loaded_ranges_subscription: None,
        };
        navigator.register_signal_handlers(options.time_update_interval);

        debug!(
            "Audiobook navigator created for '{}' ({} resources, starting at {})",
            navigator.publication.metadata.title,
            navigator.publication.reading_order.len(),
            navigator.resource_index
        );
        navigator
    }

    fn register_signal_handlers(&mut self, time_update_interval: Duration) {
        let kinds = [
            SignalKind::PeriodicTime {
                interval: time_update_interval,
            },
            SignalKind::TimeControlStatus,
            SignalKind::CurrentItem,
            SignalKind::DidPlayToEnd,
        ];
        for kind in kinds {
            let token = self.player.subscribe(kind, self.signals_tx.clone());
            self.subscriptions.push(token);
        }
        self.resubscribe_loaded_ranges();
    }

    /// Point the buffered-range subscription at the player's current item
    fn resubscribe_loaded_ranges(&mut self) {
        let current = self.player.current_item();
        if self.loaded_ranges_subscription.as_ref().map(|(item, _)| *item) == current {
            return;
        }

        if let Some((_, token)) = self.loaded_ranges_subscription.take() {
            self.player.unsubscribe(token);
        }
        if let Some(item) = current {
            let token = self
                .player
                .subscribe(SignalKind::LoadedTimeRanges { item }, self.signals_tx.clone());
            self.loaded_ranges_subscription = Some((item, token));
        }
    }

    // ========================================
    // Delegate
    // ========================================

    /// Register the observer
    ///
    /// Only a weak reference is kept; the caller owns the delegate.
    pub fn set_delegate<D: AudiobookNavigatorDelegate + 'static>(&mut self, delegate: &Arc<D>) {
        let delegate: Arc<dyn AudiobookNavigatorDelegate> = delegate.clone();
        self.delegate = Some(Arc::downgrade(&delegate));
    }

    pub fn clear_delegate(&mut self) {
        self.delegate = None;
    }

    fn delegate(&self) -> Option<Arc<dyn AudiobookNavigatorDelegate>> {
        self.delegate.as_ref().and_then(Weak::upgrade)
    }

    fn notify_time_changed(&self, time: f64, duration: Option<f64>) {
        if let Some(delegate) = self.delegate() {
            delegate.time_did_change(self, time, duration);
        }
    }

    fn notify_location_changed(&self, locator: &Locator) {
        if let Some(delegate) = self.delegate() {
            delegate.location_did_change(self, locator);
        }
    }

    fn notify_state_changed(&self, state: PlaybackState) {
        if let Some(delegate) = self.delegate() {
            delegate.state_did_change(self, state);
        }
    }

    fn notify_loaded_ranges_changed(&self) {
        let ranges = self.loaded_time_ranges();
        if let Some(delegate) = self.delegate() {
            delegate.loaded_time_ranges_did_change(self, &ranges);
        }
    }

    // ========================================
    // Accessors
    // ========================================

    pub fn publication(&self) -> &Publication {
        &self.publication
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    /// Index of the loaded resource in the reading order
    pub fn resource_index(&self) -> usize {
        self.resource_index
    }

    /// Whether the last resource played to its end
    pub fn has_finished(&self) -> bool {
        self.finished
    }

    /// Duration in seconds of the current resource
    ///
    /// The player's duration wins when it is known; otherwise the duration
    /// declared by the reading order.
    pub fn duration(&self) -> Option<f64> {
        self.player
            .current_item_duration()
            .and_then(MediaTime::seconds)
            .or_else(|| {
                self.publication
                    .reading_order
                    .get(self.resource_index)
                    .and_then(|link| link.duration)
            })
    }

    /// Buffered ranges of the current resource, in player order
    pub fn loaded_time_ranges(&self) -> Vec<Range<f64>> {
        self.player
            .loaded_time_ranges()
            .into_iter()
            .map(|range| range.to_range())
            .collect()
    }

    /// Snapshot of the current playback position
    pub fn playback_info(&self) -> MediaPlaybackInfo {
        MediaPlaybackInfo {
            resource_index: self.resource_index,
            state: self.state(),
            time: self.current_time(),
            duration: self.duration(),
        }
    }

    /// Locator for `time` seconds into the current resource
    ///
    /// `None` when the reading order is empty. `totalProgression` is not
    /// computed.
    pub fn make_locator(&self, time: f64) -> Option<Locator> {
        let link = self.publication.reading_order.get(self.resource_index)?;
        let progression = self
            .duration()
            .filter(|duration| *duration > 0.0)
            .map(|duration| time / duration);

        Some(Locator {
            href: link.href.clone(),
            media_type: link
                .media_type
                .clone()
                .unwrap_or_else(|| DEFAULT_AUDIO_TYPE.to_string()),
            title: link.title.clone(),
            locations: Locations {
                fragments: vec![time_fragment(time)],
                progression,
                total_progression: None,
            },
        })
    }

    // ========================================
    // Resource navigation
    // ========================================

    pub fn go_to_next_resource(&mut self) -> bool {
        self.go_to_resource_index(self.resource_index + 1)
    }

    pub fn go_to_previous_resource(&mut self) -> bool {
        match self.resource_index.checked_sub(1) {
            Some(index) => self.go_to_resource_index(index),
            None => false,
        }
    }

    /// Go to the start of the reading-order resource at `index`
    pub fn go_to_resource_index(&mut self, index: usize) -> bool {
        let Some(link) = self.publication.reading_order.get(index).cloned() else {
            debug!(
                "Resource index {} out of range (reading order has {})",
                index,
                self.publication.reading_order.len()
            );
            return false;
        };
        self.go_to_link(&link)
    }

    // ========================================
    // Seeking
    // ========================================

    /// Seek the current resource to `time` seconds
    pub fn seek_to(&mut self, time: f64) {
        self.player.seek(time);
    }

    /// Seek relative to the current position
    pub fn seek_by(&mut self, delta: f64) {
        let target = self.current_time() + delta;
        self.seek_to(target);
    }

    // ========================================
    // Player signals
    // ========================================

    /// Handle every queued player signal; returns how many were handled
    pub fn process_signals(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(signal) = self.signals_rx.try_recv() {
            self.handle_signal(signal);
            handled += 1;
        }
        handled
    }

    /// Wait for the next player signal
    ///
    /// The navigator holds a sender for its own channel, so this only
    /// returns `None` if the channel is closed from outside.
    pub async fn next_signal(&mut self) -> Option<PlayerSignal> {
        self.signals_rx.recv().await
    }

    pub fn handle_signal(&mut self, signal: PlayerSignal) {
        match signal {
            PlayerSignal::PeriodicTime { time } => {
                let time = time.seconds_or_zero();
                self.notify_time_changed(time, self.duration());
                if let Some(locator) = self.make_locator(time) {
                    self.notify_location_changed(&locator);
                }
            }
            PlayerSignal::TimeControlStatusChanged { status } => {
                self.notify_state_changed(PlaybackState::from(status));
            }
            PlayerSignal::CurrentItemChanged { .. } => {
                self.resubscribe_loaded_ranges();
                self.notify_loaded_ranges_changed();
            }
            PlayerSignal::LoadedTimeRangesChanged { item } => {
                if self.player.current_item() == Some(item) {
                    self.notify_loaded_ranges_changed();
                } else {
                    trace!("Ignoring buffered ranges of superseded item {}", item);
                }
            }
            PlayerSignal::DidPlayToEnd { item } => self.item_did_play_to_end(item),
        }
    }

    fn item_did_play_to_end(&mut self, item: ItemId) {
        if self.player.current_item() != Some(item) {
            debug!("Ignoring end of superseded item {}", item);
            return;
        }

        let next = self.resource_index + 1;
        if next >= self.publication.reading_order.len() {
            info!(
                "Reached end of reading order of '{}'",
                self.publication.metadata.title
            );
            self.player.pause();
            self.finished = true;
            return;
        }

        if !self.go_to_next_resource() {
            warn!("Cannot continue to resource {}, pausing", next);
            self.player.pause();
        }
    }
}

impl<P: MediaPlayer> Navigator for AudiobookNavigator<P> {
    fn current_location(&self) -> Option<Locator> {
        self.make_locator(self.current_time())
    }

    fn go(&mut self, locator: &Locator) -> bool {
        let Some(index) = self.publication.index_of_href(&locator.href) else {
            warn!("Cannot go to '{}': not in the reading order", locator.href);
            return false;
        };
        let Some(url) = self.publication.resolve_href(&locator.href) else {
            warn!("Cannot go to '{}': href does not resolve to a URL", locator.href);
            return false;
        };

        if self.player.current_item().is_none() || self.resource_index != index {
            debug!("Loading resource {} from {}", index, url);
            self.player.replace_current_item(Some(&url));
            self.resource_index = index;
        }
        self.finished = false;

        let duration = self.duration();
        let time = locator.time(duration).unwrap_or(0.0);
        if time > 0.0 {
            self.player.seek(time);
        }
        debug!("Went to resource {} at {}s", index, time);

        self.notify_time_changed(time, duration);
        true
    }

    fn go_forward(&mut self) -> bool {
        false
    }

    fn go_backward(&mut self) -> bool {
        false
    }
}

impl<P: MediaPlayer> MediaNavigator for AudiobookNavigator<P> {
    fn current_time(&self) -> f64 {
        self.player.current_time().seconds_or_zero()
    }

    fn volume(&self) -> f64 {
        f64::from(self.player.volume())
    }

    fn set_volume(&mut self, volume: f64) {
        assert!(
            (0.0..=1.0).contains(&volume),
            "volume must be between 0.0 and 1.0, got {}",
            volume
        );
        self.player.set_volume(volume as f32);
    }

    fn rate(&self) -> f64 {
        f64::from(self.player.rate())
    }

    fn set_rate(&mut self, rate: f64) {
        assert!(rate >= 0.0, "rate must be >= 0.0, got {}", rate);
        self.player.set_rate(rate as f32);
    }

    fn state(&self) -> PlaybackState {
        PlaybackState::from(self.player.time_control_status())
    }

    fn play(&mut self) {
        if self.player.current_item().is_none() {
            if let Some(location) = self.initial_location.take() {
                self.go(&location);
            }
        }
        self.player.play();
    }

    fn pause(&mut self) {
        self.player.pause();
    }
}

impl<P: MediaPlayer> Drop for AudiobookNavigator<P> {
    fn drop(&mut self) {
        if let Some((_, token)) = self.loaded_ranges_subscription.take() {
            self.player.unsubscribe(token);
        }
        for token in self.subscriptions.drain(..) {
            self.player.unsubscribe(token);
        }
    }
}
