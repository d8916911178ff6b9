//! Clocked playback session
//!
//! Pairs an [`AudiobookNavigator`] with a [`SimulatedPlayer`] and moves the
//! player's virtual clock on a `tokio` interval. Navigator notifications are
//! collected through an [`EventForwarder`] and handed to the host as
//! [`NavigatorEvent`]s.

use crate::error::{Error, Result};
use crate::navigator::{
    AudiobookNavigator, EventForwarder, MediaNavigator, Navigator, NavigatorOptions,
};
use crate::player::SimulatedPlayer;
use abnav_common::config::{PlaybackConfig, MAX_SPEEDUP};
use abnav_common::{Locator, NavigatorEvent, Publication};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Wall-clock period between clock steps
const DEFAULT_TICK: Duration = Duration::from_millis(100);

/// Session settings
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    /// Wall-clock period between clock steps
    pub tick: Duration,
    /// Media seconds played per wall-clock second, before the playback rate
    pub speedup: f64,
    pub volume: f64,
    pub rate: f64,
    pub navigator: NavigatorOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&PlaybackConfig::default())
    }
}

impl From<&PlaybackConfig> for SessionOptions {
    fn from(config: &PlaybackConfig) -> Self {
        Self {
            tick: DEFAULT_TICK,
            speedup: config.speedup,
            volume: config.volume,
            rate: config.rate,
            navigator: NavigatorOptions::from(config),
        }
    }
}

impl SessionOptions {
    fn validate(&self) -> Result<()> {
        if self.tick.is_zero() {
            return Err(Error::Config("tick must be > 0".to_string()));
        }
        if !(self.speedup > 0.0 && self.speedup <= MAX_SPEEDUP) {
            return Err(Error::Config(format!(
                "speedup must be > 0 and <= {}, got {}",
                MAX_SPEEDUP, self.speedup
            )));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(Error::Config(format!(
                "volume must be between 0.0 and 1.0, got {}",
                self.volume
            )));
        }
        if !(self.rate >= 0.0 && self.rate.is_finite()) {
            return Err(Error::Config(format!(
                "rate must be a finite value >= 0.0, got {}",
                self.rate
            )));
        }
        if self.navigator.time_update_interval.is_zero() {
            return Err(Error::Config("time update interval must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Navigator driven by a simulated clock
pub struct PlaybackSession {
    navigator: AudiobookNavigator<SimulatedPlayer>,
    clock: SimulatedPlayer,
    /// Keeps the navigator's weak delegate alive
    _forwarder: Arc<EventForwarder>,
    events: mpsc::UnboundedReceiver<NavigatorEvent>,
    options: SessionOptions,
}

impl PlaybackSession {
    /// Build a session over `publication`
    ///
    /// Fails when the reading order is empty or the options are out of range.
    pub fn new(
        publication: Publication,
        initial_location: Option<Locator>,
        options: SessionOptions,
    ) -> Result<Self> {
        options.validate()?;
        if publication.reading_order.is_empty() {
            return Err(Error::Playback(format!(
                "'{}' has an empty reading order",
                publication.metadata.title
            )));
        }

        let clock = SimulatedPlayer::for_publication(&publication);
        let mut navigator = AudiobookNavigator::with_options(
            publication,
            initial_location,
            clock.clone(),
            options.navigator.clone(),
        );

        let (forwarder, events) = EventForwarder::new();
        let forwarder = Arc::new(forwarder);
        navigator.set_delegate(&forwarder);
        navigator.set_volume(options.volume);
        navigator.set_rate(options.rate);

        Ok(Self {
            navigator,
            clock,
            _forwarder: forwarder,
            events,
            options,
        })
    }

    pub fn navigator(&self) -> &AudiobookNavigator<SimulatedPlayer> {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut AudiobookNavigator<SimulatedPlayer> {
        &mut self.navigator
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Whether the last resource played to its end
    pub fn is_finished(&self) -> bool {
        self.navigator.has_finished()
    }

    /// Start playback at the initial location
    pub fn start(&mut self) {
        self.navigator.play();
        self.navigator.process_signals();
    }

    /// Move the clock by `elapsed` wall-clock time and handle the resulting
    /// player signals; returns how many were handled
    pub fn step(&mut self, elapsed: Duration) -> usize {
        let scaled = Duration::try_from_secs_f64(elapsed.as_secs_f64() * self.options.speedup)
            .unwrap_or(Duration::MAX);
        self.clock.advance(scaled);
        self.navigator.process_signals()
    }

    /// Notifications collected since the last call
    pub fn drain_events(&mut self) -> Vec<NavigatorEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Play until the publication finishes or `shutdown` resolves
    ///
    /// Every notification is passed to `on_event` in order.
    pub async fn run_until<S, F>(&mut self, shutdown: S, mut on_event: F) -> Result<()>
    where
        S: Future<Output = ()>,
        F: FnMut(&NavigatorEvent),
    {
        tokio::pin!(shutdown);

        self.start();
        for event in self.drain_events() {
            on_event(&event);
        }

        let mut interval = tokio::time::interval(self.options.tick);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        while !self.is_finished() {
            tokio::select! {
                _ = interval.tick() => {
                    self.step(self.options.tick);
                    for event in self.drain_events() {
                        on_event(&event);
                    }
                }
                _ = &mut shutdown => {
                    info!("Stopping playback at {:?}", self.navigator.current_location().map(|l| l.href));
                    self.navigator.pause();
                    self.navigator.process_signals();
                    for event in self.drain_events() {
                        on_event(&event);
                    }
                    return Ok(());
                }
            }
        }

        debug!("Session finished");
        for event in self.drain_events() {
            on_event(&event);
        }
        Ok(())
    }
}
