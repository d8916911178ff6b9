//! In-process simulated player
//!
//! Plays nothing: a virtual clock moves the position forward when the host
//! calls [`SimulatedPlayer::advance`]. Durations come from a catalog keyed by
//! resource URL, so a publication's declared durations drive the timeline.
//!
//! **Behavior:**
//! - Loading an item starts with an empty buffer; the first `advance` fills
//!   `buffer_ahead` seconds and moves a waiting player to `Playing`
//! - Buffering continues while paused
//! - At the end of an item the player emits `DidPlayToEnd` and waits at its
//!   requested rate for the next item
//! - Periodic ticks fire when the position crosses an interval boundary,
//!   and on seeks, play and pause
//!
//! The struct is a cheap handle: clones share the same player, so a host can
//! hand one clone to a navigator and keep another to drive the clock.

use super::{
    ItemId, LoadedTimeRange, MediaPlayer, MediaTime, PlayerSignal, SignalKind, SignalSender,
    SubscriptionToken, TimeControlStatus,
};
use abnav_common::Publication;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

/// Seconds buffered ahead of the playhead on each clock step
const DEFAULT_BUFFER_AHEAD_SECS: f64 = 30.0;

/// Simulated audio player with a virtual clock
#[derive(Clone, Default)]
pub struct SimulatedPlayer {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    catalog: HashMap<String, f64>,
    buffer_ahead: f64,
    current: Option<LoadedItem>,
    wants_to_play: bool,
    rate: f32,
    volume: f32,
    status: TimeControlStatus,
    subscriptions: Vec<Subscription>,
    next_token: u64,
}

struct LoadedItem {
    id: ItemId,
    url: Url,
    duration: Option<f64>,
    position: f64,
    ended: bool,
    buffered: Vec<Range<f64>>,
}

struct Subscription {
    id: u64,
    kind: SignalKind,
    sink: SignalSender,
    /// Last periodic slot delivered (periodic subscriptions only)
    last_slot: Option<u64>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            catalog: HashMap::new(),
            buffer_ahead: DEFAULT_BUFFER_AHEAD_SECS,
            current: None,
            wants_to_play: false,
            rate: 1.0,
            volume: 1.0,
            status: TimeControlStatus::Paused,
            subscriptions: Vec::new(),
            next_token: 1,
        }
    }
}

impl SimulatedPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Player whose catalog holds every declared duration of `publication`
    pub fn for_publication(publication: &Publication) -> Self {
        let player = Self::new();
        for link in &publication.reading_order {
            if let (Some(url), Some(duration)) = (publication.resolve_href(&link.href), link.duration) {
                player.register_duration(&url, duration);
            }
        }
        player
    }

    pub fn with_buffer_ahead(self, seconds: f64) -> Self {
        self.lock().buffer_ahead = seconds.max(0.0);
        self
    }

    /// Declare the duration of the resource at `url`
    ///
    /// Resources without a declared duration have an indefinite timeline and
    /// never end.
    pub fn register_duration(&self, url: &Url, seconds: f64) {
        self.lock().catalog.insert(url.as_str().to_string(), seconds);
    }

    /// Move the virtual clock forward
    pub fn advance(&self, elapsed: Duration) {
        self.lock().advance(elapsed.as_secs_f64());
    }

    /// Jump to the end of the current item, as if it finished playing
    pub fn finish_current_item(&self) {
        self.lock().finish_current_item();
    }

    /// URL of the loaded item
    pub fn current_url(&self) -> Option<Url> {
        self.lock().current.as_ref().map(|item| item.url.clone())
    }

    /// Number of live subscriptions
    pub fn subscription_count(&self) -> usize {
        self.lock().subscriptions.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    fn emit(&mut self, signal: PlayerSignal) {
        trace!("Simulated player signal: {:?}", signal);
        self.subscriptions.retain(|sub| !sub.sink.is_closed());
        for sub in self.subscriptions.iter().filter(|sub| signal.matches(&sub.kind)) {
            let _ = sub.sink.send(signal.clone());
        }
    }

    /// Deliver a periodic tick to subscribers whose interval slot changed
    fn emit_time(&mut self, force: bool) {
        let Some(position) = self.current.as_ref().map(|item| item.position) else {
            return;
        };

        for sub in self.subscriptions.iter_mut() {
            let SignalKind::PeriodicTime { interval } = sub.kind else {
                continue;
            };
            let interval = interval.as_secs_f64();
            let slot = if interval > 0.0 {
                (position / interval).floor() as u64
            } else {
                u64::MAX
            };

            if force || interval <= 0.0 || sub.last_slot != Some(slot) {
                sub.last_slot = Some(slot);
                let _ = sub.sink.send(PlayerSignal::PeriodicTime {
                    time: MediaTime::Seconds(position),
                });
            }
        }
    }

    fn set_status(&mut self, status: TimeControlStatus) {
        if self.status != status {
            debug!("Simulated player status: {:?} -> {:?}", self.status, status);
            self.status = status;
            self.emit(PlayerSignal::TimeControlStatusChanged { status });
        }
    }

    /// Status matching the play intent and the buffer at the playhead
    fn settled_status(&self) -> TimeControlStatus {
        if !self.wants_to_play {
            return TimeControlStatus::Paused;
        }
        match &self.current {
            Some(item) if !item.ended && item.is_buffered_at(item.position) => {
                TimeControlStatus::Playing
            }
            _ => TimeControlStatus::WaitingToPlayAtSpecifiedRate,
        }
    }

    fn advance(&mut self, elapsed: f64) {
        let buffer_ahead = self.buffer_ahead;
        let Some(item) = self.current.as_mut() else {
            return;
        };
        let item_id = item.id;
        let buffer_changed = item.fill_buffer(buffer_ahead);
        if buffer_changed {
            self.emit(PlayerSignal::LoadedTimeRangesChanged { item: item_id });
        }

        let status = self.settled_status();
        self.set_status(status);
        if self.status != TimeControlStatus::Playing {
            return;
        }

        let rate = f64::from(self.rate);
        let reached_end = match self.current.as_mut() {
            Some(item) => {
                item.position += elapsed * rate;
                match item.duration {
                    Some(duration) if item.position >= duration => {
                        item.position = duration;
                        item.ended = true;
                        true
                    }
                    _ => false,
                }
            }
            None => false,
        };

        if reached_end {
            self.emit_time(true);
            debug!("Simulated item {} played to end", item_id);
            self.emit(PlayerSignal::DidPlayToEnd { item: item_id });
            self.set_status(TimeControlStatus::WaitingToPlayAtSpecifiedRate);
        } else {
            self.emit_time(false);
        }
    }

    fn finish_current_item(&mut self) {
        let Some(item) = self.current.as_mut() else {
            return;
        };
        let Some(duration) = item.duration else {
            return;
        };
        let item_id = item.id;
        item.position = duration;
        item.ended = true;

        self.emit_time(true);
        self.emit(PlayerSignal::DidPlayToEnd { item: item_id });
        let status = self.settled_status();
        self.set_status(status);
    }
}

impl LoadedItem {
    fn is_buffered_at(&self, position: f64) -> bool {
        self.buffered
            .iter()
            .any(|range| range.start <= position && position < range.end)
            || self.duration.is_some_and(|duration| position >= duration)
    }

    /// Extend the buffer around the playhead; returns whether it changed
    fn fill_buffer(&mut self, ahead: f64) -> bool {
        let position = self.position;
        let limit = self.duration.unwrap_or(f64::INFINITY);
        let target = (position + ahead).min(limit);

        let index = match self
            .buffered
            .iter()
            .position(|range| range.start <= position && position <= range.end)
        {
            Some(index) => index,
            None => {
                if position >= target {
                    return false;
                }
                self.buffered.push(position..position);
                self.buffered.len() - 1
            }
        };

        if self.buffered[index].end >= target {
            return false;
        }
        self.buffered[index].end = target;
        self.merge_buffered();
        true
    }

    fn merge_buffered(&mut self) {
        self.buffered.sort_by(|a, b| a.start.total_cmp(&b.start));
        let mut merged: Vec<Range<f64>> = Vec::with_capacity(self.buffered.len());
        for range in self.buffered.drain(..) {
            match merged.last_mut() {
                Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
                _ => merged.push(range),
            }
        }
        self.buffered = merged;
    }
}

impl MediaPlayer for SimulatedPlayer {
    fn current_item(&self) -> Option<ItemId> {
        self.lock().current.as_ref().map(|item| item.id)
    }

    fn replace_current_item(&mut self, url: Option<&Url>) -> Option<ItemId> {
        let mut inner = self.lock();

        let loaded = url.map(|url| LoadedItem {
            id: ItemId::new(),
            url: url.clone(),
            duration: inner.catalog.get(url.as_str()).copied(),
            position: 0.0,
            ended: false,
            buffered: Vec::new(),
        });
        inner.current = loaded;
        for sub in inner.subscriptions.iter_mut() {
            sub.last_slot = None;
        }

        let item = inner.current.as_ref().map(|item| item.id);
        debug!("Simulated player loaded {:?} as {:?}", url.map(Url::as_str), item);
        inner.emit(PlayerSignal::CurrentItemChanged { item });
        let status = inner.settled_status();
        inner.set_status(status);
        item
    }

    fn play(&mut self) {
        let mut inner = self.lock();
        inner.wants_to_play = true;
        let status = inner.settled_status();
        inner.set_status(status);
        inner.emit_time(true);
    }

    fn pause(&mut self) {
        let mut inner = self.lock();
        inner.wants_to_play = false;
        inner.set_status(TimeControlStatus::Paused);
        inner.emit_time(true);
    }

    fn seek(&mut self, seconds: f64) {
        let mut inner = self.lock();
        let Some(item) = inner.current.as_mut() else {
            return;
        };
        let limit = item.duration.unwrap_or(f64::INFINITY);
        item.position = seconds.max(0.0).min(limit);
        item.ended = false;

        let status = inner.settled_status();
        inner.set_status(status);
        inner.emit_time(true);
    }

    fn current_time(&self) -> MediaTime {
        match &self.lock().current {
            Some(item) => MediaTime::Seconds(item.position),
            None => MediaTime::Invalid,
        }
    }

    fn current_item_duration(&self) -> Option<MediaTime> {
        self.lock().current.as_ref().map(|item| match item.duration {
            Some(duration) => MediaTime::Seconds(duration),
            None => MediaTime::Indefinite,
        })
    }

    fn volume(&self) -> f32 {
        self.lock().volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.lock().volume = volume;
    }

    fn rate(&self) -> f32 {
        self.lock().rate
    }

    fn set_rate(&mut self, rate: f32) {
        self.lock().rate = rate;
    }

    fn time_control_status(&self) -> TimeControlStatus {
        self.lock().status
    }

    fn loaded_time_ranges(&self) -> Vec<LoadedTimeRange> {
        match &self.lock().current {
            Some(item) => item
                .buffered
                .iter()
                .map(|range| LoadedTimeRange::new(range.start, range.end - range.start))
                .collect(),
            None => Vec::new(),
        }
    }

    fn subscribe(&mut self, kind: SignalKind, sink: SignalSender) -> SubscriptionToken {
        let mut inner = self.lock();
        let id = inner.next_token;
        inner.next_token += 1;
        inner.subscriptions.push(Subscription {
            id,
            kind,
            sink,
            last_slot: None,
        });
        SubscriptionToken(id)
    }

    fn unsubscribe(&mut self, token: SubscriptionToken) {
        self.lock().subscriptions.retain(|sub| sub.id != token.0);
    }
}
