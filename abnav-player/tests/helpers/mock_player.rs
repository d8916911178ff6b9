//! Scriptable MediaPlayer for navigator tests
//!
//! Clones share state, so a test keeps one handle while the navigator owns
//! another. Signals are only sent when the test calls `emit`, except
//! `CurrentItemChanged`, which `replace_current_item` sends like a real
//! player would.

use abnav_player::player::{
    ItemId, LoadedTimeRange, MediaPlayer, MediaTime, PlayerSignal, SignalKind, SignalSender,
    SubscriptionToken, TimeControlStatus,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use url::Url;

/// Player method invocations, in call order
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCall {
    Load(Option<Url>),
    Play,
    Pause,
    Seek(f64),
    SetVolume(f32),
    SetRate(f32),
}

#[derive(Clone, Default)]
pub struct MockPlayer {
    state: Arc<Mutex<MockState>>,
}

struct MockState {
    calls: Vec<PlayerCall>,
    durations: HashMap<String, f64>,
    current: Option<(ItemId, Url)>,
    time: MediaTime,
    volume: f32,
    rate: f32,
    status: TimeControlStatus,
    ranges: Vec<LoadedTimeRange>,
    subscriptions: Vec<(u64, SignalKind, SignalSender)>,
    next_token: u64,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            durations: HashMap::new(),
            current: None,
            time: MediaTime::Invalid,
            volume: 1.0,
            rate: 1.0,
            status: TimeControlStatus::Paused,
            ranges: Vec::new(),
            subscriptions: Vec::new(),
            next_token: 1,
        }
    }
}

impl MockState {
    fn send(&self, signal: PlayerSignal) {
        for (_, kind, sink) in &self.subscriptions {
            if signal.matches(kind) {
                let _ = sink.send(signal.clone());
            }
        }
    }
}

impl MockPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn register_duration(&self, url: &Url, seconds: f64) {
        self.lock().durations.insert(url.to_string(), seconds);
    }

    pub fn calls(&self) -> Vec<PlayerCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Number of `Load` calls recorded
    pub fn load_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, PlayerCall::Load(_)))
            .count()
    }

    pub fn subscription_count(&self) -> usize {
        self.lock().subscriptions.len()
    }

    /// Intervals of the registered periodic time subscriptions
    pub fn periodic_intervals(&self) -> Vec<Duration> {
        self.lock()
            .subscriptions
            .iter()
            .filter_map(|(_, kind, _)| match kind {
                SignalKind::PeriodicTime { interval } => Some(*interval),
                _ => None,
            })
            .collect()
    }

    /// Deliver `signal` to matching subscriptions
    pub fn emit(&self, signal: PlayerSignal) {
        self.lock().send(signal);
    }

    /// Move the playhead without recording a seek
    pub fn set_time(&self, seconds: f64) {
        self.lock().time = MediaTime::Seconds(seconds);
    }

    /// Change status and notify subscribers
    pub fn set_status(&self, status: TimeControlStatus) {
        let mut state = self.lock();
        state.status = status;
        state.send(PlayerSignal::TimeControlStatusChanged { status });
    }

    pub fn set_loaded_ranges(&self, ranges: Vec<LoadedTimeRange>) {
        self.lock().ranges = ranges;
    }
}

impl MediaPlayer for MockPlayer {
    fn current_item(&self) -> Option<ItemId> {
        self.lock().current.as_ref().map(|(id, _)| *id)
    }

    fn replace_current_item(&mut self, url: Option<&Url>) -> Option<ItemId> {
        let mut state = self.lock();
        state.calls.push(PlayerCall::Load(url.cloned()));
        state.current = url.map(|url| (ItemId::new(), url.clone()));
        state.time = match state.current {
            Some(_) => MediaTime::Seconds(0.0),
            None => MediaTime::Invalid,
        };
        state.ranges.clear();

        let item = state.current.as_ref().map(|(id, _)| *id);
        state.send(PlayerSignal::CurrentItemChanged { item });
        item
    }

    fn play(&mut self) {
        self.lock().calls.push(PlayerCall::Play);
    }

    fn pause(&mut self) {
        self.lock().calls.push(PlayerCall::Pause);
    }

    fn seek(&mut self, seconds: f64) {
        let mut state = self.lock();
        state.calls.push(PlayerCall::Seek(seconds));
        state.time = MediaTime::Seconds(seconds);
    }

    fn current_time(&self) -> MediaTime {
        self.lock().time
    }

    fn current_item_duration(&self) -> Option<MediaTime> {
        let state = self.lock();
        let (_, url) = state.current.as_ref()?;
        Some(match state.durations.get(url.as_str()) {
            Some(seconds) => MediaTime::Seconds(*seconds),
            None => MediaTime::Indefinite,
        })
    }

    fn volume(&self) -> f32 {
        self.lock().volume
    }

    fn set_volume(&mut self, volume: f32) {
        let mut state = self.lock();
        state.calls.push(PlayerCall::SetVolume(volume));
        state.volume = volume;
    }

    fn rate(&self) -> f32 {
        self.lock().rate
    }

    fn set_rate(&mut self, rate: f32) {
        let mut state = self.lock();
        state.calls.push(PlayerCall::SetRate(rate));
        state.rate = rate;
    }

    fn time_control_status(&self) -> TimeControlStatus {
        self.lock().status
    }

    fn loaded_time_ranges(&self) -> Vec<LoadedTimeRange> {
        self.lock().ranges.clone()
    }

    fn subscribe(&mut self, kind: SignalKind, sink: SignalSender) -> SubscriptionToken {
        let mut state = self.lock();
        let id = state.next_token;
        state.next_token += 1;
        state.subscriptions.push((id, kind, sink));
        SubscriptionToken::new(id)
    }

    fn unsubscribe(&mut self, token: SubscriptionToken) {
        self.lock().subscriptions.retain(|(id, _, _)| *id != token.id());
    }
}
