use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::audio::{BackendEvent, PlaybackBackend};
use crate::config::SessionSettings;
use crate::library::{Asset, AssetId};
use crate::playlist::{AssetRequest, AssetSource};
use crate::timer::{EnvelopeTimer, Tick};

use super::params::{TrackId, TrackParams};

/// Where a track is in its crossfade cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    /// Nothing queued or playing; waiting to retry the asset source.
    Idle,
    FadingOut,
    FadingIn,
    /// Steady playback at peak gain.
    Holding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Envelope {
    FadeOut { premature: bool },
    FadeIn,
    NaturalEnd,
    Retry,
}

/// Clock-related knobs shared by every track in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineTiming {
    pub tick_interval: Duration,
    pub retry_interval: Duration,
    pub max_enqueue_attempts: u32,
}

impl Default for EngineTiming {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(50),
            retry_interval: Duration::from_secs(5),
            max_enqueue_attempts: 3,
        }
    }
}

impl From<&SessionSettings> for EngineTiming {
    fn from(s: &SessionSettings) -> Self {
        Self {
            tick_interval: s.tick_interval(),
            retry_interval: s.retry_interval(),
            max_enqueue_attempts: s.max_enqueue_attempts.max(1),
        }
    }
}

/// One continuously faded audio channel.
///
/// Owns its backend and its single envelope timer. All methods take the
/// current time so the owner decides what clock drives the track.
pub struct Track<B> {
    params: TrackParams,
    source: Arc<dyn AssetSource>,
    backend: B,
    timer: EnvelopeTimer<Envelope>,
    timing: EngineTiming,
    state: TrackState,
    current: Option<Asset>,
    pending: Option<Asset>,
    /// When the pending asset became audible on its own (queued into an
    /// empty backend, or the previous item ran out mid fade-out).
    pending_started: Option<Instant>,
    paused: bool,
    // Playback position of the current item, excluding paused time.
    item_started: Option<Instant>,
    item_accumulated: Duration,
}

impl<B: PlaybackBackend> Track<B> {
    pub fn new(
        params: TrackParams,
        source: Arc<dyn AssetSource>,
        mut backend: B,
        timing: EngineTiming,
    ) -> Self {
        let gain = backend.gain().clamp(0.0, params.peak_gain());
        backend.set_gain(gain);
        backend.play();
        Self {
            params,
            source,
            backend,
            timer: EnvelopeTimer::new(),
            timing,
            state: TrackState::Idle,
            current: None,
            pending: None,
            pending_started: None,
            paused: false,
            item_started: None,
            item_accumulated: Duration::ZERO,
        }
    }

    pub fn id(&self) -> TrackId {
        self.params.id
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    pub fn gain(&self) -> f32 {
        self.backend.gain()
    }

    pub fn current(&self) -> Option<&Asset> {
        self.current.as_ref()
    }

    pub fn pending(&self) -> Option<&Asset> {
        self.pending.as_ref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn has_live_timer(&self) -> bool {
        self.timer.is_live()
    }

    /// When `poll` next has timer work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    /// Move on from the current asset. `premature` means the current asset
    /// is being cut short rather than reaching its end.
    pub fn advance(&mut self, premature: bool, now: Instant) {
        self.timer.cancel();

        // A transition already in flight keeps its pending asset; this call
        // only restarts the fade-out.
        if self.pending.is_none() {
            let audible = self.backend.queue_len() > 0;
            if !self.queue_next() {
                self.hold(now);
                return;
            }
            if !audible {
                self.backend.set_gain(0.0);
            }
        }

        debug!(track = self.params.id, premature, "fading out");
        self.state = TrackState::FadingOut;
        self.arm(
            self.timing.tick_interval,
            true,
            Envelope::FadeOut { premature },
            now,
        );
    }

    pub fn pause(&mut self, now: Instant) {
        if self.paused {
            return;
        }
        self.paused = true;
        self.backend.pause();
        self.timer.pause(now);
        if let Some(started) = self.item_started.take() {
            self.item_accumulated += now.saturating_duration_since(started);
        }
        debug!(track = self.params.id, "paused");
    }

    pub fn resume(&mut self, now: Instant) {
        if !self.paused {
            return;
        }
        self.paused = false;
        self.backend.resume();
        self.timer.resume(now);
        if self.current.is_some() {
            self.item_started = Some(now);
        }
        debug!(track = self.params.id, "resumed");

        if self.state == TrackState::Idle {
            self.advance(false, now);
        }
    }

    /// Process backend events and any timer ticks due at `now`.
    pub fn poll(&mut self, now: Instant) {
        for event in self.backend.poll_events() {
            self.on_backend_event(event, now);
        }
        while let Some(tick) = self.timer.poll(now) {
            self.on_tick(tick, now);
        }
    }

    /// Cancel the timer before releasing the backend so nothing fires
    /// against a stopped sink.
    pub fn shutdown(&mut self) {
        self.timer.cancel();
        self.backend.stop();
        self.source.release(self.params.id);
        self.state = TrackState::Idle;
        self.current = None;
        self.pending = None;
        self.pending_started = None;
        self.item_started = None;
        self.item_accumulated = Duration::ZERO;
        debug!(track = self.params.id, "shut down");
    }

    /// Every timer goes through here so one armed while paused stays frozen
    /// until `resume`.
    fn arm(&mut self, interval: Duration, repeating: bool, kind: Envelope, now: Instant) {
        self.timer.start(interval, repeating, kind, now);
        if self.paused {
            self.timer.pause(now);
        }
    }

    fn queue_next(&mut self) -> bool {
        let request = AssetRequest {
            track: self.params.id,
            repeat_recordings: self.params.repeat_recordings,
        };

        for attempt in 1..=self.timing.max_enqueue_attempts {
            let Some(asset) = self.source.next(request) else {
                debug!(track = self.params.id, "no asset available");
                return false;
            };
            match self.backend.enqueue(&asset) {
                Ok(()) => {
                    debug!(track = self.params.id, asset = asset.id, title = %asset.title, "queued");
                    self.pending = Some(asset);
                    self.pending_started = None;
                    return true;
                }
                Err(e) => {
                    warn!(track = self.params.id, asset = asset.id, attempt, error = %e, "backend rejected asset");
                }
            }
        }
        false
    }

    /// Nothing new to play: keep whatever is audible, or go idle.
    fn hold(&mut self, now: Instant) {
        if self.backend.queue_len() == 0 {
            self.go_idle(now);
            return;
        }
        if self.backend.gain() < self.params.peak_gain() {
            // An interrupted fade: bring the current asset back up.
            self.state = TrackState::FadingIn;
            self.arm(self.timing.tick_interval, true, Envelope::FadeIn, now);
        } else {
            self.state = TrackState::Holding;
        }
    }

    fn go_idle(&mut self, now: Instant) {
        self.source.release(self.params.id);
        self.state = TrackState::Idle;
        self.current = None;
        self.item_started = None;
        self.item_accumulated = Duration::ZERO;
        self.arm(self.timing.retry_interval, false, Envelope::Retry, now);
        debug!(track = self.params.id, retry_in = ?self.timing.retry_interval, "idle");
    }

    fn fade_in_next(&mut self, premature: bool, now: Instant) {
        if self.backend.pending_count() > 0 {
            self.backend.advance_to_next();
            self.promote_pending(now, now);
        } else if self.pending.is_some() {
            // Already the audible item; skipping would cut it off.
            let started = self.pending_started.unwrap_or(now);
            self.promote_pending(started, now);
        }

        if self.backend.queue_len() == 0 {
            // Nothing to fade into.
            self.go_idle(now);
            return;
        }

        debug!(track = self.params.id, premature, "fading in");
        self.state = TrackState::FadingIn;
        self.arm(self.timing.tick_interval, true, Envelope::FadeIn, now);
    }

    fn promote_pending(&mut self, started: Instant, now: Instant) {
        self.current = self.pending.take();
        self.pending_started = None;
        self.item_accumulated = Duration::ZERO;
        if self.paused {
            self.item_accumulated = now.saturating_duration_since(started);
            self.item_started = None;
        } else {
            self.item_started = Some(started);
        }
    }

    fn item_position(&self, now: Instant) -> Duration {
        self.item_accumulated
            + self
                .item_started
                .map_or(Duration::ZERO, |s| now.saturating_duration_since(s))
    }

    fn reach_peak(&mut self, now: Instant) {
        self.state = TrackState::Holding;
        match self.backend.current_item_duration() {
            Some(length) => {
                // One tick of slack so the fade-out lands before the item ends.
                let delay = length
                    .saturating_sub(self.item_position(now))
                    .saturating_sub(self.params.fade_lead())
                    .saturating_sub(self.timing.tick_interval);
                trace!(track = self.params.id, ?delay, "natural end scheduled");
                self.arm(delay, false, Envelope::NaturalEnd, now);
            }
            None => {
                debug!(track = self.params.id, "item length unknown; waiting for it to finish");
            }
        }
    }

    fn on_tick(&mut self, tick: Tick<Envelope>, now: Instant) {
        let peak = self.params.peak_gain();
        match tick.kind {
            Envelope::FadeOut { premature } => {
                let gain = self.backend.gain() - self.params.ramp_step(tick.elapsed);
                if gain <= 0.0 {
                    self.backend.set_gain(0.0);
                    self.timer.cancel();
                    self.fade_in_next(premature, now);
                } else {
                    self.backend.set_gain(gain.min(peak));
                }
            }
            Envelope::FadeIn => {
                let gain = self.backend.gain() + self.params.ramp_step(tick.elapsed);
                if gain >= peak {
                    self.backend.set_gain(peak);
                    self.timer.cancel();
                    self.reach_peak(now);
                } else {
                    self.backend.set_gain(gain.max(0.0));
                }
            }
            Envelope::NaturalEnd | Envelope::Retry => self.advance(false, now),
        }
    }

    fn on_backend_event(&mut self, event: BackendEvent, now: Instant) {
        trace!(track = self.params.id, ?event, "backend event");
        match event {
            BackendEvent::Started(id) => {
                if self.pending.as_ref().map(|a| a.id) == Some(id) {
                    self.pending_started = Some(now);
                }
            }
            BackendEvent::Finished(id) => self.on_item_ended(id, now),
            BackendEvent::Error { asset, reason } => {
                warn!(track = self.params.id, asset, %reason, "playback failed");
                self.on_item_ended(asset, now);
            }
        }
    }

    /// A finished (or failed) item counts as a natural end. When a fade-out
    /// is already running, `advance` just restarts it without queueing more.
    fn on_item_ended(&mut self, id: AssetId, now: Instant) {
        let is_current = self.current.as_ref().map(|a| a.id) == Some(id);
        if is_current {
            self.current = None;
            self.item_started = None;
            self.item_accumulated = Duration::ZERO;
        }
        if is_current || self.state == TrackState::FadingOut {
            self.advance(false, now);
        }
    }
}
