//! Cancellable single-slot timer driving volume envelopes.
//!
//! The timer does not own a thread. Its owner asks for the next deadline,
//! sleeps until then, and calls [`EnvelopeTimer::poll`] with the current
//! time. Because there is a single slot, at most one timer is ever live and
//! `start` always replaces (cancels) the previous one.

use std::time::{Duration, Instant};

/// A fired tick. `elapsed` is wall-clock time since the previous tick (or
/// since the timer was started), excluding time spent paused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick<K> {
    pub kind: K,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Armed<K> {
    kind: K,
    interval: Duration,
    repeating: bool,
    deadline: Instant,
    last_fire: Instant,
    paused_at: Option<Instant>,
}

#[derive(Debug)]
pub struct EnvelopeTimer<K> {
    armed: Option<Armed<K>>,
}

impl<K> Default for EnvelopeTimer<K> {
    fn default() -> Self {
        Self { armed: None }
    }
}

impl<K: Copy> EnvelopeTimer<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer. Returns `true` when a live timer was cancelled to make room.
    pub fn start(&mut self, interval: Duration, repeating: bool, kind: K, now: Instant) -> bool {
        let replaced = self.cancel();
        self.armed = Some(Armed {
            kind,
            interval,
            repeating,
            deadline: now + interval,
            last_fire: now,
            paused_at: None,
        });
        replaced
    }

    /// Disarm the timer. Safe to call when nothing is armed. Returns whether
    /// a live timer was cancelled.
    pub fn cancel(&mut self) -> bool {
        self.armed.take().is_some()
    }

    pub fn is_live(&self) -> bool {
        self.armed.is_some()
    }

    pub fn kind(&self) -> Option<K> {
        self.armed.map(|a| a.kind)
    }

    /// When the next tick is due. `None` when idle or paused.
    pub fn deadline(&self) -> Option<Instant> {
        self.armed
            .filter(|a| a.paused_at.is_none())
            .map(|a| a.deadline)
    }

    /// Freeze the timer; the remaining time is preserved for `resume`.
    pub fn pause(&mut self, now: Instant) {
        if let Some(a) = self.armed.as_mut() {
            if a.paused_at.is_none() {
                a.paused_at = Some(now);
            }
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if let Some(a) = self.armed.as_mut() {
            if let Some(paused_at) = a.paused_at.take() {
                let frozen = now.saturating_duration_since(paused_at);
                a.deadline += frozen;
                a.last_fire += frozen;
            }
        }
    }

    /// Fire at most one tick if the deadline has passed. One-shot timers
    /// disarm themselves when they fire.
    pub fn poll(&mut self, now: Instant) -> Option<Tick<K>> {
        let a = self.armed.as_mut()?;
        if a.paused_at.is_some() || now < a.deadline {
            return None;
        }

        let tick = Tick {
            kind: a.kind,
            elapsed: now.saturating_duration_since(a.last_fire),
        };

        if a.repeating {
            a.last_fire = now;
            a.deadline += a.interval;
            if a.deadline <= now {
                // Fell behind; the next tick's `elapsed` covers the gap.
                a.deadline = now + a.interval;
            }
        } else {
            self.armed = None;
        }
        Some(tick)
    }
}
