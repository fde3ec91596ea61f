use std::time::Duration;

use crate::config::TrackDescriptor;

pub type TrackId = i64;

/// A closed interval `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatRange {
    lower: f32,
    upper: f32,
}

impl FloatRange {
    /// Bounds are reordered if given backwards.
    pub fn new(a: f32, b: f32) -> Self {
        if a <= b {
            Self { lower: a, upper: b }
        } else {
            Self { lower: b, upper: a }
        }
    }

    pub fn lower(&self) -> f32 {
        self.lower
    }

    pub fn upper(&self) -> f32 {
        self.upper
    }
}

/// Construction-time parameters of a track. Immutable once built.
///
/// Only `volume.upper` and `fade_in_time.lower` shape the envelope. The
/// fade-out ramp deliberately reuses the fade-in bound, so `fade_out_time`,
/// `duration` and `dead_air` are carried for callers but never read here.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackParams {
    pub id: TrackId,
    pub volume: FloatRange,
    pub duration: FloatRange,
    pub dead_air: FloatRange,
    pub fade_in_time: FloatRange,
    pub fade_out_time: FloatRange,
    pub repeat_recordings: bool,
}

impl TrackParams {
    /// Gain every envelope ramps up to.
    pub fn peak_gain(&self) -> f32 {
        self.volume.upper()
    }

    /// Gain change for `elapsed` wall-clock time, in either direction.
    /// A zero fade time makes ramps instantaneous.
    pub fn ramp_step(&self, elapsed: Duration) -> f32 {
        let secs = self.fade_in_time.lower();
        if secs <= 0.0 {
            f32::INFINITY
        } else {
            elapsed.as_secs_f32() / secs
        }
    }

    /// How far ahead of an item's end the natural-end crossfade starts.
    pub fn fade_lead(&self) -> Duration {
        Duration::try_from_secs_f32(self.fade_in_time.lower()).unwrap_or(Duration::ZERO)
    }
}

impl From<&TrackDescriptor> for TrackParams {
    fn from(d: &TrackDescriptor) -> Self {
        Self {
            id: d.id,
            volume: FloatRange::new(d.minvolume, d.maxvolume),
            duration: FloatRange::new(d.minduration, d.maxduration),
            dead_air: FloatRange::new(d.mindeadair, d.maxdeadair),
            fade_in_time: FloatRange::new(d.minfadeintime, d.maxfadeintime),
            fade_out_time: FloatRange::new(d.minfadeouttime, d.maxfadeouttime),
            repeat_recordings: d.repeatrecordings,
        }
    }
}
