//! Tracks: independently running channels that crossfade between assets.
//!
//! [`Track`] is the crossfade state machine. It never sleeps or spawns; time
//! is passed in, which keeps it deterministic under test. [`spawn_track`]
//! runs one on its own thread against a real clock.

mod driver;
mod machine;
mod params;

pub use driver::{TrackCmd, TrackHandle, TrackStatus, spawn_track};
pub use machine::{EngineTiming, Track, TrackState};
pub use params::{FloatRange, TrackId, TrackParams};
