//! Playback backends.
//!
//! A track drives exactly one [`PlaybackBackend`]. The production backend
//! wraps a `rodio::Sink` attached to the shared output mixer, which is where
//! the tracks' audio is summed.

mod backend;
mod sink;

pub use backend::{BackendEvent, PlaybackBackend};
pub use sink::RodioBackend;
