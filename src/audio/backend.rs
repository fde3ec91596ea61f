use std::time::Duration;

use crate::error::BackendError;
use crate::library::{Asset, AssetId};

/// Lifecycle notifications, collected by polling the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    /// The asset became the audible item.
    Started(AssetId),
    /// The asset played to its end.
    Finished(AssetId),
    /// The asset failed while playing.
    Error { asset: AssetId, reason: String },
}

/// The narrow surface a track needs from a media player.
///
/// Items play in queue order; the front item is "current", the rest are
/// pending and picked up gaplessly when the current one ends.
pub trait PlaybackBackend: Send {
    /// Append `asset` to the queue.
    fn enqueue(&mut self, asset: &Asset) -> Result<(), BackendError>;

    fn gain(&self) -> f32;

    fn set_gain(&mut self, gain: f32);

    /// Current plus pending items.
    fn queue_len(&self) -> usize;

    fn pending_count(&self) -> usize {
        self.queue_len().saturating_sub(1)
    }

    fn current_item_duration(&self) -> Option<Duration>;

    fn play(&mut self);

    fn pause(&mut self);

    fn resume(&mut self);

    /// Drop the current item and start the next pending one.
    fn advance_to_next(&mut self);

    /// Drop everything. Called once at teardown.
    fn stop(&mut self);

    /// Drain lifecycle events observed since the last call.
    fn poll_events(&mut self) -> Vec<BackendEvent>;
}
