//! `rodio` implementation of [`PlaybackBackend`].
//!
//! `Sink` has no callbacks, so lifecycle events are derived by comparing the
//! sink's queue length with our own record of what was appended. rodio's
//! decoders stop quietly on a corrupt stream, so an item that drops out well
//! before its known length is reported as an error rather than a finish.

use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::time::Duration;

use rodio::mixer::Mixer;
use rodio::{Decoder, Sink, Source};
use tracing::trace;

use crate::error::BackendError;
use crate::library::{Asset, AssetId};

use super::backend::{BackendEvent, PlaybackBackend};

/// How far short of its length an item may stop and still count as finished.
const EARLY_END_MARGIN: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
struct QueuedItem {
    asset: AssetId,
    duration: Option<Duration>,
    /// Last playback position seen while this item was audible.
    heard: Option<Duration>,
}

impl QueuedItem {
    fn ended_early(&self) -> Option<String> {
        let (heard, length) = (self.heard?, self.duration?);
        (heard + EARLY_END_MARGIN < length)
            .then(|| format!("stream ended after {heard:?} of {length:?}"))
    }
}

pub struct RodioBackend {
    sink: Sink,
    items: VecDeque<QueuedItem>,
    /// Skips whose effect on `sink.len()` has not been observed yet.
    unobserved_skips: usize,
    events: Vec<BackendEvent>,
}

impl RodioBackend {
    /// Attach a silent, empty sink to `mixer`.
    pub fn new(mixer: &Mixer) -> Self {
        let sink = Sink::connect_new(mixer);
        sink.set_volume(0.0);
        Self {
            sink,
            items: VecDeque::new(),
            unobserved_skips: 0,
            events: Vec::new(),
        }
    }

    fn sync_with_sink(&mut self) {
        let expected = self.items.len() + self.unobserved_skips;
        let actual = self.sink.len();
        if actual >= expected {
            return;
        }

        let mut dropped = expected - actual;
        let absorbed = dropped.min(self.unobserved_skips);
        self.unobserved_skips -= absorbed;
        dropped -= absorbed;

        for _ in 0..dropped {
            let Some(done) = self.items.pop_front() else {
                break;
            };
            match done.ended_early() {
                Some(reason) => self.events.push(BackendEvent::Error {
                    asset: done.asset,
                    reason,
                }),
                None => {
                    trace!(asset = done.asset, "sink finished item");
                    self.events.push(BackendEvent::Finished(done.asset));
                }
            }
            if let Some(next) = self.items.front() {
                self.events.push(BackendEvent::Started(next.asset));
            }
        }
    }

    /// Record how far the audible item has played. Skipped while one of our
    /// own skips is in flight, when the sink may still report the old item.
    fn observe_position(&mut self) {
        if self.unobserved_skips > 0 {
            return;
        }
        // Position first: if the count still matches afterwards, the
        // position belonged to our front item.
        let pos = self.sink.get_pos();
        if self.sink.len() != self.items.len() {
            return;
        }
        if let Some(front) = self.items.front_mut() {
            front.heard = Some(pos);
        }
    }
}

impl PlaybackBackend for RodioBackend {
    fn enqueue(&mut self, asset: &Asset) -> Result<(), BackendError> {
        let file = File::open(&asset.path).map_err(|source| BackendError::Open {
            path: asset.path.clone(),
            source,
        })?;
        let source = Decoder::new(BufReader::new(file)).map_err(|e| BackendError::Decode {
            path: asset.path.clone(),
            reason: e.to_string(),
        })?;

        let duration = source.total_duration().or(asset.duration);
        self.sync_with_sink();
        self.sink.append(source);
        self.items.push_back(QueuedItem {
            asset: asset.id,
            duration,
            heard: None,
        });
        if self.items.len() == 1 {
            self.events.push(BackendEvent::Started(asset.id));
        }
        Ok(())
    }

    fn gain(&self) -> f32 {
        self.sink.volume()
    }

    fn set_gain(&mut self, gain: f32) {
        self.sink.set_volume(gain);
    }

    fn queue_len(&self) -> usize {
        self.items.len()
    }

    fn current_item_duration(&self) -> Option<Duration> {
        self.items.front().and_then(|i| i.duration)
    }

    fn play(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn resume(&mut self) {
        self.sink.play();
    }

    fn advance_to_next(&mut self) {
        self.sync_with_sink();
        if self.items.pop_front().is_none() {
            return;
        }
        self.sink.skip_one();
        self.unobserved_skips += 1;
        if let Some(next) = self.items.front() {
            self.events.push(BackendEvent::Started(next.asset));
        }
    }

    fn stop(&mut self) {
        self.sink.stop();
        self.items.clear();
        self.unobserved_skips = 0;
    }

    fn poll_events(&mut self) -> Vec<BackendEvent> {
        self.sync_with_sink();
        self.observe_position();
        std::mem::take(&mut self.events)
    }
}
