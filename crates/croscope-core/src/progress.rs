//! Per-run progress broadcast.
//!
//! Each run gets one broadcast channel with a single writer (the engine).
//! Subscribers see events from the point they attach; there is no replay and
//! no history once the run ends.

use std::pin::Pin;

use dashmap::DashMap;
use futures::Stream;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use croscope_protocols::{ProgressEvent, RunId};

/// Finite stream of progress events; ends after `Completed` or `Failed`.
pub type ProgressStream = Pin<Box<dyn Stream<Item = ProgressEvent> + Send>>;

const DEFAULT_CAPACITY: usize = 32;

pub struct ProgressHub {
    channels: DashMap<RunId, broadcast::Sender<ProgressEvent>>,
    capacity: usize,
}

impl ProgressHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Create the channel for a run. Must happen before its first event.
    pub fn open(&self, run_id: RunId) {
        let (tx, _) = broadcast::channel(self.capacity);
        self.channels.insert(run_id, tx);
    }

    /// Publish an event. Dropped silently when nobody is subscribed; a
    /// terminal event also closes the channel.
    pub fn publish(&self, event: ProgressEvent) {
        let run_id = event.run_id;
        let terminal = event.is_terminal();

        if let Some(tx) = self.channels.get(&run_id) {
            if tx.send(event).is_err() {
                debug!(run_id = %run_id, "No progress subscribers");
            }
        }

        if terminal {
            self.close(run_id);
        }
    }

    /// Subscribe to a live run. `None` once the run has ended or if it never existed.
    pub fn subscribe(&self, run_id: RunId) -> Option<ProgressStream> {
        let rx = self.channels.get(&run_id)?.subscribe();
        Some(Box::pin(event_stream(run_id, rx)))
    }

    /// Drop the run's channel; open streams end after draining buffered events.
    pub fn close(&self, run_id: RunId) {
        self.channels.remove(&run_id);
    }

    pub fn is_open(&self, run_id: RunId) -> bool {
        self.channels.contains_key(&run_id)
    }

    pub fn subscriber_count(&self, run_id: RunId) -> usize {
        self.channels
            .get(&run_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for ProgressHub {
    fn default() -> Self {
        Self::new()
    }
}

fn event_stream(
    run_id: RunId,
    mut rx: broadcast::Receiver<ProgressEvent>,
) -> impl Stream<Item = ProgressEvent> + Send {
    async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let terminal = event.is_terminal();
                    yield event;
                    if terminal {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(run_id = %run_id, skipped, "Progress subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}
