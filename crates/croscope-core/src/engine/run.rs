//! Per-run phase tracking and progress emission.

use std::sync::Arc;

use tracing::{debug, warn};

use croscope_protocols::{AnalysisError, AnalysisFailure, Phase, ProgressEvent, RunId};

use crate::progress::ProgressHub;

/// Owns the phase state of one run and is its single progress writer.
///
/// Percent never decreases: each phase publishes its fixed weight, and
/// `Failed` repeats the last reached percent.
pub(crate) struct RunTracker {
    run_id: RunId,
    phase: Phase,
    percent: u8,
    seq: u32,
    started: bool,
    hub: Arc<ProgressHub>,
}

impl RunTracker {
    pub(crate) fn new(run_id: RunId, hub: Arc<ProgressHub>) -> Self {
        Self {
            run_id,
            phase: Phase::Queued,
            percent: 0,
            seq: 0,
            started: false,
            hub,
        }
    }

    pub(crate) fn run_id(&self) -> RunId {
        self.run_id
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    /// Publish the initial `Queued` event.
    pub(crate) fn start(&mut self) {
        if !self.started {
            self.started = true;
            self.emit(None);
        }
    }

    /// Move to `next` and publish its event. Illegal transitions are logged and ignored.
    pub(crate) fn advance(&mut self, next: Phase, message: Option<String>) {
        if !self.phase.can_transition_to(next) {
            warn!(run_id = %self.run_id, from = %self.phase, to = %next, "Ignoring illegal phase transition");
            return;
        }
        self.phase = next;
        if let Some(weight) = next.weight() {
            self.percent = self.percent.max(weight);
        }
        debug!(run_id = %self.run_id, phase = %next, percent = self.percent, "Run advanced");
        self.emit(message);
    }

    /// Enter `Failed` and build the failure descriptor with the phase reached.
    pub(crate) fn fail(&mut self, error: AnalysisError) -> AnalysisFailure {
        let reached = self.phase;
        self.advance(Phase::Failed, Some(error.to_string()));
        AnalysisFailure::new(self.run_id, reached, error)
    }

    fn emit(&mut self, message: Option<String>) {
        let mut event = ProgressEvent::new(self.run_id, self.seq, self.phase, self.percent);
        event.message = message;
        self.seq += 1;
        self.hub.publish(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_happy_path_percentages() {
        let hub = Arc::new(ProgressHub::new());
        let run_id = RunId::new();
        hub.open(run_id);
        let stream = hub.subscribe(run_id).unwrap();

        let mut run = RunTracker::new(run_id, hub.clone());
        run.start();
        for phase in [
            Phase::CacheCheck,
            Phase::Capturing,
            Phase::Analyzing,
            Phase::Merging,
            Phase::Cached,
            Phase::Completed,
        ] {
            run.advance(phase, None);
        }

        let events: Vec<ProgressEvent> = stream.collect().await;
        let percents: Vec<u8> = events.iter().map(|e| e.percent).collect();
        assert_eq!(percents, vec![0, 5, 35, 80, 95, 98, 100]);
        let seqs: Vec<u32> = events.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, (0..7).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn test_fail_repeats_last_percent() {
        let hub = Arc::new(ProgressHub::new());
        let run_id = RunId::new();
        hub.open(run_id);
        let stream = hub.subscribe(run_id).unwrap();

        let mut run = RunTracker::new(run_id, hub.clone());
        run.start();
        run.advance(Phase::CacheCheck, None);
        run.advance(Phase::Capturing, None);
        let failure = run.fail(AnalysisError::Cancelled);

        assert_eq!(failure.phase, Phase::Capturing);
        assert_eq!(run.phase(), Phase::Failed);

        let events: Vec<ProgressEvent> = stream.collect().await;
        let last = events.last().unwrap();
        assert_eq!(last.phase, Phase::Failed);
        assert_eq!(last.percent, 35);
        assert_eq!(last.message.as_deref(), Some("Run was cancelled"));
    }

    #[tokio::test]
    async fn test_illegal_transition_ignored() {
        let hub = Arc::new(ProgressHub::new());
        let mut run = RunTracker::new(RunId::new(), hub);
        run.start();
        run.advance(Phase::Merging, None);
        assert_eq!(run.phase(), Phase::Queued);
    }
}
