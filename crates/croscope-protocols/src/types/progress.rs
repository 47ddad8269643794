//! Run phases and progress events.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::request::RunId;

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Queued,
    CacheCheck,
    Capturing,
    Analyzing,
    Merging,
    Cached,
    Completed,
    Failed,
}

impl Phase {
    /// Percent complete on entering this phase. `Failed` has no weight of its
    /// own and repeats the last reached percent.
    pub fn weight(&self) -> Option<u8> {
        match self {
            Self::Queued => Some(0),
            Self::CacheCheck => Some(5),
            Self::Capturing => Some(35),
            Self::Analyzing => Some(80),
            Self::Merging => Some(95),
            Self::Cached => Some(98),
            Self::Completed => Some(100),
            Self::Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Legal forward transitions. `Failed` is reachable from every non-terminal state.
    pub fn can_transition_to(&self, next: Phase) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == Self::Failed {
            return true;
        }
        matches!(
            (self, next),
            (Self::Queued, Self::CacheCheck)
                | (Self::CacheCheck, Self::Capturing)
                | (Self::CacheCheck, Self::Completed)
                | (Self::Capturing, Self::Analyzing)
                | (Self::Analyzing, Self::Merging)
                | (Self::Merging, Self::Cached)
                | (Self::Merging, Self::Completed)
                | (Self::Cached, Self::Completed)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Queued => "Queued",
            Self::CacheCheck => "CacheCheck",
            Self::Capturing => "Capturing",
            Self::Analyzing => "Analyzing",
            Self::Merging => "Merging",
            Self::Cached => "Cached",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// One progress update for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub run_id: RunId,
    /// Position of this event within the run, starting at 0.
    pub seq: u32,
    pub phase: Phase,
    pub percent: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub at: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn new(run_id: RunId, seq: u32, phase: Phase, percent: u8) -> Self {
        Self {
            run_id,
            seq,
            phase,
            percent,
            message: None,
            at: Utc::now(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}
