use serde::{Deserialize, Serialize};

/// Percentage at which a source is considered finished.
pub const PROGRESS_COMPLETE: f64 = 100.0;

/// Result text attached to a source that finished successfully.
pub const COMPLETE_INFO: &str = "Search complete: matching records retrieved";

/// Result text attached to a source whose simulated search failed.
pub const ERROR_INFO: &str = "Search failed: source did not respond";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Idle,
    Searching,
    Complete,
    Error,
}

impl SourceStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SourceStatus::Complete | SourceStatus::Error)
    }
}

/// Per-source progress record.
///
/// The variants carry only the fields that are meaningful for their status,
/// so an idle source never has a progress value and only terminal sources
/// carry an info message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProgressState {
    #[default]
    Idle,
    /// `progress` stays in `[0, 100)` while searching.
    Searching { progress: f64 },
    Complete { info: String },
    Error { info: String },
}

impl ProgressState {
    pub fn searching() -> Self {
        ProgressState::Searching { progress: 0.0 }
    }

    pub fn status(&self) -> SourceStatus {
        match self {
            ProgressState::Idle => SourceStatus::Idle,
            ProgressState::Searching { .. } => SourceStatus::Searching,
            ProgressState::Complete { .. } => SourceStatus::Complete,
            ProgressState::Error { .. } => SourceStatus::Error,
        }
    }

    /// Progress percentage; absent while idle and pinned at 100 once terminal.
    pub fn progress(&self) -> Option<f64> {
        match self {
            ProgressState::Idle => None,
            ProgressState::Searching { progress } => Some(*progress),
            ProgressState::Complete { .. } | ProgressState::Error { .. } => {
                Some(PROGRESS_COMPLETE)
            }
        }
    }

    pub fn info(&self) -> Option<&str> {
        match self {
            ProgressState::Complete { info } | ProgressState::Error { info } => Some(info),
            ProgressState::Idle | ProgressState::Searching { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// Applies one tick increment.
    ///
    /// Returns `Some(status)` when the increment carried the source to its
    /// terminal state. Reaching exactly 100 counts as completion.
    pub(crate) fn advance(
        &mut self,
        increment: f64,
        failure_roll: f64,
        failure_probability: f64,
    ) -> Option<SourceStatus> {
        let ProgressState::Searching { progress } = self else {
            return None;
        };
        let next = *progress + increment.max(0.0);
        if next < PROGRESS_COMPLETE {
            *progress = next;
            return None;
        }

        *self = if failure_roll < failure_probability {
            ProgressState::Error {
                info: ERROR_INFO.to_string(),
            }
        } else {
            ProgressState::Complete {
                info: COMPLETE_INFO.to_string(),
            }
        };
        Some(self.status())
    }
}
