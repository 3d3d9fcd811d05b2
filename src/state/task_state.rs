/// Task state definitions for tracking crawl progress
///
/// Every fetch task moves from `Queued` through `Fetched` to exactly one terminal state.
use crate::TaskError;
use std::fmt;

/// Represents the current state of a fetch task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskState {
    // ===== Active States =====
    /// Task is queued and waiting for a free slot
    Queued,

    /// A response arrived and is about to be classified
    Fetched,

    // ===== Terminal Success States =====
    /// Tags were extracted and written to a new file
    Written,

    // ===== Terminal Skip States =====
    /// Task host is not on the allow-list, never fetched
    DomainRejected,

    /// Response was reached through a redirect, extraction skipped
    Redirected,

    // ===== Terminal Error States =====
    /// Network failure, timeout, or non-2xx status
    FetchFailed,

    /// Tags container missing or no tags matched
    ExtractionFailed,

    /// Output file could not be created or written
    WriteFailed,
}

impl TaskState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if this is an active state (task may still be processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Fetched)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Written)
    }

    /// Returns true if this represents a skip state
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::DomainRejected | Self::Redirected)
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::FetchFailed | Self::ExtractionFailed | Self::WriteFailed
        )
    }

    /// Maps a task failure onto the terminal state it leaves the task in
    pub fn from_error(error: &TaskError) -> Self {
        match error {
            TaskError::DomainRejected { .. } => Self::DomainRejected,
            TaskError::RedirectDetected { .. } => Self::Redirected,
            TaskError::Fetch(_) => Self::FetchFailed,
            TaskError::Extraction { .. } => Self::ExtractionFailed,
            TaskError::Write { .. } => Self::WriteFailed,
        }
    }

    /// Short lowercase label used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Fetched => "fetched",
            Self::Written => "written",
            Self::DomainRejected => "domain_rejected",
            Self::Redirected => "redirected",
            Self::FetchFailed => "fetch_failed",
            Self::ExtractionFailed => "extraction_failed",
            Self::WriteFailed => "write_failed",
        }
    }

    /// Returns all terminal states, in report order
    pub fn terminal_states() -> [Self; 6] {
        [
            Self::Written,
            Self::DomainRejected,
            Self::Redirected,
            Self::FetchFailed,
            Self::ExtractionFailed,
            Self::WriteFailed,
        ]
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
