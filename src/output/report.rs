//! Crawl run summary
//!
//! Counts how every task ended and remembers which files were written.

use crate::state::TaskState;
use crate::TaskError;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Summary of one crawl run
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Tasks per terminal state
    pub by_state: BTreeMap<TaskState, u64>,

    /// Files written, in completion order
    pub written: Vec<PathBuf>,

    pub start_time: Option<Instant>,
    pub end_time: Option<Instant>,
}

impl CrawlReport {
    /// An empty report with the clock started
    pub fn started() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Self::default()
        }
    }

    /// Stops the clock
    pub fn finish(&mut self) {
        self.end_time = Some(Instant::now());
    }

    pub fn record_written(&mut self, path: PathBuf) {
        self.record_state(TaskState::Written);
        self.written.push(path);
    }

    pub fn record_error(&mut self, error: &TaskError) {
        self.record_state(TaskState::from_error(error));
    }

    /// Counts `count` more tasks as having ended in `state`
    pub fn record_state_n(&mut self, state: TaskState, count: u64) {
        if count > 0 {
            *self.by_state.entry(state).or_insert(0) += count;
        }
    }

    fn record_state(&mut self, state: TaskState) {
        self.record_state_n(state, 1);
    }

    /// Tasks that ended in `state`
    pub fn count(&self, state: TaskState) -> u64 {
        self.by_state.get(&state).copied().unwrap_or(0)
    }

    /// Tasks whose tags were written
    pub fn succeeded(&self) -> u64 {
        self.count(TaskState::Written)
    }

    /// Tasks that were skipped or failed
    pub fn failed(&self) -> u64 {
        self.by_state
            .iter()
            .filter(|(state, _)| !state.is_success())
            .map(|(_, count)| count)
            .sum()
    }

    /// All tasks that reached a terminal state
    pub fn total(&self) -> u64 {
        self.by_state.values().sum()
    }

    pub fn duration(&self) -> Option<Duration> {
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            Some(end.duration_since(start))
        } else {
            None
        }
    }

    /// Writes the summary to stderr
    pub fn write_to_stderr(&self) {
        let stderr = io::stderr();
        let mut handle = stderr.lock();
        let _ = self.write_to(&mut handle);
    }

    /// Writes the summary to any writer
    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "\n=== Crawl Statistics ===")?;
        writeln!(out, "Tags written: {}", self.succeeded())?;
        for state in TaskState::terminal_states() {
            if state.is_success() {
                continue;
            }
            let count = self.count(state);
            if count > 0 {
                writeln!(out, "  {}: {}", state, count)?;
            }
        }
        writeln!(out, "Total tasks: {}", self.total())?;
        if let Some(duration) = self.duration() {
            writeln!(out, "Total duration: {:.2}s", duration.as_secs_f64())?;
        }
        writeln!(out, "========================")
    }
}
