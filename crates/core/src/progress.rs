//! Per-publication progress shared across a run.
//!
//! Each orchestrator owns a [`ProgressHandle`] and is the only writer of its
//! publication's [`ProgressState`]. The handle publishes snapshots to the
//! run-wide [`ProgressBoard`], which the CLI polls to draw its ticker.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Stage of a publication's archive run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Fetching,
    Processing,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Fetching => write!(f, "fetching"),
            Phase::Processing => write!(f, "processing"),
            Phase::Done => write!(f, "done"),
        }
    }
}

/// Snapshot of one publication's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressState {
    /// Posts seen so far. Never decreases.
    pub seen: usize,
    /// Number of records returned by the listing, once known.
    pub total: Option<usize>,
    pub phase: Phase,
}

impl ProgressState {
    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }
}

/// Run-wide view of every publication in flight.
#[derive(Debug, Clone, Default)]
pub struct ProgressBoard {
    entries: Arc<Mutex<BTreeMap<String, ProgressState>>>,
}

impl ProgressBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a publication and returns the handle that owns its state.
    pub fn register(&self, handle: &str) -> ProgressHandle {
        self.lock().insert(handle.to_string(), ProgressState::default());
        ProgressHandle { board: self.clone(), handle: handle.to_string(), state: ProgressState::default() }
    }

    /// Current state of every registered publication, ordered by handle.
    pub fn snapshot(&self) -> Vec<(String, ProgressState)> {
        self.lock().iter().map(|(k, v)| (k.clone(), *v)).collect()
    }

    pub fn get(&self, handle: &str) -> Option<ProgressState> {
        self.lock().get(handle).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn publish(&self, handle: &str, state: ProgressState) {
        self.lock().insert(handle.to_string(), state);
    }

    fn remove(&self, handle: &str) {
        self.lock().remove(handle);
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, ProgressState>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Exclusive writer of one publication's progress.
///
/// The publication is removed from the board when the handle is finished or
/// dropped.
#[derive(Debug)]
pub struct ProgressHandle {
    board: ProgressBoard,
    handle: String,
    state: ProgressState,
}

impl ProgressHandle {
    pub fn state(&self) -> ProgressState {
        self.state
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.state.phase = phase;
        self.board.publish(&self.handle, self.state);
    }

    pub fn set_total(&mut self, total: usize) {
        self.state.total = Some(total);
        self.board.publish(&self.handle, self.state);
    }

    /// Counts one more post as seen.
    pub fn advance(&mut self) {
        self.state.seen += 1;
        self.board.publish(&self.handle, self.state);
    }

    /// Marks the publication done and unregisters it.
    pub fn finish(mut self) -> ProgressState {
        self.set_phase(Phase::Done);
        self.state
    }
}

impl Drop for ProgressHandle {
    fn drop(&mut self) {
        self.board.remove(&self.handle);
    }
}
