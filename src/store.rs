//! Board-state store.
//!
//! The coordination layer pushes a fresh grid snapshot here after every
//! engine mutation; downstream views re-render from it. The layer itself
//! never reads the store back.

use tracing::trace;

use crate::board::Grid;

/// Write-only sink for board snapshots.
pub trait BoardStore {
    fn set_board(&mut self, grid: Grid);
}

/// Keeps the most recent snapshot and counts how many were pushed.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    snapshot: Option<Grid>,
    revision: u64,
}

impl SnapshotStore {
    pub fn new() -> Self {
        SnapshotStore::default()
    }

    /// Creates a store already holding `grid`, without bumping the revision.
    pub fn with_board(grid: Grid) -> Self {
        SnapshotStore {
            snapshot: Some(grid),
            revision: 0,
        }
    }

    /// The latest snapshot, if one was ever pushed.
    pub fn snapshot(&self) -> Option<&Grid> {
        self.snapshot.as_ref()
    }

    /// Number of `set_board` calls received.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl BoardStore for SnapshotStore {
    fn set_board(&mut self, grid: Grid) {
        self.snapshot = Some(grid);
        self.revision += 1;
        trace!(revision = self.revision, pieces = grid.piece_count(), "board snapshot stored");
    }
}
