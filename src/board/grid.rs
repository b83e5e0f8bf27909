//! Full-board occupancy snapshots.
//!
//! A `Grid` is what the rules engine hands out on every `board()` query
//! and what gets pushed into the board-state store after each mutation.

use serde::{Deserialize, Serialize};

use super::piece::Piece;
use super::square::{Square, BOARD_SIZE};

/// An 8x8 arrangement of pieces. Row 0 is rank 8, column 0 is file a.
///
/// Fixed-size arrays keep the snapshot `Copy`, so handing one to the store
/// never aliases engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    rows: [[Option<Piece>; BOARD_SIZE]; BOARD_SIZE],
}

impl Grid {
    /// Creates a grid with no pieces.
    pub fn empty() -> Self {
        Grid::default()
    }

    /// Returns the rows, top (rank 8) first.
    pub fn rows(&self) -> &[[Option<Piece>; BOARD_SIZE]; BOARD_SIZE] {
        &self.rows
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns in each row.
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, |row| row.len())
    }

    /// Returns the piece on a square, if any.
    pub fn get(&self, square: Square) -> Option<Piece> {
        let (x, y) = square.grid();
        self.rows[y][x]
    }

    /// Sets or clears a square.
    pub fn set(&mut self, square: Square, piece: Option<Piece>) {
        let (x, y) = square.grid();
        self.rows[y][x] = piece;
    }

    /// Counts the pieces on the board.
    pub fn piece_count(&self) -> usize {
        self.rows.iter().flatten().filter(|c| c.is_some()).count()
    }
}
