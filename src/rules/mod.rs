//! Rules engine adapter.
//!
//! The coordination layer never decides legality itself; it talks to an
//! engine through the `RulesEngine` trait. `standard::StandardChess` is the
//! adapter over `shakmaty` used by the binary.

pub mod standard;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{Color, Grid, Piece, PieceKind, Square};

pub use standard::StandardChess;

/// Errors reported by a rules engine for rejected mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("resulting position is invalid: {0}")]
    InvalidPosition(String),
}

/// A fully described legal move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub color: Color,
    pub from: Square,
    /// Destination of the moving piece; the king's square for castling.
    pub to: Square,
    pub piece: PieceKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub captured: Option<PieceKind>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub promotion: Option<PieceKind>,
    /// Any of `n b e c p k q`, see `flags`.
    pub flags: String,
    pub san: String,
}

/// Move flag characters.
pub mod flags {
    pub const NORMAL: char = 'n';
    pub const BIG_PAWN: char = 'b';
    pub const EP_CAPTURE: char = 'e';
    pub const CAPTURE: char = 'c';
    pub const PROMOTION: char = 'p';
    pub const KSIDE_CASTLE: char = 'k';
    pub const QSIDE_CASTLE: char = 'q';
}

impl MoveRecord {
    pub fn has_flag(&self, flag: char) -> bool {
        self.flags.contains(flag)
    }
}

/// Result of a `moves` query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MoveList {
    /// SAN strings.
    Compact(Vec<String>),
    Verbose(Vec<MoveRecord>),
}

impl MoveList {
    pub fn len(&self) -> usize {
        match self {
            MoveList::Compact(v) => v.len(),
            MoveList::Verbose(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Summary of the engine's game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub turn: Color,
    pub in_check: bool,
    pub in_checkmate: bool,
    pub in_stalemate: bool,
    pub in_draw: bool,
    pub in_threefold_repetition: bool,
    pub insufficient_material: bool,
    pub game_over: bool,
    pub fen: String,
}

/// The authoritative game position and its rules.
///
/// Implementations own the grid; callers receive copies.
pub trait RulesEngine {
    /// Current occupancy snapshot.
    fn board(&self) -> Grid;

    /// Legal moves for the side to move.
    fn moves(&self, verbose: bool) -> MoveList;

    /// Places a piece, replacing whatever stood on the square.
    fn put(&mut self, piece: Piece, square: Square) -> Result<(), EngineError>;

    /// Clears a square, returning the piece that stood there.
    fn remove(&mut self, square: Square) -> Result<Option<Piece>, EngineError>;

    fn get(&self, square: Square) -> Option<Piece>;

    /// Takes back the last played move.
    fn undo(&mut self) -> Option<MoveRecord>;

    /// Restores the standard starting arrangement.
    fn reset(&mut self);

    /// Loads a FEN position. The engine is unchanged on error.
    fn load(&mut self, fen: &str) -> Result<(), EngineError>;

    /// Plays the legal move from `from` to `to`, if there is one.
    fn play(&mut self, from: Square, to: Square, promotion: Option<PieceKind>)
        -> Option<MoveRecord>;

    fn state(&self) -> GameState;

    fn fen(&self) -> String;
}
