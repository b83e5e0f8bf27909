//! Board representation types.
//!
//! Contains the square addressing scheme, piece types, and the grid
//! snapshot handed out by rules engines.

pub mod grid;
pub mod piece;
pub mod square;

pub use grid::Grid;
pub use piece::{Color, Piece, PieceError, PieceKind, ALL_KINDS};
pub use square::{Square, SquareError, BOARD_SIZE, SQUARE_COUNT};
