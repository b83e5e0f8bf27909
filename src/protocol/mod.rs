//! Text command protocol.
//!
//! Line-oriented commands driving the board façade, plus the token
//! notation they use for squares, pieces, and moves.

pub mod notation;
pub mod parser;

pub use notation::{format_piece, parse_move, parse_piece, parse_square, NotationError};
pub use parser::{parse_command, Command};
