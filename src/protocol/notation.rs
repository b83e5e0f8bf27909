//! Token notation for squares, pieces, and moves.
//!
//! Squares are algebraic (`e4`), pieces are color + kind (`wq`), and moves
//! are either two squares or a single coordinate token (`e2e4`).

use thiserror::Error;

use crate::board::{Piece, PieceError, Square, SquareError};

/// Errors that can occur when parsing command tokens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotationError {
    #[error(transparent)]
    Square(#[from] SquareError),

    #[error(transparent)]
    Piece(#[from] PieceError),

    #[error("expected a move like 'e2e4', got '{0}'")]
    InvalidMove(String),
}

pub fn parse_square(s: &str) -> Result<Square, NotationError> {
    Ok(s.parse::<Square>()?)
}

pub fn parse_piece(s: &str) -> Result<Piece, NotationError> {
    Ok(s.parse::<Piece>()?)
}

/// Parses a four-character coordinate move into its squares.
pub fn parse_move(s: &str) -> Result<(Square, Square), NotationError> {
    if s.len() != 4 || !s.is_ascii() {
        return Err(NotationError::InvalidMove(s.to_string()));
    }
    let from = parse_square(&s[0..2])?;
    let to = parse_square(&s[2..4])?;
    Ok((from, to))
}

/// Formats an optional piece, `none` when absent.
pub fn format_piece(piece: Option<Piece>) -> String {
    match piece {
        Some(p) => p.to_string(),
        None => "none".to_string(),
    }
}
