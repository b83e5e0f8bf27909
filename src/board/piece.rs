//! Piece kinds, colors, and their text notation.
//!
//! Pieces serialize the way chess GUIs exchange them, as
//! `{"type": "q", "color": "w"}`. The compact command notation is the
//! color character followed by the kind character, e.g. `wq` or `bn`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing piece notation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PieceError {
    #[error("expected a two-character piece like 'wq', got '{0}'")]
    WrongLength(String),

    #[error("invalid color character: '{0}'")]
    InvalidColor(char),

    #[error("invalid piece kind character: '{0}'")]
    InvalidKind(char),
}

/// The kind of a chess piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    #[serde(rename = "p")]
    Pawn,
    #[serde(rename = "n")]
    Knight,
    #[serde(rename = "b")]
    Bishop,
    #[serde(rename = "r")]
    Rook,
    #[serde(rename = "q")]
    Queen,
    #[serde(rename = "k")]
    King,
}

/// All piece kinds in conventional order.
pub const ALL_KINDS: [PieceKind; 6] = [
    PieceKind::Pawn,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Rook,
    PieceKind::Queen,
    PieceKind::King,
];

impl PieceKind {
    /// Returns the lowercase FEN character.
    pub const fn fen_char(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    /// Parses a kind from its FEN character, in either case.
    pub fn from_fen_char(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }
}

/// The side a piece belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    #[serde(rename = "w")]
    White,
    #[serde(rename = "b")]
    Black,
}

impl Color {
    /// Returns the single-character abbreviation.
    pub const fn char(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }

    /// Parses a color from its single-character abbreviation.
    pub fn from_char(c: char) -> Option<Color> {
        match c {
            'w' | 'W' => Some(Color::White),
            'b' | 'B' => Some(Color::Black),
            _ => None,
        }
    }
}

/// A piece on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    #[serde(rename = "type")]
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Piece { kind, color }
    }

    /// FEN letter: uppercase for white, lowercase for black.
    pub const fn fen_char(self) -> char {
        let c = self.kind.fen_char();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.color.char(), self.kind.fen_char())
    }
}

impl FromStr for Piece {
    type Err = PieceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (color_c, kind_c) = match (chars.next(), chars.next(), chars.next()) {
            (Some(c), Some(k), None) => (c, k),
            _ => return Err(PieceError::WrongLength(s.to_string())),
        };

        let color = Color::from_char(color_c).ok_or(PieceError::InvalidColor(color_c))?;
        let kind = PieceKind::from_fen_char(kind_c).ok_or(PieceError::InvalidKind(kind_c))?;
        Ok(Piece::new(color, kind))
    }
}
