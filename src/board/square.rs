//! Board addresses and the grid coordinate mapping.
//!
//! A `Square` names one of the 64 cells with an algebraic label such as
//! `e4`. Grid indices run row-major from the top-left of the rendered board:
//! `x` is the column (file a..h) and `y` is the row, where row 0 holds
//! rank 8. Squares order themselves in that same row-major order.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Number of files and ranks on the board.
pub const BOARD_SIZE: usize = 8;

/// Total number of addressable squares.
pub const SQUARE_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// Errors that can occur when parsing an algebraic square label.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SquareError {
    #[error("expected a two-character square like 'e4', got '{0}'")]
    WrongLength(String),

    #[error("invalid file '{0}'")]
    InvalidFile(char),

    #[error("invalid rank '{0}'")]
    InvalidRank(char),
}

/// One of the 64 board cells.
///
/// Stored as its row-major grid index (`y * 8 + x`), so `a8` is 0 and `h1`
/// is 63.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Square(u8);

impl Square {
    /// Every square in row-major grid order (a8, b8, ..., h1).
    pub const ALL: [Square; SQUARE_COUNT] = {
        let mut all = [Square(0); SQUARE_COUNT];
        let mut i = 0;
        while i < SQUARE_COUNT {
            all[i] = Square(i as u8);
            i += 1;
        }
        all
    };

    /// Maps grid indices to their square.
    ///
    /// Both indices must be below `BOARD_SIZE`; every caller derives them
    /// from an 8x8 enumeration.
    pub const fn from_grid(x: usize, y: usize) -> Square {
        debug_assert!(x < BOARD_SIZE && y < BOARD_SIZE);
        Square((y * BOARD_SIZE + x) as u8)
    }

    /// Builds a square from a zero-based file (0 = a) and one-based rank.
    pub fn from_file_rank(file: u8, rank: u8) -> Option<Square> {
        if (file as usize) < BOARD_SIZE && (1..=BOARD_SIZE as u8).contains(&rank) {
            Some(Square::from_grid(file as usize, BOARD_SIZE - rank as usize))
        } else {
            None
        }
    }

    /// Returns the grid indices `(x, y)` of this square.
    pub const fn grid(self) -> (usize, usize) {
        let idx = self.0 as usize;
        (idx % BOARD_SIZE, idx / BOARD_SIZE)
    }

    /// Row-major index in `0..64`.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Zero-based file index (0 = a).
    pub const fn file(self) -> u8 {
        self.0 % BOARD_SIZE as u8
    }

    /// One-based rank number (1..=8).
    pub const fn rank(self) -> u8 {
        BOARD_SIZE as u8 - self.0 / BOARD_SIZE as u8
    }

    /// File letter, lowercase.
    pub const fn file_char(self) -> char {
        (b'a' + self.file()) as char
    }

    /// Rank digit.
    pub const fn rank_char(self) -> char {
        (b'0' + self.rank()) as char
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

impl FromStr for Square {
    type Err = SquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (file_c, rank_c) = match (chars.next(), chars.next(), chars.next()) {
            (Some(f), Some(r), None) => (f, r),
            _ => return Err(SquareError::WrongLength(s.to_string())),
        };

        let file = match file_c.to_ascii_lowercase() {
            c @ 'a'..='h' => c as u8 - b'a',
            _ => return Err(SquareError::InvalidFile(file_c)),
        };
        let rank = match rank_c {
            c @ '1'..='8' => c as u8 - b'0',
            _ => return Err(SquareError::InvalidRank(rank_c)),
        };

        Square::from_file_rank(file, rank).ok_or(SquareError::InvalidRank(rank_c))
    }
}

impl serde::Serialize for Square {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Square {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
