//! Board command parser.
//!
//! Parses incoming text commands into structured `Command` variants that
//! the session loop can dispatch on.

use tracing::warn;

use super::notation::{parse_move, parse_piece, parse_square};
use crate::board::{Piece, Square};

/// A parsed board command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Relocate the piece on `from` through its cell controller.
    Move { from: Square, to: Square },

    /// List legal moves, as SAN or as verbose records.
    Moves { verbose: bool },

    /// Place a piece: `put <piece> <square>`.
    Put { piece: Piece, square: Square },

    /// Clear a square.
    Remove { square: Square },

    /// Query a square.
    Get { square: Square },

    /// Dump the full grid.
    Board,

    /// Take back the last move.
    Undo,

    /// Paint a square: `highlight <square> [color]`.
    Highlight { square: Square, color: Option<String> },

    /// Clear every highlight.
    ClearHighlights,

    /// Reset to the starting arrangement, optionally loading a FEN.
    Reset { fen: Option<String> },

    /// Report the game state summary.
    State,

    /// Play a random legal move.
    Go,

    /// Print the rendered board.
    Show,

    /// Set a session option: `setoption name <id> [value <x>]`.
    SetOption { name: String, value: Option<String> },

    /// Synchronization ping; the session replies `readyok`.
    IsReady,

    /// End the session.
    Quit,
}

/// Parses a single line of input into a `Command`.
///
/// Returns `None` for empty lines or unrecognized commands. Malformed
/// arguments for known commands also return `None` after logging a warning.
pub fn parse_command(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    match tokens[0] {
        "board" => Some(Command::Board),
        "undo" => Some(Command::Undo),
        "clearhighlights" => Some(Command::ClearHighlights),
        "state" => Some(Command::State),
        "go" => Some(Command::Go),
        "show" => Some(Command::Show),
        "isready" => Some(Command::IsReady),
        "quit" => Some(Command::Quit),

        "move" => parse_move_command(&tokens),
        "moves" => parse_moves(&tokens),
        "put" => parse_put(&tokens),
        "remove" => parse_square_arg(&tokens, |square| Command::Remove { square }),
        "get" => parse_square_arg(&tokens, |square| Command::Get { square }),
        "highlight" => parse_highlight(&tokens),
        "reset" => parse_reset(&tokens),
        "setoption" => parse_setoption(&tokens),

        other => {
            warn!("unknown command: {}", other);
            None
        }
    }
}

/// Parses `move <from> <to>` or `move <from><to>`.
fn parse_move_command(tokens: &[&str]) -> Option<Command> {
    let parsed = match tokens.len() {
        2 => parse_move(tokens[1]),
        3 => parse_square(tokens[1]).and_then(|from| Ok((from, parse_square(tokens[2])?))),
        _ => {
            warn!("malformed move: expected 'move <from> <to>'");
            return None;
        }
    };
    match parsed {
        Ok((from, to)) => Some(Command::Move { from, to }),
        Err(e) => {
            warn!("malformed move: {}", e);
            None
        }
    }
}

/// Parses `moves [verbose]`.
fn parse_moves(tokens: &[&str]) -> Option<Command> {
    match tokens.get(1) {
        None => Some(Command::Moves { verbose: false }),
        Some(&"verbose") => Some(Command::Moves { verbose: true }),
        Some(other) => {
            warn!("unknown moves parameter: '{}'", other);
            None
        }
    }
}

/// Parses `put <piece> <square>`.
fn parse_put(tokens: &[&str]) -> Option<Command> {
    if tokens.len() != 3 {
        warn!("malformed put: expected 'put <piece> <square>'");
        return None;
    }
    let parsed = parse_piece(tokens[1]).and_then(|piece| Ok((piece, parse_square(tokens[2])?)));
    match parsed {
        Ok((piece, square)) => Some(Command::Put { piece, square }),
        Err(e) => {
            warn!("malformed put: {}", e);
            None
        }
    }
}

/// Parses commands taking exactly one square argument.
fn parse_square_arg(tokens: &[&str], build: impl FnOnce(Square) -> Command) -> Option<Command> {
    if tokens.len() != 2 {
        warn!("malformed {}: expected '{} <square>'", tokens[0], tokens[0]);
        return None;
    }
    match parse_square(tokens[1]) {
        Ok(square) => Some(build(square)),
        Err(e) => {
            warn!("malformed {}: {}", tokens[0], e);
            None
        }
    }
}

/// Parses `highlight <square> [color]`.
fn parse_highlight(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 2 || tokens.len() > 3 {
        warn!("malformed highlight: expected 'highlight <square> [color]'");
        return None;
    }
    match parse_square(tokens[1]) {
        Ok(square) => Some(Command::Highlight {
            square,
            color: tokens.get(2).map(|c| c.to_string()),
        }),
        Err(e) => {
            warn!("malformed highlight: {}", e);
            None
        }
    }
}

/// Parses `reset [fen...]`. A FEN contains spaces, so every token after
/// the keyword belongs to it.
fn parse_reset(tokens: &[&str]) -> Option<Command> {
    let fen = if tokens.len() > 1 {
        Some(tokens[1..].join(" "))
    } else {
        None
    };
    Some(Command::Reset { fen })
}

/// Parses `setoption name <id> [value <x>]`.
fn parse_setoption(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 3 || tokens[1] != "name" {
        warn!("malformed setoption: expected 'setoption name <id> [value <x>]'");
        return None;
    }

    let value_idx = tokens.iter().position(|&t| t == "value");

    let (name, value) = match value_idx {
        Some(vi) => {
            let name_parts = &tokens[2..vi];
            let value_parts = &tokens[vi + 1..];
            if name_parts.is_empty() {
                warn!("malformed setoption: empty name");
                return None;
            }
            let value = if value_parts.is_empty() {
                None
            } else {
                Some(value_parts.join(" "))
            };
            (name_parts.join(" "), value)
        }
        None => (tokens[2..].join(" "), None),
    };

    Some(Command::SetOption { name, value })
}
