//! Session state management.
//!
//! Holds the board façade, the terminal view mounted into its registry, the
//! runtime settings, and the random source used by `go`. Each parsed command
//! is dispatched to the façade and answered with a single response line.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use futures::executor::block_on;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::protocol::notation::format_piece;
use crate::protocol::parser::Command;
use crate::refs::BoardRefs;
use crate::rules::{MoveList, MoveRecord, RulesEngine, StandardChess};
use crate::store::SnapshotStore;
use crate::view::TerminalView;

/// Holds the mutable state of a session between commands.
pub struct Session {
    refs: BoardRefs<StandardChess, SnapshotStore>,
    view: TerminalView,
    settings: Settings,
    rng: SmallRng,
}

impl Session {
    /// Creates a session from resolved settings.
    ///
    /// A `start_fen` that fails to load is logged and the standard
    /// arrangement is used instead.
    pub fn new(settings: Settings) -> Self {
        let engine = match settings.start_fen.as_deref() {
            Some(fen) => StandardChess::from_fen(fen).unwrap_or_else(|e| {
                warn!("start position rejected: {}", e);
                StandardChess::new()
            }),
            None => StandardChess::new(),
        };
        let grid = engine.board();
        let engine = Rc::new(RefCell::new(engine));
        let store = Rc::new(RefCell::new(SnapshotStore::with_board(grid)));

        let mut refs = BoardRefs::new(engine, store);
        let view = TerminalView::new(settings.highlight_color.clone());
        view.mount(&mut refs);

        let rng = make_rng(settings.seed);
        info!(seed = ?settings.seed, "session started");
        Session {
            refs,
            view,
            settings,
            rng,
        }
    }

    pub fn refs(&self) -> &BoardRefs<StandardChess, SnapshotStore> {
        &self.refs
    }

    pub fn view(&self) -> &TerminalView {
        &self.view
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Executes one command, writing its response to `out`.
    ///
    /// Returns `Ok(false)` when the session should end.
    pub fn handle<W: Write>(&mut self, cmd: Command, out: &mut W) -> io::Result<bool> {
        match cmd {
            Command::Move { from, to } => {
                let record = self.refs.move_piece(from, to).and_then(block_on);
                write_move(out, record.as_ref())?;
            }
            Command::Moves { verbose } => match self.refs.moves(verbose) {
                MoveList::Compact(sans) => {
                    if sans.is_empty() {
                        writeln!(out, "moves")?;
                    } else {
                        writeln!(out, "moves {}", sans.join(" "))?;
                    }
                }
                list @ MoveList::Verbose(_) => {
                    writeln!(out, "moves {}", to_json(&list)?)?;
                }
            },
            Command::Put { piece, square } => match self.refs.put(piece, square) {
                Ok(()) => writeln!(out, "ok")?,
                Err(e) => writeln!(out, "error {}", e)?,
            },
            Command::Remove { square } => match self.refs.remove(square) {
                Ok(removed) => writeln!(out, "removed {}", format_piece(removed))?,
                Err(e) => writeln!(out, "error {}", e)?,
            },
            Command::Get { square } => {
                writeln!(out, "piece {}", format_piece(self.refs.get(square)))?;
            }
            Command::Board => {
                writeln!(out, "board {}", to_json(&self.refs.board())?)?;
            }
            Command::Undo => {
                let undone = self.refs.undo();
                match undone {
                    Some(record) => writeln!(out, "undo {}", record.san)?,
                    None => writeln!(out, "undo none")?,
                }
            }
            Command::Highlight { square, color } => {
                self.refs.highlight(square, color.as_deref());
            }
            Command::ClearHighlights => {
                self.refs.reset_all_highlighted_squares();
            }
            Command::Reset { fen } => {
                let loaded = self.refs.reset_board(fen.as_deref());
                writeln!(out, "reset {}", loaded)?;
            }
            Command::State => {
                writeln!(out, "state {}", to_json(&self.refs.state())?)?;
            }
            Command::Go => {
                let record = self.play_random();
                write_move(out, record.as_ref())?;
            }
            Command::Show => {
                let grid = self
                    .refs
                    .store()
                    .borrow()
                    .snapshot()
                    .copied()
                    .unwrap_or_else(|| self.refs.board());
                write!(out, "{}", self.view.render(&grid))?;
                writeln!(out, "end")?;
            }
            Command::SetOption { name, value } => {
                self.set_option(&name, value.as_deref());
            }
            Command::IsReady => {
                writeln!(out, "readyok")?;
            }
            Command::Quit => return Ok(false),
        }
        out.flush()?;
        Ok(true)
    }

    /// Applies a `setoption` update to the settings and the live session.
    fn set_option(&mut self, name: &str, value: Option<&str>) {
        if let Err(e) = self.settings.set_option(name, value) {
            warn!("setoption: {}", e);
            return;
        }
        match name.to_ascii_lowercase().as_str() {
            "highlightcolor" => self
                .view
                .set_default_color(self.settings.highlight_color.clone()),
            "seed" => self.rng = make_rng(self.settings.seed),
            _ => {}
        }
        debug!(name, ?value, "option set");
    }

    /// Picks a random legal move and plays it through the piece controller
    /// on its origin square.
    fn play_random(&mut self) -> Option<MoveRecord> {
        let candidates = match self.refs.moves(true) {
            MoveList::Verbose(records) => records,
            MoveList::Compact(_) => return None,
        };
        let chosen = candidates.choose(&mut self.rng)?;
        debug!(san = %chosen.san, "random move chosen");
        self.refs
            .move_piece(chosen.from, chosen.to)
            .and_then(block_on)
    }
}

fn make_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(s) => SmallRng::seed_from_u64(s),
        None => SmallRng::from_entropy(),
    }
}

fn write_move<W: Write>(out: &mut W, record: Option<&MoveRecord>) -> io::Result<()> {
    match record {
        Some(r) => writeln!(out, "move {}", r.san),
        None => writeln!(out, "move none"),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> io::Result<String> {
    serde_json::to_string(value).map_err(io::Error::from)
}
