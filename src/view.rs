//! Text-mode board view.
//!
//! Each of the 64 cells mounts a piece controller and a highlight
//! controller into the façade's registry, the way rendered squares register
//! themselves in a GUI. Rendering reads the grid pushed into the store plus
//! the overlay painted by the highlight cells.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use futures::FutureExt;
use tracing::debug;

use crate::board::{Grid, Square, BOARD_SIZE};
use crate::refs::{BoardRefs, HighlightController, HighlightStyle, PieceController, Relocation};
use crate::rules::RulesEngine;
use crate::store::BoardStore;

/// Overlay state shared by the view and its highlight cells.
#[derive(Debug, Default)]
struct Overlay {
    colors: BTreeMap<Square, String>,
    default_color: String,
}

/// Piece controller for one cell: plays the move on the engine and
/// publishes the new board.
pub struct PieceCell<E, S> {
    square: Square,
    engine: Rc<RefCell<E>>,
    store: Rc<RefCell<S>>,
}

impl<E, S> PieceCell<E, S> {
    pub fn new(square: Square, engine: Rc<RefCell<E>>, store: Rc<RefCell<S>>) -> Self {
        PieceCell {
            square,
            engine,
            store,
        }
    }
}

impl<E, S> PieceController for PieceCell<E, S>
where
    E: RulesEngine + 'static,
    S: BoardStore + 'static,
{
    fn relocate_to(&mut self, to: Square) -> Relocation {
        let from = self.square;
        let engine = Rc::clone(&self.engine);
        let store = Rc::clone(&self.store);
        async move {
            let record = engine.borrow_mut().play(from, to, None);
            if record.is_some() {
                let grid = engine.borrow().board();
                store.borrow_mut().set_board(grid);
            }
            record
        }
        .boxed_local()
    }
}

/// Highlight controller for one cell.
pub struct HighlightCell {
    square: Square,
    overlay: Rc<RefCell<Overlay>>,
}

impl HighlightController for HighlightCell {
    fn apply(&mut self, style: HighlightStyle) {
        let mut overlay = self.overlay.borrow_mut();
        let color = style
            .background_color
            .unwrap_or_else(|| overlay.default_color.clone());
        overlay.colors.insert(self.square, color);
    }

    fn clear(&mut self) {
        self.overlay.borrow_mut().colors.remove(&self.square);
    }
}

/// Renders the board as text and owns the highlight overlay.
#[derive(Debug)]
pub struct TerminalView {
    overlay: Rc<RefCell<Overlay>>,
}

impl TerminalView {
    pub fn new(default_color: impl Into<String>) -> Self {
        TerminalView {
            overlay: Rc::new(RefCell::new(Overlay {
                colors: BTreeMap::new(),
                default_color: default_color.into(),
            })),
        }
    }

    /// Color used by highlights that do not name one.
    pub fn set_default_color(&self, color: impl Into<String>) {
        self.overlay.borrow_mut().default_color = color.into();
    }

    /// Registers a piece cell and a highlight cell for every slot of the
    /// façade's registry. Returns the number of cells mounted.
    pub fn mount<E, S>(&self, refs: &mut BoardRefs<E, S>) -> usize
    where
        E: RulesEngine + 'static,
        S: BoardStore + 'static,
    {
        let engine = Rc::clone(refs.engine());
        let store = Rc::clone(refs.store());
        let squares: Vec<Square> = refs.registry().squares().collect();

        let registry = refs.registry_mut();
        let mut mounted = 0;
        for &square in &squares {
            let piece = PieceCell::new(square, Rc::clone(&engine), Rc::clone(&store));
            let highlight = HighlightCell {
                square,
                overlay: Rc::clone(&self.overlay),
            };
            if registry.register_piece(square, Box::new(piece)).is_ok()
                && registry.register_highlight(square, Box::new(highlight)).is_ok()
            {
                mounted += 1;
            }
        }
        debug!(mounted, "terminal view mounted");
        mounted
    }

    /// Currently highlighted squares and their colors, row-major.
    pub fn highlights(&self) -> Vec<(Square, String)> {
        self.overlay
            .borrow()
            .colors
            .iter()
            .map(|(sq, color)| (*sq, color.clone()))
            .collect()
    }

    /// Renders `grid` with rank and file labels. Highlighted squares are
    /// wrapped in brackets, empty squares show `.`.
    pub fn render(&self, grid: &Grid) -> String {
        let overlay = self.overlay.borrow();
        let mut out = String::new();

        for (y, row) in grid.rows().iter().enumerate() {
            out.push_str(&format!("{} ", BOARD_SIZE - y));
            for (x, cell) in row.iter().enumerate() {
                let square = Square::from_grid(x, y);
                let symbol = cell.map_or('.', |p| p.fen_char());
                if overlay.colors.contains_key(&square) {
                    out.push_str(&format!("[{}]", symbol));
                } else {
                    out.push_str(&format!(" {} ", symbol));
                }
            }
            out.push('\n');
        }

        out.push_str("  ");
        for file in 'a'..='h' {
            out.push_str(&format!(" {} ", file));
        }
        out.push('\n');
        out
    }
}
