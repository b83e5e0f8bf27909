//! Controller registry.
//!
//! Two parallel slot maps, one for piece controllers and one for highlight
//! controllers, each keyed by every address of the board. The key set is
//! fixed when the registry is built; slots start empty and are filled as
//! visual cells mount and register themselves.

use std::collections::BTreeMap;

use tracing::trace;

use super::controller::{HighlightController, PieceController};
use crate::board::{Grid, Square};

type PieceSlot = Option<Box<dyn PieceController>>;
type HighlightSlot = Option<Box<dyn HighlightController>>;

/// Address-to-controller slots for both controller kinds.
pub struct ControllerRegistry {
    pieces: BTreeMap<Square, PieceSlot>,
    highlights: BTreeMap<Square, HighlightSlot>,
}

impl ControllerRegistry {
    /// Builds one empty slot per cell of `grid`, in both maps.
    ///
    /// Cells are enumerated row-major and mapped through
    /// `Square::from_grid`, so the key set mirrors the grid's shape at
    /// construction time. The registry is never rebuilt afterwards.
    pub fn for_grid(grid: &Grid) -> Self {
        let mut pieces = BTreeMap::new();
        let mut highlights = BTreeMap::new();

        for (y, row) in grid.rows().iter().enumerate() {
            for x in 0..row.len() {
                let square = Square::from_grid(x, y);
                pieces.insert(square, None);
                highlights.insert(square, None);
            }
        }

        ControllerRegistry { pieces, highlights }
    }

    /// Number of piece slots, registered or not.
    pub fn piece_slot_count(&self) -> usize {
        self.pieces.len()
    }

    /// Number of highlight slots, registered or not.
    pub fn highlight_slot_count(&self) -> usize {
        self.highlights.len()
    }

    /// Number of piece slots holding a controller.
    pub fn registered_pieces(&self) -> usize {
        self.pieces.values().filter(|slot| slot.is_some()).count()
    }

    /// Number of highlight slots holding a controller.
    pub fn registered_highlights(&self) -> usize {
        self.highlights.values().filter(|slot| slot.is_some()).count()
    }

    /// The registry's key set, row-major.
    pub fn squares(&self) -> impl Iterator<Item = Square> + '_ {
        self.pieces.keys().copied()
    }

    /// The highlight map's key set, row-major.
    pub fn highlight_squares(&self) -> impl Iterator<Item = Square> + '_ {
        self.highlights.keys().copied()
    }

    /// Fills the piece slot at `square`, returning the controller it held.
    ///
    /// Returns the new controller back as `Err` when the registry has no
    /// slot for `square`.
    pub fn register_piece(
        &mut self,
        square: Square,
        controller: Box<dyn PieceController>,
    ) -> Result<PieceSlot, Box<dyn PieceController>> {
        match self.pieces.get_mut(&square) {
            Some(slot) => {
                trace!(%square, "piece controller registered");
                Ok(slot.replace(controller))
            }
            None => Err(controller),
        }
    }

    /// Fills the highlight slot at `square`, returning the controller it held.
    pub fn register_highlight(
        &mut self,
        square: Square,
        controller: Box<dyn HighlightController>,
    ) -> Result<HighlightSlot, Box<dyn HighlightController>> {
        match self.highlights.get_mut(&square) {
            Some(slot) => {
                trace!(%square, "highlight controller registered");
                Ok(slot.replace(controller))
            }
            None => Err(controller),
        }
    }

    /// Empties the piece slot at `square`; the slot itself stays.
    pub fn unregister_piece(&mut self, square: Square) -> PieceSlot {
        self.pieces.get_mut(&square).and_then(Option::take)
    }

    /// Empties the highlight slot at `square`; the slot itself stays.
    pub fn unregister_highlight(&mut self, square: Square) -> HighlightSlot {
        self.highlights.get_mut(&square).and_then(Option::take)
    }

    /// The piece controller at `square`, if one is registered.
    pub fn piece_mut(&mut self, square: Square) -> Option<&mut Box<dyn PieceController>> {
        self.pieces.get_mut(&square).and_then(Option::as_mut)
    }

    /// The highlight controller at `square`, if one is registered.
    pub fn highlight_mut(
        &mut self,
        square: Square,
    ) -> Option<&mut Box<dyn HighlightController>> {
        self.highlights.get_mut(&square).and_then(Option::as_mut)
    }

    /// Visits every registered highlight controller in key order.
    pub fn for_each_highlight<F>(&mut self, mut f: F)
    where
        F: FnMut(Square, &mut dyn HighlightController),
    {
        for (&square, slot) in self.highlights.iter_mut() {
            if let Some(controller) = slot {
                f(square, controller.as_mut());
            }
        }
    }
}

impl std::fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerRegistry")
            .field("piece_slots", &self.pieces.len())
            .field("registered_pieces", &self.registered_pieces())
            .field("highlight_slots", &self.highlights.len())
            .field("registered_highlights", &self.registered_highlights())
            .finish()
    }
}
