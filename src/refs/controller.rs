//! Per-cell controller capabilities.
//!
//! Visual cells implement these traits and register themselves into the
//! `ControllerRegistry`. The coordination layer calls them but never
//! renders anything itself.

use futures::future::LocalBoxFuture;

use crate::board::Square;
use crate::rules::MoveRecord;

/// Deferred completion of a piece relocation.
///
/// Resolves once the visual move has finished, to the move that was played
/// or `None` when the relocation did not result in a move.
pub type Relocation = LocalBoxFuture<'static, Option<MoveRecord>>;

/// Handle able to move the piece rendered on its cell.
pub trait PieceController {
    /// Starts relocating this cell's piece to `to`.
    fn relocate_to(&mut self, to: Square) -> Relocation;
}

/// Overlay applied by a highlight controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightStyle {
    /// `None` lets the cell pick its default color.
    pub background_color: Option<String>,
}

/// Handle able to paint and clear an overlay on its cell.
pub trait HighlightController {
    fn apply(&mut self, style: HighlightStyle);

    fn clear(&mut self);
}
