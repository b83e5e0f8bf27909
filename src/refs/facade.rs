//! Command façade over the rules engine, the store, and the registry.
//!
//! Every command reads the engine fresh; nothing here caches board state.
//! Engine-mutating commands push the engine's new grid to the store exactly
//! once before returning. Visual commands route to the controller registered
//! for the target square and quietly do nothing when there is none.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use super::controller::{HighlightStyle, Relocation};
use super::registry::ControllerRegistry;
use crate::board::{Grid, Piece, Square};
use crate::rules::{EngineError, GameState, MoveList, MoveRecord, RulesEngine};
use crate::store::BoardStore;

/// Unified command surface of the board view.
pub struct BoardRefs<E, S> {
    engine: Rc<RefCell<E>>,
    store: Rc<RefCell<S>>,
    registry: ControllerRegistry,
}

impl<E: RulesEngine, S: BoardStore> BoardRefs<E, S> {
    /// Wires the façade to its collaborators.
    ///
    /// The registry's slots are derived from the engine's board at this
    /// point and are not rebuilt later.
    pub fn new(engine: Rc<RefCell<E>>, store: Rc<RefCell<S>>) -> Self {
        let registry = ControllerRegistry::for_grid(&engine.borrow().board());
        BoardRefs {
            engine,
            store,
            registry,
        }
    }

    /// Shared handle to the rules engine.
    pub fn engine(&self) -> &Rc<RefCell<E>> {
        &self.engine
    }

    /// Shared handle to the board-state store.
    pub fn store(&self) -> &Rc<RefCell<S>> {
        &self.store
    }

    pub fn registry(&self) -> &ControllerRegistry {
        &self.registry
    }

    /// Used by visual cells to register their controllers.
    pub fn registry_mut(&mut self) -> &mut ControllerRegistry {
        &mut self.registry
    }

    /// Asks the piece controller at `from` to relocate its piece to `to`.
    ///
    /// Returns `None` when no controller is registered at `from`. The
    /// returned relocation does not carry engine state; query `board()` or
    /// `state()` after it resolves.
    pub fn move_piece(&mut self, from: Square, to: Square) -> Option<Relocation> {
        match self.registry.piece_mut(from) {
            Some(controller) => {
                debug!(%from, %to, "relocating piece");
                Some(controller.relocate_to(to))
            }
            None => {
                trace!(%from, "no piece controller registered");
                None
            }
        }
    }

    pub fn moves(&self, verbose: bool) -> MoveList {
        self.engine.borrow().moves(verbose)
    }

    /// Places a piece through the engine and refreshes the store.
    pub fn put(&mut self, piece: Piece, square: Square) -> Result<(), EngineError> {
        let result = self.engine.borrow_mut().put(piece, square);
        self.refresh();
        result
    }

    /// Clears a square through the engine and refreshes the store.
    pub fn remove(&mut self, square: Square) -> Result<Option<Piece>, EngineError> {
        let result = self.engine.borrow_mut().remove(square);
        self.refresh();
        result
    }

    pub fn get(&self, square: Square) -> Option<Piece> {
        self.engine.borrow().get(square)
    }

    pub fn board(&self) -> Grid {
        self.engine.borrow().board()
    }

    /// Takes back the engine's last move and refreshes the store.
    pub fn undo(&mut self) -> Option<MoveRecord> {
        let undone = self.engine.borrow_mut().undo();
        self.refresh();
        undone
    }

    /// Paints the highlight at `square`, if a controller is registered there.
    pub fn highlight(&mut self, square: Square, color: Option<&str>) {
        let style = HighlightStyle {
            background_color: color.map(str::to_string),
        };
        match self.registry.highlight_mut(square) {
            Some(controller) => controller.apply(style),
            None => trace!(%square, "no highlight controller registered"),
        }
    }

    /// Clears every registered highlight controller.
    pub fn reset_all_highlighted_squares(&mut self) {
        let mut cleared = 0usize;
        self.registry.for_each_highlight(|_, controller| {
            controller.clear();
            cleared += 1;
        });
        trace!(cleared, "highlights reset");
    }

    /// Resets the engine to the starting arrangement, then loads `fen` if
    /// given. The store is refreshed whatever the load outcome.
    ///
    /// Returns `true` only when a position string was supplied and loaded.
    /// After a failed load the engine stays in the starting arrangement.
    pub fn reset_board(&mut self, fen: Option<&str>) -> bool {
        let success = {
            let mut engine = self.engine.borrow_mut();
            engine.reset();
            match fen {
                Some(fen) => match engine.load(fen) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("reset_board: {}", e);
                        false
                    }
                },
                None => false,
            }
        };
        self.refresh();
        success
    }

    pub fn state(&self) -> GameState {
        self.engine.borrow().state()
    }

    /// Pushes the engine's current grid into the store.
    fn refresh(&self) {
        let grid = self.engine.borrow().board();
        self.store.borrow_mut().set_board(grid);
        debug!(pieces = grid.piece_count(), "store refreshed");
    }
}

impl<E, S> std::fmt::Debug for BoardRefs<E, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardRefs")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use futures::executor::block_on;
    use futures::FutureExt;

    use super::*;
    use crate::board::{Color, PieceKind, SQUARE_COUNT};
    use crate::refs::controller::{HighlightController, PieceController};
    use crate::rules::MoveList;

    /// Engine double that stores a grid and counts calls.
    #[derive(Default)]
    struct FakeEngine {
        grid: Grid,
        resets: usize,
        loads: Vec<String>,
        undos: usize,
        reject_puts: bool,
    }

    impl RulesEngine for FakeEngine {
        fn board(&self) -> Grid {
            self.grid
        }

        fn moves(&self, verbose: bool) -> MoveList {
            if verbose {
                MoveList::Verbose(Vec::new())
            } else {
                MoveList::Compact(vec!["e4".to_string()])
            }
        }

        fn put(&mut self, piece: Piece, square: Square) -> Result<(), EngineError> {
            if self.reject_puts {
                return Err(EngineError::InvalidPosition("rejected".to_string()));
            }
            self.grid.set(square, Some(piece));
            Ok(())
        }

        fn remove(&mut self, square: Square) -> Result<Option<Piece>, EngineError> {
            let old = self.grid.get(square);
            self.grid.set(square, None);
            Ok(old)
        }

        fn get(&self, square: Square) -> Option<Piece> {
            self.grid.get(square)
        }

        fn undo(&mut self) -> Option<MoveRecord> {
            self.undos += 1;
            None
        }

        fn reset(&mut self) {
            self.resets += 1;
            self.grid = Grid::empty();
            self.grid.set(sq("e1"), Some(Piece::new(Color::White, PieceKind::King)));
        }

        fn load(&mut self, fen: &str) -> Result<(), EngineError> {
            self.loads.push(fen.to_string());
            if fen == "good" {
                self.grid.set(sq("a1"), Some(Piece::new(Color::White, PieceKind::Rook)));
                Ok(())
            } else {
                Err(EngineError::InvalidFen {
                    fen: fen.to_string(),
                    reason: "bad".to_string(),
                })
            }
        }

        fn play(
            &mut self,
            _from: Square,
            _to: Square,
            _promotion: Option<PieceKind>,
        ) -> Option<MoveRecord> {
            None
        }

        fn state(&self) -> GameState {
            GameState {
                turn: Color::White,
                in_check: false,
                in_checkmate: false,
                in_stalemate: false,
                in_draw: false,
                in_threefold_repetition: false,
                insufficient_material: false,
                game_over: false,
                fen: "fake".to_string(),
            }
        }

        fn fen(&self) -> String {
            "fake".to_string()
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        pushes: Vec<Grid>,
    }

    impl BoardStore for RecordingStore {
        fn set_board(&mut self, grid: Grid) {
            self.pushes.push(grid);
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Apply(Option<String>),
        Clear,
        Relocate(Square),
    }

    struct LoggingHighlight {
        log: Rc<RefCell<Vec<Event>>>,
    }

    impl HighlightController for LoggingHighlight {
        fn apply(&mut self, style: HighlightStyle) {
            self.log.borrow_mut().push(Event::Apply(style.background_color));
        }

        fn clear(&mut self) {
            self.log.borrow_mut().push(Event::Clear);
        }
    }

    struct LoggingPiece {
        log: Rc<RefCell<Vec<Event>>>,
        from: Square,
    }

    impl PieceController for LoggingPiece {
        fn relocate_to(&mut self, to: Square) -> Relocation {
            self.log.borrow_mut().push(Event::Relocate(to));
            let from = self.from;
            async move {
                Some(MoveRecord {
                    color: Color::White,
                    from,
                    to,
                    piece: PieceKind::Pawn,
                    captured: None,
                    promotion: None,
                    flags: "n".to_string(),
                    san: to.to_string(),
                })
            }
            .boxed_local()
        }
    }

    type Fixture = (
        BoardRefs<FakeEngine, RecordingStore>,
        Rc<RefCell<FakeEngine>>,
        Rc<RefCell<RecordingStore>>,
    );

    fn fixture() -> Fixture {
        let engine = Rc::new(RefCell::new(FakeEngine::default()));
        let store = Rc::new(RefCell::new(RecordingStore::default()));
        let refs = BoardRefs::new(Rc::clone(&engine), Rc::clone(&store));
        (refs, engine, store)
    }

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn registry_has_a_slot_per_square() {
        let (refs, _, store) = fixture();
        assert_eq!(refs.registry().piece_slot_count(), SQUARE_COUNT);
        assert_eq!(refs.registry().highlight_slot_count(), SQUARE_COUNT);
        assert!(store.borrow().pushes.is_empty());
    }

    #[test]
    fn put_then_get_and_single_refresh() {
        let (mut refs, engine, store) = fixture();
        let wq = Piece::new(Color::White, PieceKind::Queen);
        refs.put(wq, sq("d4")).unwrap();

        assert_eq!(refs.get(sq("d4")), Some(wq));
        let store = store.borrow();
        assert_eq!(store.pushes.len(), 1);
        assert_eq!(store.pushes[0], engine.borrow().board());
    }

    #[test]
    fn rejected_put_is_passed_through_and_still_refreshes() {
        let (mut refs, engine, store) = fixture();
        engine.borrow_mut().reject_puts = true;
        let result = refs.put(Piece::new(Color::Black, PieceKind::Pawn), sq("a3"));
        assert_eq!(
            result,
            Err(EngineError::InvalidPosition("rejected".to_string()))
        );
        assert_eq!(store.borrow().pushes.len(), 1);
        assert!(refs.get(sq("a3")).is_none());
    }

    #[test]
    fn remove_then_get_is_none() {
        let (mut refs, _, store) = fixture();
        let bp = Piece::new(Color::Black, PieceKind::Pawn);
        refs.put(bp, sq("c7")).unwrap();
        assert_eq!(refs.remove(sq("c7")), Ok(Some(bp)));
        assert!(refs.get(sq("c7")).is_none());
        assert_eq!(store.borrow().pushes.len(), 2);
        assert!(store.borrow().pushes[1].get(sq("c7")).is_none());
    }

    #[test]
    fn undo_refreshes_once() {
        let (mut refs, engine, store) = fixture();
        assert!(refs.undo().is_none());
        assert_eq!(engine.borrow().undos, 1);
        assert_eq!(store.borrow().pushes.len(), 1);
    }

    #[test]
    fn reset_board_without_fen_returns_false() {
        let (mut refs, engine, store) = fixture();
        assert!(!refs.reset_board(None));
        assert_eq!(engine.borrow().resets, 1);
        assert!(engine.borrow().loads.is_empty());
        assert_eq!(store.borrow().pushes.len(), 1);
    }

    #[test]
    fn reset_board_with_good_fen_returns_true() {
        let (mut refs, engine, store) = fixture();
        assert!(refs.reset_board(Some("good")));
        assert_eq!(engine.borrow().loads, vec!["good".to_string()]);
        assert_eq!(store.borrow().pushes.len(), 1);
        assert_eq!(store.borrow().pushes[0], refs.board());
    }

    #[test]
    fn reset_board_with_bad_fen_keeps_reset_arrangement() {
        let (mut refs, engine, store) = fixture();
        refs.put(Piece::new(Color::Black, PieceKind::Queen), sq("h5"))
            .unwrap();
        assert!(!refs.reset_board(Some("bad")));
        assert_eq!(engine.borrow().resets, 1);

        let mut expected = Grid::empty();
        expected.set(sq("e1"), Some(Piece::new(Color::White, PieceKind::King)));
        assert_eq!(refs.board(), expected);
        assert_eq!(store.borrow().pushes.len(), 2);
        assert_eq!(store.borrow().pushes[1], expected);
    }

    #[test]
    fn queries_do_not_touch_the_store() {
        let (refs, _, store) = fixture();
        let _ = refs.moves(false);
        let _ = refs.moves(true);
        let _ = refs.get(sq("e4"));
        let _ = refs.board();
        let _ = refs.state();
        assert!(store.borrow().pushes.is_empty());
    }

    #[test]
    fn moves_delegates_to_engine() {
        let (refs, _, _) = fixture();
        assert_eq!(refs.moves(false), MoveList::Compact(vec!["e4".to_string()]));
        assert_eq!(refs.moves(true), MoveList::Verbose(Vec::new()));
    }

    #[test]
    fn move_without_controller_is_none() {
        let (mut refs, _, store) = fixture();
        assert!(refs.move_piece(sq("e2"), sq("e4")).is_none());
        assert!(store.borrow().pushes.is_empty());
    }

    #[test]
    fn move_delegates_to_registered_controller() {
        let (mut refs, _, _) = fixture();
        let log = Rc::new(RefCell::new(Vec::new()));
        let controller = LoggingPiece {
            log: Rc::clone(&log),
            from: sq("e2"),
        };
        assert!(refs
            .registry_mut()
            .register_piece(sq("e2"), Box::new(controller))
            .is_ok());

        let relocation = refs.move_piece(sq("e2"), sq("e4")).unwrap();
        assert_eq!(*log.borrow(), vec![Event::Relocate(sq("e4"))]);

        let record = block_on(relocation).unwrap();
        assert_eq!(record.from, sq("e2"));
        assert_eq!(record.to, sq("e4"));
    }

    #[test]
    fn highlight_without_controller_is_a_noop() {
        let (mut refs, _, store) = fixture();
        refs.highlight(sq("e4"), Some("red"));
        refs.reset_all_highlighted_squares();
        assert!(store.borrow().pushes.is_empty());
    }

    #[test]
    fn highlight_then_reset_clears_once() {
        let (mut refs, _, _) = fixture();
        let log = Rc::new(RefCell::new(Vec::new()));
        let controller = LoggingHighlight {
            log: Rc::clone(&log),
        };
        assert!(refs
            .registry_mut()
            .register_highlight(sq("f6"), Box::new(controller))
            .is_ok());

        refs.highlight(sq("f6"), Some("red"));
        refs.highlight(sq("f7"), Some("blue"));
        refs.reset_all_highlighted_squares();

        assert_eq!(
            *log.borrow(),
            vec![Event::Apply(Some("red".to_string())), Event::Clear]
        );
    }

    #[test]
    fn highlight_without_color_leaves_choice_to_cell() {
        let (mut refs, _, _) = fixture();
        let log = Rc::new(RefCell::new(Vec::new()));
        let controller = LoggingHighlight {
            log: Rc::clone(&log),
        };
        assert!(refs
            .registry_mut()
            .register_highlight(sq("b2"), Box::new(controller))
            .is_ok());

        refs.highlight(sq("b2"), None);
        assert_eq!(*log.borrow(), vec![Event::Apply(None)]);
    }

    #[test]
    fn state_comes_from_engine() {
        let (refs, _, _) = fixture();
        assert_eq!(refs.state().fen, "fake");
    }
}
