//! Standard chess rules backed by `shakmaty`.
//!
//! `shakmaty` positions are immutable values without move history, so this
//! adapter keeps its own stack of previous positions for `undo` and for
//! threefold-repetition detection. Manual board edits (`put`, `remove`) go
//! through a `Setup` and are re-validated; they start a fresh history.

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::{
    CastlingMode, Chess, EnPassantMode, File, FromSetup, Move, Position, PositionError, Rank,
    Role,
};
use tracing::debug;

use super::{flags, EngineError, GameState, MoveList, MoveRecord, RulesEngine};
use crate::board::{Color, Grid, Piece, PieceKind, Square, BOARD_SIZE};

/// Halfmove clock value at which the fifty-move rule applies.
const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// A standard chess game with move history.
#[derive(Debug, Clone, Default)]
pub struct StandardChess {
    position: Chess,
    /// Position before each played move, paired with that move.
    history: Vec<(Chess, MoveRecord)>,
}

impl StandardChess {
    /// Creates a game in the standard starting position.
    pub fn new() -> Self {
        StandardChess::default()
    }

    /// Creates a game from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, EngineError> {
        let mut engine = StandardChess::new();
        engine.load(fen)?;
        Ok(engine)
    }

    /// Moves played since the last reset, load, or manual edit.
    pub fn history(&self) -> impl Iterator<Item = &MoveRecord> + '_ {
        self.history.iter().map(|(_, record)| record)
    }

    /// Applies a board edit and re-validates the resulting position.
    ///
    /// Stale castling rights and surplus material are tolerated, matching
    /// what board editors allow. The en passant square is dropped.
    fn edit<F>(&mut self, f: F) -> Result<(), EngineError>
    where
        F: FnOnce(&mut shakmaty::Board),
    {
        let mut setup = self.position.clone().into_setup(EnPassantMode::Legal);
        f(&mut setup.board);
        setup.ep_square = None;

        let position = Chess::from_setup(setup, CastlingMode::Standard)
            .or_else(PositionError::ignore_invalid_castling_rights)
            .or_else(PositionError::ignore_too_much_material)
            .map_err(|e| EngineError::InvalidPosition(e.to_string()))?;

        self.position = position;
        self.history.clear();
        Ok(())
    }

    fn is_threefold_repetition(&self) -> bool {
        let current = repetition_key(&self.position);
        let earlier = self
            .history
            .iter()
            .filter(|(pos, _)| repetition_key(pos) == current)
            .count();
        earlier + 1 >= 3
    }
}

impl RulesEngine for StandardChess {
    fn board(&self) -> Grid {
        let board = self.position.board();
        let mut grid = Grid::empty();
        for y in 0..BOARD_SIZE {
            for x in 0..BOARD_SIZE {
                let sq = Square::from_grid(x, y);
                grid.set(sq, board.piece_at(to_shakmaty(sq)).map(piece_from_shakmaty));
            }
        }
        grid
    }

    fn moves(&self, verbose: bool) -> MoveList {
        let legal = self.position.legal_moves();
        let records = legal.iter().filter_map(|m| describe(&self.position, m));
        if verbose {
            MoveList::Verbose(records.collect())
        } else {
            MoveList::Compact(records.map(|r| r.san).collect())
        }
    }

    fn put(&mut self, piece: Piece, square: Square) -> Result<(), EngineError> {
        let sq = to_shakmaty(square);
        self.edit(|board| board.set_piece_at(sq, piece_to_shakmaty(piece)))?;
        debug!(%square, %piece, "engine put");
        Ok(())
    }

    fn remove(&mut self, square: Square) -> Result<Option<Piece>, EngineError> {
        let sq = to_shakmaty(square);
        let removed = self.position.board().piece_at(sq).map(piece_from_shakmaty);
        self.edit(|board| board.discard_piece_at(sq))?;
        debug!(%square, piece = ?removed, "engine remove");
        Ok(removed)
    }

    fn get(&self, square: Square) -> Option<Piece> {
        self.position
            .board()
            .piece_at(to_shakmaty(square))
            .map(piece_from_shakmaty)
    }

    fn undo(&mut self) -> Option<MoveRecord> {
        let (previous, record) = self.history.pop()?;
        self.position = previous;
        debug!(san = %record.san, "engine undo");
        Some(record)
    }

    fn reset(&mut self) {
        self.position = Chess::default();
        self.history.clear();
    }

    fn load(&mut self, fen: &str) -> Result<(), EngineError> {
        let invalid = |reason: String| EngineError::InvalidFen {
            fen: fen.to_string(),
            reason,
        };
        let parsed: Fen = fen.trim().parse().map_err(|e| invalid(format!("{}", e)))?;
        let position: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| invalid(e.to_string()))?;

        self.position = position;
        self.history.clear();
        Ok(())
    }

    fn play(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Option<MoveRecord> {
        let from_sq = to_shakmaty(from);
        let to_sq = to_shakmaty(to);
        let wanted = promotion.map(role_from_kind);

        let chosen = self.position.legal_moves().into_iter().find(|m| {
            m.from() == Some(from_sq)
                && destination(m) == to_sq
                && match (m.promotion(), wanted) {
                    (None, _) => true,
                    (Some(role), Some(w)) => role == w,
                    (Some(role), None) => role == Role::Queen,
                }
        })?;

        let record = describe(&self.position, &chosen)?;
        let previous = self.position.clone();
        self.position.play_unchecked(&chosen);
        self.history.push((previous, record.clone()));
        debug!(san = %record.san, "engine play");
        Some(record)
    }

    fn state(&self) -> GameState {
        let pos = &self.position;
        let in_checkmate = pos.is_checkmate();
        let in_stalemate = pos.is_stalemate();
        let insufficient_material = pos.is_insufficient_material();
        let in_threefold_repetition = self.is_threefold_repetition();
        let in_draw = pos.halfmoves() >= FIFTY_MOVE_HALFMOVES
            || in_stalemate
            || insufficient_material
            || in_threefold_repetition;

        GameState {
            turn: color_from_shakmaty(pos.turn()),
            in_check: pos.is_check(),
            in_checkmate,
            in_stalemate,
            in_draw,
            in_threefold_repetition,
            insufficient_material,
            game_over: in_checkmate || in_draw,
            fen: self.fen(),
        }
    }

    fn fen(&self) -> String {
        fen_of(&self.position)
    }
}

fn fen_of(pos: &Chess) -> String {
    Fen::from_position(pos.clone(), EnPassantMode::Legal).to_string()
}

/// Board, side to move, castling rights and en passant square.
fn repetition_key(pos: &Chess) -> String {
    fen_of(pos)
        .split(' ')
        .take(4)
        .collect::<Vec<_>>()
        .join(" ")
}

/// The square the moving piece lands on. Castling moves are encoded by
/// `shakmaty` as king-takes-rook; this returns the king's destination.
fn destination(m: &Move) -> shakmaty::Square {
    match m {
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() {
                File::G
            } else {
                File::C
            };
            shakmaty::Square::from_coords(file, king.rank())
        }
        _ => m.to(),
    }
}

fn describe(pos: &Chess, m: &Move) -> Option<MoveRecord> {
    let from = m.from()?;
    let to = destination(m);

    let mut flag_str = String::new();
    if m.is_en_passant() {
        flag_str.push(flags::EP_CAPTURE);
    } else if m.is_capture() {
        flag_str.push(flags::CAPTURE);
    }
    if m.role() == Role::Pawn && (from.rank() as i32 - to.rank() as i32).abs() == 2 {
        flag_str.push(flags::BIG_PAWN);
    }
    if m.promotion().is_some() {
        flag_str.push(flags::PROMOTION);
    }
    if let Move::Castle { king, rook } = m {
        if rook.file() > king.file() {
            flag_str.push(flags::KSIDE_CASTLE);
        } else {
            flag_str.push(flags::QSIDE_CASTLE);
        }
    }
    if flag_str.is_empty() {
        flag_str.push(flags::NORMAL);
    }

    Some(MoveRecord {
        color: color_from_shakmaty(pos.turn()),
        from: square_from_shakmaty(from),
        to: square_from_shakmaty(to),
        piece: kind_from_role(m.role()),
        captured: m.capture().map(kind_from_role),
        promotion: m.promotion().map(kind_from_role),
        flags: flag_str,
        san: san_with_suffix(pos, m),
    })
}

/// SAN with `+` or `#` appended.
fn san_with_suffix(pos: &Chess, m: &Move) -> String {
    let san = San::from_move(pos, m);
    let mut after = pos.clone();
    after.play_unchecked(m);
    let suffix = if after.is_checkmate() {
        "#"
    } else if after.is_check() {
        "+"
    } else {
        ""
    };
    format!("{}{}", san, suffix)
}

fn to_shakmaty(sq: Square) -> shakmaty::Square {
    shakmaty::Square::from_coords(
        File::new(u32::from(sq.file())),
        Rank::new(u32::from(sq.rank()) - 1),
    )
}

fn square_from_shakmaty(sq: shakmaty::Square) -> Square {
    // shakmaty ranks count up from rank 1, grid rows count down from rank 8
    Square::from_grid(sq.file() as usize, BOARD_SIZE - 1 - sq.rank() as usize)
}

fn kind_from_role(role: Role) -> PieceKind {
    match role {
        Role::Pawn => PieceKind::Pawn,
        Role::Knight => PieceKind::Knight,
        Role::Bishop => PieceKind::Bishop,
        Role::Rook => PieceKind::Rook,
        Role::Queen => PieceKind::Queen,
        Role::King => PieceKind::King,
    }
}

fn role_from_kind(kind: PieceKind) -> Role {
    match kind {
        PieceKind::Pawn => Role::Pawn,
        PieceKind::Knight => Role::Knight,
        PieceKind::Bishop => Role::Bishop,
        PieceKind::Rook => Role::Rook,
        PieceKind::Queen => Role::Queen,
        PieceKind::King => Role::King,
    }
}

fn color_from_shakmaty(color: shakmaty::Color) -> Color {
    match color {
        shakmaty::Color::White => Color::White,
        shakmaty::Color::Black => Color::Black,
    }
}

fn color_to_shakmaty(color: Color) -> shakmaty::Color {
    match color {
        Color::White => shakmaty::Color::White,
        Color::Black => shakmaty::Color::Black,
    }
}

fn piece_from_shakmaty(piece: shakmaty::Piece) -> Piece {
    Piece::new(color_from_shakmaty(piece.color), kind_from_role(piece.role))
}

fn piece_to_shakmaty(piece: Piece) -> shakmaty::Piece {
    shakmaty::Piece {
        color: color_to_shakmaty(piece.color),
        role: role_from_kind(piece.kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn play(engine: &mut StandardChess, lan: &str) -> MoveRecord {
        let from = sq(&lan[0..2]);
        let to = sq(&lan[2..4]);
        engine
            .play(from, to, None)
            .unwrap_or_else(|| panic!("move {} should be legal", lan))
    }

    #[test]
    fn square_conversion_roundtrip() {
        for &s in Square::ALL.iter() {
            let converted = to_shakmaty(s);
            assert_eq!(converted.to_string(), s.to_string());
            assert_eq!(square_from_shakmaty(converted), s);
        }
    }

    #[test]
    fn starting_board() {
        let engine = StandardChess::new();
        let grid = engine.board();
        assert_eq!(grid.piece_count(), 32);
        assert_eq!(
            grid.get(sq("e1")),
            Some(Piece::new(Color::White, PieceKind::King))
        );
        assert_eq!(
            grid.get(sq("d8")),
            Some(Piece::new(Color::Black, PieceKind::Queen))
        );
        assert_eq!(grid.rows()[1][0], Some(Piece::new(Color::Black, PieceKind::Pawn)));
        assert_eq!(engine.fen(), START_FEN);
    }

    #[test]
    fn twenty_opening_moves() {
        let engine = StandardChess::new();
        let compact = engine.moves(false);
        assert_eq!(compact.len(), 20);
        match compact {
            MoveList::Compact(sans) => {
                assert!(sans.iter().any(|s| s == "e4"));
                assert!(sans.iter().any(|s| s == "Nf3"));
            }
            MoveList::Verbose(_) => panic!("expected compact list"),
        }
        assert_eq!(engine.moves(true).len(), 20);
    }

    #[test]
    fn double_pawn_push_is_flagged() {
        let mut engine = StandardChess::new();
        let record = play(&mut engine, "e2e4");
        assert_eq!(record.flags, "b");
        assert_eq!(record.san, "e4");
        assert_eq!(record.piece, PieceKind::Pawn);
        assert_eq!(record.color, Color::White);
        assert_eq!(record.from, sq("e2"));
        assert_eq!(record.to, sq("e4"));
        assert!(engine.get(sq("e2")).is_none());
        assert_eq!(
            engine.get(sq("e4")),
            Some(Piece::new(Color::White, PieceKind::Pawn))
        );
        assert_eq!(engine.state().turn, Color::Black);
    }

    #[test]
    fn illegal_move_is_rejected() {
        let mut engine = StandardChess::new();
        assert!(engine.play(sq("e2"), sq("e5"), None).is_none());
        assert!(engine.play(sq("e4"), sq("e5"), None).is_none());
        assert_eq!(engine.fen(), START_FEN);
    }

    #[test]
    fn undo_restores_previous_position() {
        let mut engine = StandardChess::new();
        let start = engine.board();
        play(&mut engine, "g1f3");
        let undone = engine.undo().unwrap();
        assert_eq!(undone.san, "Nf3");
        assert_eq!(engine.board(), start);
        assert_eq!(engine.fen(), START_FEN);
        assert!(engine.undo().is_none());
    }

    #[test]
    fn castling_reports_king_destination() {
        let mut engine = StandardChess::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let record = play(&mut engine, "e1g1");
        assert_eq!(record.flags, "k");
        assert_eq!(record.to, sq("g1"));
        assert_eq!(record.san, "O-O");
        assert_eq!(
            engine.get(sq("g1")),
            Some(Piece::new(Color::White, PieceKind::King))
        );
        assert_eq!(
            engine.get(sq("f1")),
            Some(Piece::new(Color::White, PieceKind::Rook))
        );

        let record = play(&mut engine, "e8c8");
        assert_eq!(record.flags, "q");
        assert_eq!(record.to, sq("c8"));
    }

    #[test]
    fn promotion_defaults_to_queen() {
        let mut engine = StandardChess::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").unwrap();
        let record = play(&mut engine, "a7a8");
        assert_eq!(record.promotion, Some(PieceKind::Queen));
        assert!(record.has_flag(flags::PROMOTION));
        assert_eq!(
            engine.get(sq("a8")),
            Some(Piece::new(Color::White, PieceKind::Queen))
        );
    }

    #[test]
    fn explicit_underpromotion() {
        let mut engine = StandardChess::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").unwrap();
        let record = engine
            .play(sq("a7"), sq("a8"), Some(PieceKind::Knight))
            .unwrap();
        assert_eq!(record.promotion, Some(PieceKind::Knight));
        assert_eq!(record.to, sq("a8"));
        assert!(record.has_flag(flags::PROMOTION));
    }

    #[test]
    fn capture_is_flagged() {
        let mut engine = StandardChess::new();
        play(&mut engine, "e2e4");
        play(&mut engine, "d7d5");
        let record = play(&mut engine, "e4d5");
        assert_eq!(record.flags, "c");
        assert_eq!(record.captured, Some(PieceKind::Pawn));
        assert_eq!(record.san, "exd5");
    }

    #[test]
    fn load_rejects_garbage_and_keeps_position() {
        let mut engine = StandardChess::new();
        play(&mut engine, "e2e4");
        let before = engine.fen();
        let err = engine.load("not a fen").unwrap_err();
        assert!(matches!(err, EngineError::InvalidFen { .. }));
        assert_eq!(engine.fen(), before);
    }

    #[test]
    fn load_valid_fen() {
        let fen = "4k3/8/8/8/8/8/8/4K2R w K - 0 1";
        let mut engine = StandardChess::new();
        engine.load(fen).unwrap();
        assert_eq!(engine.fen(), fen);
        assert_eq!(engine.board().piece_count(), 3);
    }

    #[test]
    fn put_then_get() {
        let mut engine = StandardChess::new();
        let wq = Piece::new(Color::White, PieceKind::Queen);
        engine.put(wq, sq("e4")).unwrap();
        assert_eq!(engine.get(sq("e4")), Some(wq));
        assert_eq!(engine.board().piece_count(), 33);
    }

    #[test]
    fn put_second_king_is_rejected() {
        let mut engine = StandardChess::new();
        let before = engine.fen();
        let result = engine.put(Piece::new(Color::White, PieceKind::King), sq("e4"));
        assert!(matches!(result, Err(EngineError::InvalidPosition(_))));
        assert_eq!(engine.fen(), before);
    }

    #[test]
    fn remove_returns_removed_piece() {
        let mut engine = StandardChess::new();
        let removed = engine.remove(sq("e2")).unwrap();
        assert_eq!(removed, Some(Piece::new(Color::White, PieceKind::Pawn)));
        assert!(engine.get(sq("e2")).is_none());
        assert_eq!(engine.remove(sq("e4")).unwrap(), None);
    }

    #[test]
    fn removing_from_an_empty_square_clears_history() {
        let mut engine = StandardChess::new();
        play(&mut engine, "e2e4");
        assert_eq!(engine.remove(sq("d4")).unwrap(), None);
        assert_eq!(engine.history().count(), 0);
        assert!(engine.undo().is_none());
    }

    #[test]
    fn removing_a_king_is_rejected() {
        let mut engine = StandardChess::new();
        assert!(engine.remove(sq("e1")).is_err());
        assert!(engine.get(sq("e1")).is_some());
    }

    #[test]
    fn removing_a_rook_drops_its_castling_right() {
        let mut engine = StandardChess::new();
        engine.remove(sq("h1")).unwrap();
        let fen = engine.fen();
        let castling = fen.split(' ').nth(2).unwrap();
        assert_eq!(castling, "Qkq");
    }

    #[test]
    fn fools_mate_state() {
        let mut engine = StandardChess::new();
        for lan in ["f2f3", "e7e5", "g2g4"] {
            play(&mut engine, lan);
        }
        let mate = play(&mut engine, "d8h4");
        assert_eq!(mate.san, "Qh4#");

        let state = engine.state();
        assert!(state.in_check);
        assert!(state.in_checkmate);
        assert!(state.game_over);
        assert!(!state.in_draw);
        assert_eq!(state.turn, Color::White);
        assert!(engine.moves(false).is_empty());
    }

    #[test]
    fn threefold_repetition_is_a_draw() {
        let mut engine = StandardChess::new();
        for _ in 0..2 {
            for lan in ["g1f3", "g8f6", "f3g1", "f6g8"] {
                play(&mut engine, lan);
            }
        }
        let state = engine.state();
        assert!(state.in_threefold_repetition);
        assert!(state.in_draw);
        assert!(state.game_over);
    }

    #[test]
    fn insufficient_material_is_a_draw() {
        let engine = StandardChess::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let state = engine.state();
        assert!(state.insufficient_material);
        assert!(state.in_draw);
    }

    #[test]
    fn reset_clears_history() {
        let mut engine = StandardChess::new();
        play(&mut engine, "e2e4");
        engine.reset();
        assert_eq!(engine.fen(), START_FEN);
        assert_eq!(engine.history().count(), 0);
        assert!(engine.undo().is_none());
    }
}
