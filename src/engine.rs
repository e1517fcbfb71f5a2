//! The engine facade a UCI driver talks to.
//!
//! Owns the position, the attack tables, the transposition table and the
//! search state. Attack tables and Zobrist keys are fully built before the
//! constructor returns, so nothing downstream can observe uninitialized
//! tables.

use crate::board::{Board, FenError, MoveParseError, Piece};
use crate::moves::execute::{generate_legal, make_move};
use crate::moves::magic::{MagicTables, load_magic_tables};
use crate::moves::types::Move;
use crate::search::context::SearchContext;
use crate::search::search::{
    SearchInfo, SearchLimits, SearchOutcome, iterative_deepening,
};
use crate::search::tt::TranspositionTable;
use crate::square::Square;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

pub const DEFAULT_TT_MB: usize = 64;

pub struct Engine {
    board: Board,
    tables: MagicTables,
    tt: TranspositionTable,
    ctx: SearchContext,
    stop: Arc<AtomicBool>,
}

impl Engine {
    pub fn new() -> Self {
        Engine::with_tt_size(DEFAULT_TT_MB)
    }

    pub fn with_tt_size(tt_mb: usize) -> Self {
        let engine = Engine {
            board: Board::new(),
            tables: load_magic_tables(),
            tt: TranspositionTable::new(tt_mb),
            ctx: SearchContext::new(),
            stop: Arc::new(AtomicBool::new(false)),
        };

        #[cfg(debug_assertions)]
        engine.self_check();

        engine
    }

    /// Spot-check the freshly built tables against the ray-cast oracle
    /// and the start position against its invariants.
    #[cfg(debug_assertions)]
    fn self_check(&self) {
        use crate::moves::tables::{bishop_rays, rook_rays};
        for sq in [0usize, 27, 36, 63] {
            for occ in [0u64, 0x00FF_0810_0F0F_F00Fu64] {
                debug_assert_eq!(self.tables.rook_attacks(sq, occ), rook_rays(sq, occ));
                debug_assert_eq!(self.tables.bishop_attacks(sq, occ), bishop_rays(sq, occ));
            }
        }
        debug_assert!(self.board.validate().is_ok());
        self.board.assert_zobrist();
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn tables(&self) -> &MagicTables {
        &self.tables
    }

    pub fn set_start_position(&mut self) {
        self.board = Board::new();
    }

    /// Replace the position from a FEN line; the position is untouched on
    /// error.
    pub fn set_from_fen(&mut self, fen: &str) -> Result<(), FenError> {
        self.board.set_fen(fen)
    }

    /// Legal moves of the current position.
    pub fn legal_moves(&mut self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(64);
        let mut scratch = Vec::with_capacity(256);
        generate_legal(&mut self.board, &self.tables, &mut moves, &mut scratch);
        moves
    }

    /// Parse a UCI move string ("e2e4", "e7e8q"), match it against the
    /// legal-move list and apply it. The position is untouched on error.
    pub fn apply_move(&mut self, notation: &str) -> Result<(), MoveParseError> {
        let mv = self.parse_uci_move(notation)?;
        make_move(&mut self.board, mv);
        Ok(())
    }

    fn parse_uci_move(&mut self, notation: &str) -> Result<Move, MoveParseError> {
        if notation.len() < 4 || notation.len() > 5 {
            return Err(MoveParseError::InvalidLength {
                len: notation.len(),
            });
        }
        if !notation.is_ascii() {
            return Err(MoveParseError::InvalidSquare {
                notation: notation.to_string(),
            });
        }

        let from = Square::from_algebraic(&notation[0..2]).ok_or_else(|| {
            MoveParseError::InvalidSquare {
                notation: notation.to_string(),
            }
        })?;
        let to = Square::from_algebraic(&notation[2..4]).ok_or_else(|| {
            MoveParseError::InvalidSquare {
                notation: notation.to_string(),
            }
        })?;

        let promotion = match notation.as_bytes().get(4) {
            None => None,
            Some(b'q') => Some(Piece::Queen),
            Some(b'r') => Some(Piece::Rook),
            Some(b'b') => Some(Piece::Bishop),
            Some(b'n') => Some(Piece::Knight),
            Some(&glyph) => {
                return Err(MoveParseError::InvalidPromotion {
                    glyph: glyph as char,
                });
            }
        };

        self.legal_moves()
            .into_iter()
            .find(|mv| mv.from == from && mv.to == to && mv.promotion == promotion)
            .ok_or_else(|| MoveParseError::IllegalMove {
                notation: notation.to_string(),
            })
    }

    /// Forget everything learned in the current game: transposition
    /// table, killers, history.
    pub fn new_game(&mut self) {
        self.tt.clear();
        self.ctx.reset();
    }

    /// Shared cancellation flag; a driver thread sets it to end the
    /// running search at its next poll.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Run a search under `limits`, reporting each completed iteration
    /// through `on_iteration`. The returned best move is re-validated
    /// against a fresh legal-move list; an illegal result (which would be
    /// an engine bug) is replaced by any legal move, and `None` means the
    /// position has no legal moves.
    pub fn go(
        &mut self,
        limits: &SearchLimits,
        on_iteration: impl FnMut(&SearchInfo),
    ) -> SearchOutcome {
        self.stop.store(false, Ordering::Relaxed);

        let mut outcome = iterative_deepening(
            &mut self.board,
            &self.tables,
            &mut self.tt,
            &mut self.ctx,
            limits,
            Arc::clone(&self.stop),
            on_iteration,
        );

        // Last line of defense: never hand the driver an illegal move.
        let legal = self.legal_moves();
        match outcome.best_move {
            Some(best) if !legal.contains(&best) => {
                warn!(%best, "search returned an illegal move, substituting");
                outcome.best_move = legal.first().copied();
            }
            None if !legal.is_empty() => {
                // interrupted before depth 1 completed; any legal move
                // beats forfeiting
                outcome.best_move = legal.first().copied();
            }
            _ => {}
        }

        outcome
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}
