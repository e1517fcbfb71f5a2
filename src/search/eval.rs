//! Static evaluation: material + piece-square tables with game-phase
//! interpolation. A pure function of the position, in centipawns from the
//! side to move's perspective.

use crate::bitboard::BitboardExt;
use crate::board::{Board, Color, PIECES, Piece};
use crate::search::psqt;

const KNIGHT_PHASE: i32 = 1;
const BISHOP_PHASE: i32 = 1;
const ROOK_PHASE: i32 = 2;
const QUEEN_PHASE: i32 = 4;
const TOTAL_PHASE: i32 = 24;

fn piece_tables(piece: Piece) -> (&'static [i32; 64], &'static [i32; 64]) {
    match piece {
        Piece::Pawn => psqt::PAWN_TABLE,
        Piece::Knight => psqt::KNIGHT_TABLE,
        Piece::Bishop => psqt::BISHOP_TABLE,
        Piece::Rook => psqt::ROOK_TABLE,
        Piece::Queen => psqt::QUEEN_TABLE,
        Piece::King => psqt::KING_TABLE,
    }
}

fn piece_values(piece: Piece) -> (i32, i32) {
    match piece {
        Piece::Pawn => psqt::PAWN_VAL,
        Piece::Knight => psqt::KNIGHT_VAL,
        Piece::Bishop => psqt::BISHOP_VAL,
        Piece::Rook => psqt::ROOK_VAL,
        Piece::Queen => psqt::QUEEN_VAL,
        Piece::King => psqt::KING_VAL,
    }
}

/// Game phase in [0, TOTAL_PHASE]: full material = TOTAL_PHASE (pure
/// middlegame), bare kings = 0 (pure endgame).
fn game_phase(board: &Board) -> i32 {
    let mut phase = 0;
    for color in [Color::White, Color::Black] {
        phase += board.pieces(color, Piece::Knight).count() as i32 * KNIGHT_PHASE;
        phase += board.pieces(color, Piece::Bishop).count() as i32 * BISHOP_PHASE;
        phase += board.pieces(color, Piece::Rook).count() as i32 * ROOK_PHASE;
        phase += board.pieces(color, Piece::Queen).count() as i32 * QUEEN_PHASE;
    }
    phase.min(TOTAL_PHASE)
}

/// Table index for a piece of `color` on `sq`: tables are stored in visual
/// order (a8 first), so White mirrors vertically.
#[inline(always)]
fn table_index(color: Color, sq: u8) -> usize {
    match color {
        Color::White => (sq ^ 56) as usize,
        Color::Black => sq as usize,
    }
}

/// Evaluate the position in centipawns from the side to move.
pub fn evaluate(board: &Board) -> i32 {
    let mut mg = 0;
    let mut eg = 0;

    for color in [Color::White, Color::Black] {
        let sign = if color == Color::White { 1 } else { -1 };
        for piece in PIECES {
            let (mg_val, eg_val) = piece_values(piece);
            let (mg_table, eg_table) = piece_tables(piece);
            let mut bb = board.pieces(color, piece);
            while bb != 0 {
                let sq = bb.pop_lsb();
                let idx = table_index(color, sq);
                mg += sign * (mg_val + mg_table[idx]);
                eg += sign * (eg_val + eg_table[idx]);
            }
        }
    }

    let phase = game_phase(board);
    let white_score = (mg * phase + eg * (TOTAL_PHASE - phase)) / TOTAL_PHASE;

    match board.side_to_move {
        Color::White => white_score,
        Color::Black => -white_score,
    }
}
