//! Game-status classification for drivers: terminal and claimable
//! outcomes, kept out of the search which only needs the draw scores.

use crate::bitboard::BitboardExt;
use crate::board::{Board, Color, Piece};
use crate::moves::execute::generate_legal;
use crate::moves::legality::in_check;
use crate::moves::magic::MagicTables;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InPlay,
    Checkmate,
    Stalemate,
    DrawFivefold,
    DrawSeventyFiveMove,
    DrawThreefold,
    DrawFiftyMove,
    DrawInsufficientMaterial,
}

pub fn is_fifty_move_draw(board: &Board) -> bool {
    board.halfmove_clock >= 100
}

pub fn is_seventy_five_move_draw(board: &Board) -> bool {
    board.halfmove_clock >= 150
}

pub fn is_fivefold(board: &Board) -> bool {
    board.repetition_count() >= 5
}

/// Neither side can possibly deliver mate: bare kings, or a lone minor,
/// or minor versus minor.
pub fn is_insufficient_material(board: &Board) -> bool {
    for color in [Color::White, Color::Black] {
        let heavy = board.pieces(color, Piece::Pawn)
            | board.pieces(color, Piece::Rook)
            | board.pieces(color, Piece::Queen);
        if heavy != 0 {
            return false;
        }
    }

    let white_minors = (board.pieces(Color::White, Piece::Knight)
        | board.pieces(Color::White, Piece::Bishop))
    .count();
    let black_minors = (board.pieces(Color::Black, Piece::Knight)
        | board.pieces(Color::Black, Piece::Bishop))
    .count();

    match white_minors + black_minors {
        // K vs K, K+minor vs K
        0 | 1 => true,
        2 => {
            // minor vs minor cannot force mate; two knights cannot either
            white_minors == black_minors
                || board.pieces(Color::White, Piece::Knight).count() == 2
                || board.pieces(Color::Black, Piece::Knight).count() == 2
        }
        _ => false,
    }
}

/// Classify the current position, automatic draws first, then claimable
/// ones, then move-based outcomes.
pub fn position_status(board: &mut Board, tables: &MagicTables) -> GameStatus {
    if is_fivefold(board) {
        return GameStatus::DrawFivefold;
    }
    if is_seventy_five_move_draw(board) {
        return GameStatus::DrawSeventyFiveMove;
    }
    if is_insufficient_material(board) {
        return GameStatus::DrawInsufficientMaterial;
    }
    if board.is_threefold() {
        return GameStatus::DrawThreefold;
    }
    if is_fifty_move_draw(board) {
        return GameStatus::DrawFiftyMove;
    }

    let mut moves = Vec::with_capacity(64);
    let mut scratch = Vec::with_capacity(256);
    generate_legal(board, tables, &mut moves, &mut scratch);
    if moves.is_empty() {
        if in_check(board, board.side_to_move, tables) {
            GameStatus::Checkmate
        } else {
            GameStatus::Stalemate
        }
    } else {
        GameStatus::InPlay
    }
}
