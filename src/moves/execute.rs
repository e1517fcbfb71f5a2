//! Making and unmaking moves, and the legality filter.
//!
//! Every make returns an [`Undo`] record that restores the position
//! byte-for-byte, Zobrist key and repetition history included. The pairing
//! is the caller's responsibility; the search keeps the record on its call
//! stack so every return path unwinds through the matching unmake.

use crate::board::{
    Board, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Color, Piece,
};
use crate::moves::legality::in_check;
use crate::moves::magic::MagicTables;
use crate::moves::movegen::generate_pseudo_legal;
use crate::moves::types::{Move, MoveBuffer, Undo};
use crate::square::Square;
use crate::zobrist::{ep_file_in_key, xor_castling_delta, zobrist_keys};

/// Castling right tied to a rook's home corner, if any.
#[inline(always)]
fn corner_right(color: Color, sq: Square) -> u8 {
    match (color, sq.index()) {
        (Color::White, 0) => CASTLE_WQ,  // a1
        (Color::White, 7) => CASTLE_WK,  // h1
        (Color::Black, 56) => CASTLE_BQ, // a8
        (Color::Black, 63) => CASTLE_BK, // h8
        _ => 0,
    }
}

/// The square of the pawn removed by an en-passant capture.
#[inline(always)]
fn en_passant_victim_square(to: Square, mover: Color) -> Square {
    match mover {
        Color::White => Square::from_index(to.index() - 8),
        Color::Black => Square::from_index(to.index() + 8),
    }
}

/// Apply `mv` to `board`. The move must be pseudo-legal for the side to
/// move; legality is the caller's concern (see [`generate_legal`]).
pub fn make_move(board: &mut Board, mv: Move) -> Undo {
    let keys = zobrist_keys();
    let mover = board.side_to_move;
    let pre_key = board.zobrist;

    // The old en-passant file leaves the key first, while the state it was
    // computed from is still intact.
    if let Some(file) = ep_file_in_key(board) {
        board.zobrist ^= keys.ep_file[file as usize];
    }

    let mut undo = Undo {
        captured: None,
        castling_rook: None,
        prev_castling_rights: board.castling_rights,
        prev_en_passant: board.en_passant,
        prev_halfmove_clock: board.halfmove_clock,
        prev_fullmove_number: board.fullmove_number,
        prev_reversible_base: 0,
    };
    board.en_passant = None;

    let irreversible = mv.piece == Piece::Pawn || mv.is_capture();
    if irreversible {
        board.halfmove_clock = 0;
    } else {
        board.halfmove_clock += 1;
    }

    // Remove the victim before the mover arrives on its square.
    if let Some(victim) = mv.captured {
        let victim_sq = if mv.is_en_passant() {
            en_passant_victim_square(mv.to, mover)
        } else {
            mv.to
        };
        debug_assert_eq!(board.piece_at(victim_sq), Some((mover.opposite(), victim)));
        board.take_piece(mover.opposite(), victim, victim_sq);
        undo.captured = Some((victim, victim_sq));
    }

    // Relocate the mover; a promotion swaps the pawn for the new piece.
    board.take_piece(mover, mv.piece, mv.from);
    match mv.promotion {
        Some(promo) => board.put_piece(mover, promo, mv.to),
        None => board.put_piece(mover, mv.piece, mv.to),
    }

    // Castling also relocates the rook: h->f on the kingside, a->d on the
    // queenside, relative to the king's start square.
    if mv.is_castling() {
        let from = mv.from.index();
        let (rook_from, rook_to) = if mv.is_kingside_castle() {
            (Square::from_index(from + 3), Square::from_index(from + 1))
        } else {
            (Square::from_index(from - 4), Square::from_index(from - 1))
        };
        board.take_piece(mover, Piece::Rook, rook_from);
        board.put_piece(mover, Piece::Rook, rook_to);
        undo.castling_rook = Some((rook_from, rook_to));
    }

    // Rights fall when the king moves, a rook leaves its corner, or a rook
    // is captured on its corner.
    let mut lost_rights = 0u8;
    if mv.piece == Piece::King {
        lost_rights |= match mover {
            Color::White => CASTLE_WK | CASTLE_WQ,
            Color::Black => CASTLE_BK | CASTLE_BQ,
        };
    }
    if mv.piece == Piece::Rook {
        lost_rights |= corner_right(mover, mv.from);
    }
    if let Some((Piece::Rook, victim_sq)) = undo.captured {
        lost_rights |= corner_right(mover.opposite(), victim_sq);
    }
    let new_rights = board.castling_rights & !lost_rights;
    if new_rights != board.castling_rights {
        xor_castling_delta(&mut board.zobrist, keys, board.castling_rights, new_rights);
        board.castling_rights = new_rights;
    }

    // A double push leaves its crossed square as the en-passant target.
    if mv.is_double_pawn_push() {
        let crossed = (mv.from.index() + mv.to.index()) / 2;
        board.en_passant = Some(Square::from_index(crossed));
    }

    board.side_to_move = mover.opposite();
    board.zobrist ^= keys.side_to_move;
    if mover == Color::Black {
        board.fullmove_number += 1;
    }

    // The new en-passant file enters the key under the new state.
    if let Some(file) = ep_file_in_key(board) {
        board.zobrist ^= keys.ep_file[file as usize];
    }

    undo.prev_reversible_base = board.push_history(pre_key, irreversible);

    #[cfg(debug_assertions)]
    board.assert_zobrist();

    undo
}

/// Reverse `mv` using its undo record. Restores the exact prior state,
/// history and key included.
pub fn unmake_move(board: &mut Board, mv: Move, undo: Undo) {
    let keys = zobrist_keys();

    // Undo the key pieces in reverse order of make: ep contribution out,
    // side back, rights back, pieces back, old ep contribution in.
    if let Some(file) = ep_file_in_key(board) {
        board.zobrist ^= keys.ep_file[file as usize];
    }

    let mover = board.side_to_move.opposite();
    board.side_to_move = mover;
    board.zobrist ^= keys.side_to_move;

    if board.castling_rights != undo.prev_castling_rights {
        xor_castling_delta(
            &mut board.zobrist,
            keys,
            board.castling_rights,
            undo.prev_castling_rights,
        );
        board.castling_rights = undo.prev_castling_rights;
    }

    board.halfmove_clock = undo.prev_halfmove_clock;
    board.fullmove_number = undo.prev_fullmove_number;

    match mv.promotion {
        Some(promo) => {
            board.take_piece(mover, promo, mv.to);
            board.put_piece(mover, Piece::Pawn, mv.from);
        }
        None => {
            board.take_piece(mover, mv.piece, mv.to);
            board.put_piece(mover, mv.piece, mv.from);
        }
    }

    if let Some((victim, victim_sq)) = undo.captured {
        board.put_piece(mover.opposite(), victim, victim_sq);
    }

    if let Some((rook_from, rook_to)) = undo.castling_rook {
        board.take_piece(mover, Piece::Rook, rook_to);
        board.put_piece(mover, Piece::Rook, rook_from);
    }

    board.en_passant = undo.prev_en_passant;
    if let Some(file) = ep_file_in_key(board) {
        board.zobrist ^= keys.ep_file[file as usize];
    }

    board.pop_history(undo.prev_reversible_base);

    #[cfg(debug_assertions)]
    board.assert_zobrist();
}

/// Is this pseudo-legal move actually legal? Makes the move, asks whether
/// the mover's king is attacked, and unmakes.
pub fn is_legal(board: &mut Board, mv: Move, tables: &MagicTables) -> bool {
    let mover = board.side_to_move;
    let undo = make_move(board, mv);
    let exposed = in_check(board, mover, tables);
    unmake_move(board, mv, undo);
    !exposed
}

/// All strictly legal moves for the side to move. `scratch` holds the
/// pseudo-legal list so the caller controls both allocations.
pub fn generate_legal(
    board: &mut Board,
    tables: &MagicTables,
    moves: &mut impl MoveBuffer,
    scratch: &mut impl MoveBuffer,
) {
    generate_pseudo_legal(board, tables, scratch);
    moves.clear();
    for i in 0..scratch.len() {
        let mv = scratch[i];
        if is_legal(board, mv, tables) {
            moves.push(mv);
        }
    }
}
