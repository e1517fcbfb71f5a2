//! Pseudo-legal move generation.
//!
//! Free functions over `&Board`: the generator owns nothing and returns
//! everything through the caller's buffer. Legality filtering (king safety
//! after the move) lives in `execute::generate_legal`; only the castling
//! path check runs here because it is a property of the current position,
//! not of the resulting one.

use crate::bitboard::{BitboardExt, RANK_1, RANK_2, RANK_7, RANK_8};
use crate::board::{Board, Color, Piece};
use crate::moves::legality::castling_path_is_safe;
use crate::moves::magic::MagicTables;
use crate::moves::tables::{KING_ATTACKS, KNIGHT_ATTACKS, pawn_attacks};
use crate::moves::types::{
    CAPTURE, DOUBLE_PAWN_PUSH, EN_PASSANT, KINGSIDE_CASTLE, Move, MoveBuffer, PROMOTION,
    PROMOTION_CAPTURE, QUEENSIDE_CASTLE, QUIET,
};
use crate::square::Square;

/// Promotion kinds in the order they are emitted.
const PROMOTIONS: [Piece; 4] = [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];

// Squares that must be empty between king and rook.
const WHITE_KINGSIDE_GAP: u64 = 0x0000_0000_0000_0060; // f1 g1
const WHITE_QUEENSIDE_GAP: u64 = 0x0000_0000_0000_000E; // b1 c1 d1
const BLACK_KINGSIDE_GAP: u64 = 0x6000_0000_0000_0000; // f8 g8
const BLACK_QUEENSIDE_GAP: u64 = 0x0E00_0000_0000_0000; // b8 c8 d8

/// Emit one move per set bit in `targets`, tagging captures from the
/// mailbox.
#[inline(always)]
fn push_targets(board: &Board, from: u8, mut targets: u64, piece: Piece, out: &mut impl MoveBuffer) {
    while targets != 0 {
        let to = targets.pop_lsb();
        let to_sq = Square::from_index(to);
        let captured = board.piece_kind_at(to_sq);
        out.push(Move {
            from: Square::from_index(from),
            to: to_sq,
            piece,
            captured,
            promotion: None,
            flags: if captured.is_some() { CAPTURE } else { QUIET },
        });
    }
}

fn knight_moves(board: &Board, target_mask: u64, out: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let mut knights = board.pieces(color, Piece::Knight);
    while knights != 0 {
        let from = knights.pop_lsb();
        let targets = KNIGHT_ATTACKS[from as usize] & target_mask;
        push_targets(board, from, targets, Piece::Knight, out);
    }
}

fn slider_moves(
    board: &Board,
    tables: &MagicTables,
    piece: Piece,
    target_mask: u64,
    out: &mut impl MoveBuffer,
) {
    let color = board.side_to_move;
    let occupied = board.occupied();
    let mut sliders = board.pieces(color, piece);
    while sliders != 0 {
        let from = sliders.pop_lsb();
        let attacks = match piece {
            Piece::Bishop => tables.bishop_attacks(from as usize, occupied),
            Piece::Rook => tables.rook_attacks(from as usize, occupied),
            Piece::Queen => tables.queen_attacks(from as usize, occupied),
            _ => unreachable!("slider_moves called for {piece:?}"),
        };
        push_targets(board, from, attacks & target_mask, piece, out);
    }
}

fn king_moves(
    board: &Board,
    tables: &MagicTables,
    target_mask: u64,
    castles: bool,
    out: &mut impl MoveBuffer,
) {
    let color = board.side_to_move;
    let from = board.king_square(color).index();
    let targets = KING_ATTACKS[from as usize] & target_mask;
    push_targets(board, from, targets, Piece::King, out);

    if !castles {
        return;
    }

    let occupied = board.occupied();
    let (kingside_gap, queenside_gap) = match color {
        Color::White => (WHITE_KINGSIDE_GAP, WHITE_QUEENSIDE_GAP),
        Color::Black => (BLACK_KINGSIDE_GAP, BLACK_QUEENSIDE_GAP),
    };

    if board.has_kingside_castle(color) && occupied & kingside_gap == 0 {
        let mv = Move {
            from: Square::from_index(from),
            to: Square::from_index(from + 2),
            piece: Piece::King,
            captured: None,
            promotion: None,
            flags: KINGSIDE_CASTLE,
        };
        if castling_path_is_safe(board, mv, tables) {
            out.push(mv);
        }
    }
    if board.has_queenside_castle(color) && occupied & queenside_gap == 0 {
        let mv = Move {
            from: Square::from_index(from),
            to: Square::from_index(from - 2),
            piece: Piece::King,
            captured: None,
            promotion: None,
            flags: QUEENSIDE_CASTLE,
        };
        if castling_path_is_safe(board, mv, tables) {
            out.push(mv);
        }
    }
}

#[inline(always)]
fn push_pawn_move(from: u8, to: u8, captured: Option<Piece>, flags: u8, out: &mut impl MoveBuffer) {
    out.push(Move {
        from: Square::from_index(from),
        to: Square::from_index(to),
        piece: Piece::Pawn,
        captured,
        promotion: None,
        flags,
    });
}

#[inline(always)]
fn push_promotions(from: u8, to: u8, captured: Option<Piece>, out: &mut impl MoveBuffer) {
    let flags = if captured.is_some() {
        PROMOTION_CAPTURE
    } else {
        PROMOTION
    };
    for promo in PROMOTIONS {
        out.push(Move {
            from: Square::from_index(from),
            to: Square::from_index(to),
            piece: Piece::Pawn,
            captured,
            promotion: Some(promo),
            flags,
        });
    }
}

fn pawn_quiet_moves(board: &Board, out: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let pawns = board.pieces(color, Piece::Pawn);
    let empty = !board.occupied();

    let (promo_rank, double_rank) = match color {
        Color::White => (RANK_8, RANK_2),
        Color::Black => (RANK_1, RANK_7),
    };

    // Single pushes, promotions included.
    let mut pushes = match color {
        Color::White => (pawns << 8) & empty,
        Color::Black => (pawns >> 8) & empty,
    };
    while pushes != 0 {
        let to = pushes.pop_lsb();
        let from = match color {
            Color::White => to - 8,
            Color::Black => to + 8,
        };
        if (1u64 << to) & promo_rank != 0 {
            push_promotions(from, to, None, out);
        } else {
            push_pawn_move(from, to, None, QUIET, out);
        }
    }

    // Double pushes: both crossed and landing squares must be empty.
    let mut doubles = match color {
        Color::White => (((pawns & double_rank) << 8) & empty) << 8 & empty,
        Color::Black => (((pawns & double_rank) >> 8) & empty) >> 8 & empty,
    };
    while doubles != 0 {
        let to = doubles.pop_lsb();
        let from = match color {
            Color::White => to - 16,
            Color::Black => to + 16,
        };
        push_pawn_move(from, to, None, DOUBLE_PAWN_PUSH, out);
    }
}

fn pawn_capture_moves(board: &Board, out: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let pawns = board.pieces(color, Piece::Pawn);
    let enemy = board.occupancy(color.opposite());

    let promo_rank = match color {
        Color::White => RANK_8,
        Color::Black => RANK_1,
    };

    let mut attackers = pawns;
    while attackers != 0 {
        let from = attackers.pop_lsb();
        let mut targets = pawn_attacks(Square::from_index(from), color) & enemy;
        while targets != 0 {
            let to = targets.pop_lsb();
            let captured = board.piece_kind_at(Square::from_index(to));
            debug_assert!(captured.is_some());
            if (1u64 << to) & promo_rank != 0 {
                push_promotions(from, to, captured, out);
            } else {
                push_pawn_move(from, to, captured, CAPTURE, out);
            }
        }
    }

    // En passant: the captured pawn stands behind the target square. Guard
    // against FENs that announce a target with no pawn to take.
    if let Some(ep_target) = board.en_passant {
        let ep = ep_target.index();
        let victim_sq = match color {
            Color::White => ep - 8,
            Color::Black => ep + 8,
        };
        let victim_present =
            board.pieces(color.opposite(), Piece::Pawn).contains(victim_sq);
        if victim_present && !board.occupied().contains(ep) {
            let mut capturers = match color {
                Color::White => pawn_attacks(ep_target, Color::Black),
                Color::Black => pawn_attacks(ep_target, Color::White),
            } & pawns;
            while capturers != 0 {
                let from = capturers.pop_lsb();
                push_pawn_move(from, ep, Some(Piece::Pawn), EN_PASSANT, out);
            }
        }
    }
}

/// All pseudo-legal moves for the side to move.
pub fn generate_pseudo_legal(board: &Board, tables: &MagicTables, out: &mut impl MoveBuffer) {
    out.clear();
    let not_friendly = !board.occupancy(board.side_to_move);
    pawn_quiet_moves(board, out);
    pawn_capture_moves(board, out);
    knight_moves(board, not_friendly, out);
    slider_moves(board, tables, Piece::Bishop, not_friendly, out);
    slider_moves(board, tables, Piece::Rook, not_friendly, out);
    slider_moves(board, tables, Piece::Queen, not_friendly, out);
    king_moves(board, tables, not_friendly, true, out);
}

/// Pseudo-legal captures and promotions only; the quiescence feed.
pub fn generate_pseudo_legal_tactical(
    board: &Board,
    tables: &MagicTables,
    out: &mut impl MoveBuffer,
) {
    out.clear();
    let enemy = board.occupancy(board.side_to_move.opposite());

    // Promotion pushes count as tactical despite landing on empty squares.
    let color = board.side_to_move;
    let pawns = board.pieces(color, Piece::Pawn);
    let empty = !board.occupied();
    let mut promo_pushes = match color {
        Color::White => ((pawns & RANK_7) << 8) & empty,
        Color::Black => ((pawns & RANK_2) >> 8) & empty,
    };
    while promo_pushes != 0 {
        let to = promo_pushes.pop_lsb();
        let from = match color {
            Color::White => to - 8,
            Color::Black => to + 8,
        };
        push_promotions(from, to, None, out);
    }

    pawn_capture_moves(board, out);
    knight_moves(board, enemy, out);
    slider_moves(board, tables, Piece::Bishop, enemy, out);
    slider_moves(board, tables, Piece::Rook, enemy, out);
    slider_moves(board, tables, Piece::Queen, enemy, out);
    king_moves(board, tables, enemy, false, out);
}
