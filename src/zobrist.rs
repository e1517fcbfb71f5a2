//! Zobrist hashing constants and the en-passant hashing rule.
//!
//! One 64-bit key per (color, piece, square), one for Black to move, four
//! for the castling rights and eight for the en-passant files. Keys are
//! drawn once per process from a seeded PRNG; the `deterministic_zobrist`
//! feature pins the seed so keys are identical across runs.

use crate::bitboard::{black_pawn_attacks, white_pawn_attacks};
use crate::board::{Board, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Color, Piece};
use once_cell::sync::OnceCell;
use rand::{RngCore, SeedableRng, rngs::StdRng};

#[cfg(feature = "deterministic_zobrist")]
const ZOBRIST_SEED: u64 = 0xC0DE_D00D_5EED_0001;

pub struct ZobristKeys {
    /// [color][piece][square], indexed by the enum discriminants.
    pub piece: [[[u64; 64]; 6]; 2],
    /// XORed in when Black is to move.
    pub side_to_move: u64,
    /// [WK, WQ, BK, BQ].
    pub castling: [u64; 4],
    /// En-passant file a..h.
    pub ep_file: [u64; 8],
}

/// Process-wide immutable keys.
pub fn zobrist_keys() -> &'static ZobristKeys {
    static KEYS: OnceCell<ZobristKeys> = OnceCell::new();
    KEYS.get_or_init(|| generate_keys(make_rng()))
}

fn make_rng() -> StdRng {
    #[cfg(feature = "deterministic_zobrist")]
    {
        StdRng::seed_from_u64(ZOBRIST_SEED)
    }
    #[cfg(not(feature = "deterministic_zobrist"))]
    {
        let mut seed = [0u8; 32];
        rand::rng().fill_bytes(&mut seed);
        StdRng::from_seed(seed)
    }
}

fn generate_keys(mut rng: StdRng) -> ZobristKeys {
    // Zero keys would make distinct states indistinguishable, skip them.
    let mut next = move || loop {
        let v = rng.next_u64();
        if v != 0 {
            return v;
        }
    };

    let mut keys = ZobristKeys {
        piece: [[[0; 64]; 6]; 2],
        side_to_move: 0,
        castling: [0; 4],
        ep_file: [0; 8],
    };

    for color in keys.piece.iter_mut() {
        for piece in color.iter_mut() {
            for square in piece.iter_mut() {
                *square = next();
            }
        }
    }
    keys.side_to_move = next();
    for key in keys.castling.iter_mut() {
        *key = next();
    }
    for key in keys.ep_file.iter_mut() {
        *key = next();
    }

    keys
}

/// XOR the keys for every castling right that differs between `old` and
/// `new` rights into `key`.
#[inline]
pub fn xor_castling_delta(key: &mut u64, keys: &ZobristKeys, old: u8, new: u8) {
    let delta = old ^ new;
    for (bit, castle_key) in [CASTLE_WK, CASTLE_WQ, CASTLE_BK, CASTLE_BQ]
        .iter()
        .zip(keys.castling.iter())
    {
        if delta & bit != 0 {
            *key ^= castle_key;
        }
    }
}

/// The en-passant file that contributes to the current key, if any.
///
/// The file is hashed only when the side to move actually has a pawn that
/// could capture onto the target square. Without this rule, positions that
/// differ only in an uncapturable ep target would hash differently and
/// break repetition detection.
pub fn ep_file_in_key(board: &Board) -> Option<u8> {
    let target = board.en_passant?;
    let target_bb = target.bb();

    // Origins from which a pawn of the side to move attacks the target are
    // the pawn attacks *from* the target in the opposite direction.
    let capturers = match board.side_to_move {
        Color::White => black_pawn_attacks(target_bb) & board.pieces(Color::White, Piece::Pawn),
        Color::Black => white_pawn_attacks(target_bb) & board.pieces(Color::Black, Piece::Pawn),
    };

    if capturers != 0 { Some(target.file()) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn keys_are_nonzero_and_distinct_enough() {
        let keys = zobrist_keys();
        assert_ne!(keys.side_to_move, 0);
        assert!(keys.castling.iter().all(|&k| k != 0));
        assert!(keys.ep_file.iter().all(|&k| k != 0));
        // spot-check a few piece keys differ
        assert_ne!(keys.piece[0][0][0], keys.piece[1][0][0]);
        assert_ne!(keys.piece[0][0][0], keys.piece[0][0][1]);
    }

    #[test]
    fn castling_delta_is_involutive() {
        let keys = zobrist_keys();
        let mut key = 0x1234u64;
        xor_castling_delta(&mut key, keys, 0b1111, 0b0101);
        xor_castling_delta(&mut key, keys, 0b0101, 0b1111);
        assert_eq!(key, 0x1234);
    }

    #[test]
    fn ep_file_requires_a_capturer() {
        // white pawn on f5 can take e6 en passant, so the file is hashed
        let board = Board::from_str("4k3/8/8/4pP2/8/8/8/4K3 w - e6 0 1").unwrap();
        assert_eq!(ep_file_in_key(&board), Some(4));

        // no capturer, no contribution
        let board = Board::from_str("4k3/8/8/4p3/8/8/8/4K3 w - e6 0 1").unwrap();
        assert_eq!(ep_file_in_key(&board), None);
    }

    #[test]
    fn uncapturable_ep_target_does_not_change_key() {
        use crate::board::Board;
        let with_ep = Board::from_str("4k3/8/8/4p3/8/8/8/4K3 w - e6 0 1").unwrap();
        let without = Board::from_str("4k3/8/8/4p3/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(with_ep.zobrist, without.zobrist);
    }
}
