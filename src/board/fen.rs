//! Forsyth-Edwards Notation parsing and emission.

use super::{Board, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Color, FenError, Piece};
use crate::bitboard::BitboardExt;
use crate::square::Square;

pub(super) fn piece_glyph(color: Color, piece: Piece) -> char {
    let glyph = match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    };
    match color {
        Color::White => glyph.to_ascii_uppercase(),
        Color::Black => glyph,
    }
}

/// Rights supported by the actual king and rook placement.
fn consistent_rights(board: &Board) -> u8 {
    let mut rights = 0;
    let at = |name: &str| Square::from_algebraic(name).map(|sq| board.piece_at(sq));

    if at("e1") == Some(Some((Color::White, Piece::King))) {
        if at("h1") == Some(Some((Color::White, Piece::Rook))) {
            rights |= CASTLE_WK;
        }
        if at("a1") == Some(Some((Color::White, Piece::Rook))) {
            rights |= CASTLE_WQ;
        }
    }
    if at("e8") == Some(Some((Color::Black, Piece::King))) {
        if at("h8") == Some(Some((Color::Black, Piece::Rook))) {
            rights |= CASTLE_BK;
        }
        if at("a8") == Some(Some((Color::Black, Piece::Rook))) {
            rights |= CASTLE_BQ;
        }
    }
    rights
}

fn glyph_piece(glyph: char) -> Option<(Color, Piece)> {
    let piece = match glyph.to_ascii_lowercase() {
        'p' => Piece::Pawn,
        'n' => Piece::Knight,
        'b' => Piece::Bishop,
        'r' => Piece::Rook,
        'q' => Piece::Queen,
        'k' => Piece::King,
        _ => return None,
    };
    let color = if glyph.is_ascii_uppercase() {
        Color::White
    } else {
        Color::Black
    };
    Some((color, piece))
}

impl Board {
    /// Replace the position with the one described by `fen`. On error the
    /// board is left exactly as it was. The two move counters are optional
    /// and default to 0 and 1.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(FenError::TooFewFields {
                found: fields.len(),
            });
        }

        let mut board = Board::empty();

        // Field 1: piece placement, rank 8 first.
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::BadRankCount { ranks: ranks.len() });
        }
        for (row, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - row as u8;
            let mut file = 0u8;
            for glyph in rank_str.chars() {
                if let Some(skip) = glyph.to_digit(10) {
                    if skip == 0 || skip > 8 {
                        return Err(FenError::InvalidPiece { glyph });
                    }
                    file += skip as u8;
                    if file > 8 {
                        return Err(FenError::BadRankWidth {
                            rank: rank as usize + 1,
                            files: file as usize,
                        });
                    }
                } else if let Some((color, piece)) = glyph_piece(glyph) {
                    if file > 7 {
                        return Err(FenError::BadRankWidth {
                            rank: rank as usize + 1,
                            files: file as usize + 1,
                        });
                    }
                    board.put_piece(color, piece, Square::make(file, rank));
                    file += 1;
                } else {
                    return Err(FenError::InvalidPiece { glyph });
                }
            }
            if file != 8 {
                return Err(FenError::BadRankWidth {
                    rank: rank as usize + 1,
                    files: file as usize,
                });
            }
        }

        let white_kings = board.pieces(Color::White, Piece::King).count();
        let black_kings = board.pieces(Color::Black, Piece::King).count();
        if white_kings != 1 || black_kings != 1 {
            return Err(FenError::BadKingCount {
                white: white_kings,
                black: black_kings,
            });
        }

        // Field 2: side to move.
        board.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(FenError::InvalidSideToMove {
                    found: other.to_string(),
                });
            }
        };

        // Field 3: castling rights. Rights whose king or rook is not on
        // its home square are silently dropped, so downstream castling
        // logic can rely on the geometry.
        if fields[2] != "-" {
            for glyph in fields[2].chars() {
                board.castling_rights |= match glyph {
                    'K' => CASTLE_WK,
                    'Q' => CASTLE_WQ,
                    'k' => CASTLE_BK,
                    'q' => CASTLE_BQ,
                    _ => return Err(FenError::InvalidCastling { glyph }),
                };
            }
            board.castling_rights &= consistent_rights(&board);
        }

        // Field 4: en-passant target, only ever on rank 3 or 6.
        if fields[3] != "-" {
            let sq = Square::from_algebraic(fields[3]).ok_or_else(|| FenError::InvalidEnPassant {
                found: fields[3].to_string(),
            })?;
            if sq.rank() != 2 && sq.rank() != 5 {
                return Err(FenError::InvalidEnPassant {
                    found: fields[3].to_string(),
                });
            }
            board.en_passant = Some(sq);
        }

        // Fields 5 and 6: clocks, optional.
        board.halfmove_clock = match fields.get(4) {
            Some(raw) => raw.parse().map_err(|_| FenError::InvalidCounter {
                found: raw.to_string(),
            })?,
            None => 0,
        };
        board.fullmove_number = match fields.get(5) {
            Some(raw) => raw.parse().map_err(|_| FenError::InvalidCounter {
                found: raw.to_string(),
            })?,
            None => 1,
        };

        board.zobrist = board.compute_zobrist();
        *self = board;
        Ok(())
    }

    /// Emit the position as a six-field FEN line.
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(90);

        for rank in (0..8u8).rev() {
            let mut empty_run = 0;
            for file in 0..8u8 {
                match self.piece_at(Square::make(file, rank)) {
                    Some((color, piece)) => {
                        if empty_run > 0 {
                            fen.push(char::from_digit(empty_run, 10).unwrap());
                            empty_run = 0;
                        }
                        fen.push(piece_glyph(color, piece));
                    }
                    None => empty_run += 1,
                }
            }
            if empty_run > 0 {
                fen.push(char::from_digit(empty_run, 10).unwrap());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        fen.push(' ');
        if self.castling_rights == 0 {
            fen.push('-');
        } else {
            for (bit, glyph) in [
                (CASTLE_WK, 'K'),
                (CASTLE_WQ, 'Q'),
                (CASTLE_BK, 'k'),
                (CASTLE_BQ, 'q'),
            ] {
                if self.castling_rights & bit != 0 {
                    fen.push(glyph);
                }
            }
        }

        fen.push(' ');
        match self.en_passant {
            Some(sq) => fen.push_str(&sq.to_string()),
            None => fen.push('-'),
        }

        fen.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        fen
    }
}
