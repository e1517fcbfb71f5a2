//! Typed errors for board construction and driver move input.

use std::fmt;

/// FEN parsing failure. The board is left untouched when one is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    /// Fewer than the four mandatory fields.
    TooFewFields { found: usize },
    /// Unknown character in the piece-placement field.
    InvalidPiece { glyph: char },
    /// A rank did not describe exactly eight files.
    BadRankWidth { rank: usize, files: usize },
    /// Piece placement did not describe exactly eight ranks.
    BadRankCount { ranks: usize },
    /// Side-to-move field was not 'w' or 'b'.
    InvalidSideToMove { found: String },
    /// Unknown character in the castling field.
    InvalidCastling { glyph: char },
    /// En-passant field was neither '-' nor a square.
    InvalidEnPassant { found: String },
    /// Halfmove or fullmove counter did not parse.
    InvalidCounter { found: String },
    /// Each side must have exactly one king.
    BadKingCount { white: u32, black: u32 },
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenError::TooFewFields { found } => {
                write!(f, "FEN needs at least 4 fields, found {found}")
            }
            FenError::InvalidPiece { glyph } => {
                write!(f, "invalid piece character '{glyph}' in FEN")
            }
            FenError::BadRankWidth { rank, files } => {
                write!(f, "rank {rank} describes {files} files, expected 8")
            }
            FenError::BadRankCount { ranks } => {
                write!(f, "piece placement has {ranks} ranks, expected 8")
            }
            FenError::InvalidSideToMove { found } => {
                write!(f, "invalid side to move '{found}', expected 'w' or 'b'")
            }
            FenError::InvalidCastling { glyph } => {
                write!(f, "invalid castling character '{glyph}'")
            }
            FenError::InvalidEnPassant { found } => {
                write!(f, "invalid en passant square '{found}'")
            }
            FenError::InvalidCounter { found } => {
                write!(f, "invalid move counter '{found}'")
            }
            FenError::BadKingCount { white, black } => {
                write!(f, "expected one king per side, found {white} white / {black} black")
            }
        }
    }
}

impl std::error::Error for FenError {}

/// Failure to turn a driver-supplied UCI move string into a legal move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveParseError {
    /// Move string must be 4 or 5 characters.
    InvalidLength { len: usize },
    /// From- or to-square was not coordinate notation.
    InvalidSquare { notation: String },
    /// Promotion suffix was not one of q/r/b/n.
    InvalidPromotion { glyph: char },
    /// Syntactically fine but not legal in the current position.
    IllegalMove { notation: String },
}

impl fmt::Display for MoveParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveParseError::InvalidLength { len } => {
                write!(f, "move must be 4-5 characters, found {len}")
            }
            MoveParseError::InvalidSquare { notation } => {
                write!(f, "invalid square in move '{notation}'")
            }
            MoveParseError::InvalidPromotion { glyph } => {
                write!(f, "invalid promotion piece '{glyph}'")
            }
            MoveParseError::IllegalMove { notation } => {
                write!(f, "move '{notation}' is not legal here")
            }
        }
    }
}

impl std::error::Error for MoveParseError {}
