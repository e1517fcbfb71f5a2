//! Perft: exhaustive legal-move tree counting for move-generator
//! validation, with divide and per-move breakdown variants.

use crate::board::Board;
use crate::moves::{
    execute::{generate_legal, make_move, unmake_move},
    legality::in_check,
    magic::MagicTables,
    types::Move,
};
use tracing::{debug, instrument};

const MAX_PERFT_DEPTH: usize = 16;

/// Per-move-kind tallies accumulated at tree edges.
#[derive(Debug, Default, Clone, Copy)]
pub struct PerftBreakdown {
    pub nodes: u64,
    pub captures: u64,
    pub ep_captures: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
    pub checkmates: u64,
}

impl PerftBreakdown {
    pub fn add(&mut self, other: &PerftBreakdown) {
        self.nodes += other.nodes;
        self.captures += other.captures;
        self.ep_captures += other.ep_captures;
        self.castles += other.castles;
        self.promotions += other.promotions;
        self.checks += other.checks;
        self.checkmates += other.checkmates;
    }
}

/// One legal-move buffer and one pseudo-legal scratch buffer per ply, so
/// the recursion never allocates past warm-up.
struct PerftBuffers {
    moves: Vec<Vec<Move>>,
    scratch: Vec<Vec<Move>>,
}

impl PerftBuffers {
    fn new() -> Self {
        PerftBuffers {
            moves: (0..MAX_PERFT_DEPTH).map(|_| Vec::with_capacity(64)).collect(),
            scratch: (0..MAX_PERFT_DEPTH)
                .map(|_| Vec::with_capacity(256))
                .collect(),
        }
    }
}

fn perft_inner(
    board: &mut Board,
    tables: &MagicTables,
    depth: u32,
    ply: usize,
    buffers: &mut PerftBuffers,
) -> u64 {
    if depth == 0 {
        return 1;
    }

    {
        let (moves, scratch) = (&mut buffers.moves[ply], &mut buffers.scratch[ply]);
        generate_legal(board, tables, moves, scratch);
    }

    if depth == 1 {
        return buffers.moves[ply].len() as u64;
    }

    let mut nodes = 0;
    for i in 0..buffers.moves[ply].len() {
        let mv = buffers.moves[ply][i];
        let undo = make_move(board, mv);
        nodes += perft_inner(board, tables, depth - 1, ply + 1, buffers);
        unmake_move(board, mv, undo);
    }
    nodes
}

/// Count leaf nodes of the legal-move tree at `depth`.
#[instrument(skip(board, tables))]
pub fn perft(board: &mut Board, tables: &MagicTables, depth: u32) -> u64 {
    assert!(
        (depth as usize) < MAX_PERFT_DEPTH,
        "perft depth {depth} exceeds the supported maximum"
    );
    let mut buffers = PerftBuffers::new();
    perft_inner(board, tables, depth, 0, &mut buffers)
}

/// Per-root-move node counts, the standard movegen debugging view.
#[instrument(skip(board, tables))]
pub fn perft_divide(board: &mut Board, tables: &MagicTables, depth: u32) -> Vec<(Move, u64)> {
    assert!(depth >= 1 && (depth as usize) < MAX_PERFT_DEPTH);
    let mut buffers = PerftBuffers::new();

    let mut roots = Vec::with_capacity(64);
    let mut scratch = Vec::with_capacity(256);
    generate_legal(board, tables, &mut roots, &mut scratch);
    debug!(moves = roots.len(), "divide roots");

    let mut rows = Vec::with_capacity(roots.len());
    for mv in roots {
        let undo = make_move(board, mv);
        let nodes = perft_inner(board, tables, depth - 1, 1, &mut buffers);
        unmake_move(board, mv, undo);
        debug!(%mv, nodes, "divide row");
        rows.push((mv, nodes));
    }
    rows
}

fn breakdown_inner(
    board: &mut Board,
    tables: &MagicTables,
    depth: u32,
    ply: usize,
    out: &mut PerftBreakdown,
    buffers: &mut PerftBuffers,
) {
    if depth == 0 {
        out.nodes += 1;
        let checked = in_check(board, board.side_to_move, tables);
        if checked {
            out.checks += 1;
            let (moves, scratch) = (&mut buffers.moves[ply], &mut buffers.scratch[ply]);
            generate_legal(board, tables, moves, scratch);
            if moves.is_empty() {
                out.checkmates += 1;
            }
        }
        return;
    }

    {
        let (moves, scratch) = (&mut buffers.moves[ply], &mut buffers.scratch[ply]);
        generate_legal(board, tables, moves, scratch);
    }

    for i in 0..buffers.moves[ply].len() {
        let mv = buffers.moves[ply][i];
        if depth == 1 {
            if mv.is_capture() {
                out.captures += 1;
                if mv.is_en_passant() {
                    out.ep_captures += 1;
                }
            }
            if mv.is_castling() {
                out.castles += 1;
            }
            if mv.is_promotion() {
                out.promotions += 1;
            }
        }
        let undo = make_move(board, mv);
        breakdown_inner(board, tables, depth - 1, ply + 1, out, buffers);
        unmake_move(board, mv, undo);
    }
}

/// Perft with per-kind tallies of the final-ply moves.
pub fn perft_breakdown(board: &mut Board, tables: &MagicTables, depth: u32) -> PerftBreakdown {
    assert!((depth as usize) < MAX_PERFT_DEPTH);
    let mut buffers = PerftBuffers::new();
    let mut out = PerftBreakdown::default();
    breakdown_inner(board, tables, depth, 0, &mut out, &mut buffers);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::magic::{MagicSeed, generate_magic_tables};

    #[test]
    fn startpos_shallow_depths() {
        let tables = generate_magic_tables(MagicSeed::Fixed(0x45)).unwrap();
        let mut board = Board::new();
        assert_eq!(perft(&mut board, &tables, 0), 1);
        assert_eq!(perft(&mut board, &tables, 1), 20);
        assert_eq!(perft(&mut board, &tables, 2), 400);
    }

    #[test]
    fn divide_rows_sum_to_total() {
        let tables = generate_magic_tables(MagicSeed::Fixed(0x45)).unwrap();
        let mut board = Board::new();
        let rows = perft_divide(&mut board, &tables, 3);
        assert_eq!(rows.len(), 20);
        let total: u64 = rows.iter().map(|(_, n)| n).sum();
        assert_eq!(total, 8_902);
    }

    #[test]
    fn breakdown_counts_startpos_d3() {
        let tables = generate_magic_tables(MagicSeed::Fixed(0x45)).unwrap();
        let mut board = Board::new();
        let out = perft_breakdown(&mut board, &tables, 3);
        assert_eq!(out.nodes, 8_902);
        assert_eq!(out.captures, 34);
        assert_eq!(out.ep_captures, 0);
        assert_eq!(out.castles, 0);
        assert_eq!(out.checks, 12);
        assert_eq!(out.checkmates, 0);
    }
}
