//! Iterative-deepening fail-soft negamax with alpha-beta, quiescence and
//! transposition table.
//!
//! Every make is paired with an unmake on every path out of a node; early
//! returns happen only after the unmake, so a cancelled search always
//! leaves the board exactly as it found it.

use crate::board::Board;
use crate::moves::execute::{generate_legal, make_move, unmake_move};
use crate::moves::legality::in_check;
use crate::moves::magic::MagicTables;
use crate::moves::movegen::generate_pseudo_legal_tactical;
use crate::moves::types::{MAX_MOVES, Move};
use crate::search::context::{MAX_PLY, SearchContext};
use crate::search::eval::evaluate;
use crate::search::ordering::order_moves;
use crate::search::tt::{Bound, TranspositionTable};
use arrayvec::ArrayVec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

pub const INF: i32 = 32_000;
pub const MATE_SCORE: i32 = 31_000;
/// Scores beyond this are mate-in-N values and carry ply distance.
pub const MATE_THRESHOLD: i32 = MATE_SCORE - 1_000;
pub const MAX_SEARCH_DEPTH: u32 = 64;

const DRAW_SCORE: i32 = 0;
/// Stop flag and deadline are polled every 2048 nodes.
const POLL_MASK: u64 = 2047;

type MoveList = ArrayVec<Move, MAX_MOVES>;

/// Deadline plus cooperative cancellation. `poll` latches into `halted`
/// so the hot path reads a plain bool instead of the atomic.
pub struct TimeManager {
    start: Instant,
    deadline: Option<Duration>,
    stop: Arc<AtomicBool>,
    halted: bool,
}

impl TimeManager {
    pub fn new(deadline: Option<Duration>, stop: Arc<AtomicBool>) -> Self {
        TimeManager {
            start: Instant::now(),
            deadline,
            stop,
            halted: false,
        }
    }

    #[inline]
    pub fn poll(&mut self) {
        if self.halted {
            return;
        }
        if self.stop.load(Ordering::Relaxed) {
            self.halted = true;
            return;
        }
        if let Some(deadline) = self.deadline
            && self.start.elapsed() >= deadline
        {
            self.halted = true;
        }
    }

    #[inline(always)]
    pub fn halted(&self) -> bool {
        self.halted
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// What the driver asked for. Both limits absent means "infinite": run to
/// the depth cap or until `stop`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchLimits {
    pub depth: Option<u32>,
    pub movetime: Option<Duration>,
}

impl SearchLimits {
    pub fn depth(depth: u32) -> Self {
        SearchLimits {
            depth: Some(depth),
            movetime: None,
        }
    }

    pub fn movetime(movetime: Duration) -> Self {
        SearchLimits {
            depth: None,
            movetime: Some(movetime),
        }
    }

    pub fn infinite() -> Self {
        SearchLimits::default()
    }
}

/// Progress report emitted after every completed iteration.
#[derive(Debug, Clone)]
pub struct SearchInfo {
    pub depth: u32,
    pub score: i32,
    pub nodes: u64,
    pub elapsed: Duration,
    pub pv: Vec<Move>,
}

impl SearchInfo {
    /// UCI score field: "cp <n>" or "mate <moves>".
    pub fn score_uci(&self) -> String {
        if self.score.abs() >= MATE_THRESHOLD {
            let plies = MATE_SCORE - self.score.abs();
            let moves = (plies + 1) / 2;
            if self.score > 0 {
                format!("mate {moves}")
            } else {
                format!("mate -{moves}")
            }
        } else {
            format!("cp {}", self.score)
        }
    }

    pub fn pv_uci(&self) -> String {
        self.pv
            .iter()
            .map(|mv| mv.to_uci())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Final result of a `go`: the last *completed* iteration.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: u32,
    pub nodes: u64,
    pub pv: Vec<Move>,
}

/// Mate scores entering the TT become position-relative ("mate in M from
/// here") so the entry stays valid at any distance from the root.
fn score_to_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score + ply
    } else if score <= -MATE_THRESHOLD {
        score - ply
    } else {
        score
    }
}

/// Inverse of [`score_to_tt`], applied on probe.
fn score_from_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score - ply
    } else if score <= -MATE_THRESHOLD {
        score + ply
    } else {
        score
    }
}

/// Capture/promotion-only extension of the leaf evaluation, resolving
/// hanging tactics before the static eval is trusted.
///
/// Checking moves are not searched here; the known trade-off is some
/// tactical blindness to deep quiet checks in exchange for a much smaller
/// tree.
#[allow(clippy::too_many_arguments)]
pub fn quiescence(
    board: &mut Board,
    tables: &MagicTables,
    ctx: &SearchContext,
    time: &mut TimeManager,
    ply: usize,
    mut alpha: i32,
    beta: i32,
    nodes: &mut u64,
) -> i32 {
    *nodes += 1;
    if *nodes & POLL_MASK == 0 {
        time.poll();
    }
    if time.halted() {
        return 0;
    }

    let stand_pat = evaluate(board);
    if ply >= MAX_PLY - 1 || stand_pat >= beta {
        return stand_pat;
    }
    let mut best = stand_pat;
    if stand_pat > alpha {
        alpha = stand_pat;
    }

    let mut moves = MoveList::new();
    generate_pseudo_legal_tactical(board, tables, &mut moves);
    order_moves(&mut moves, board.side_to_move, None, &[None, None], ctx);

    let mover = board.side_to_move;
    for i in 0..moves.len() {
        let mv = moves[i];
        let undo = make_move(board, mv);
        if in_check(board, mover, tables) {
            unmake_move(board, mv, undo);
            continue;
        }
        let score = -quiescence(board, tables, ctx, time, ply + 1, -beta, -alpha, nodes);
        unmake_move(board, mv, undo);

        if time.halted() {
            return best;
        }
        if score > best {
            best = score;
        }
        if score >= beta {
            return score;
        }
        if score > alpha {
            alpha = score;
        }
    }

    best
}

/// Fail-soft negamax. Returns the best score found, which may fall
/// outside the `[alpha, beta]` window.
#[allow(clippy::too_many_arguments)]
pub fn alpha_beta(
    board: &mut Board,
    tables: &MagicTables,
    tt: &mut TranspositionTable,
    ctx: &mut SearchContext,
    time: &mut TimeManager,
    depth: i32,
    ply: usize,
    mut alpha: i32,
    beta: i32,
    nodes: &mut u64,
) -> i32 {
    ctx.pv.truncate(ply);

    *nodes += 1;
    if *nodes & POLL_MASK == 0 {
        time.poll();
    }
    if time.halted() {
        return 0;
    }

    // Draw detection before anything else; never at the root, which must
    // produce a move.
    if ply > 0 && (board.halfmove_clock >= 100 || board.is_repetition()) {
        return DRAW_SCORE;
    }

    if ply >= MAX_PLY - 1 {
        return evaluate(board);
    }

    if depth <= 0 {
        return quiescence(board, tables, ctx, time, ply, alpha, beta, nodes);
    }

    // Transposition table: a deep-enough entry can answer the node
    // outright; its move seeds the ordering either way.
    let key = board.zobrist;
    let mut tt_move = None;
    if let Some(entry) = tt.probe(key) {
        tt_move = entry.best_move;
        if ply > 0 && entry.depth as i32 >= depth {
            let score = score_from_tt(entry.score as i32, ply as i32);
            match entry.bound {
                Bound::Exact => return score,
                Bound::Lower if score >= beta => return score,
                Bound::Upper if score <= alpha => return score,
                _ => {}
            }
        }
    }

    let mut moves = MoveList::new();
    let mut scratch = MoveList::new();
    generate_legal(board, tables, &mut moves, &mut scratch);

    if moves.is_empty() {
        return if in_check(board, board.side_to_move, tables) {
            // deeper mates score worse, so the shortest mate wins
            -MATE_SCORE + ply as i32
        } else {
            DRAW_SCORE
        };
    }

    let side = board.side_to_move;
    let killers = ctx.killers[ply];
    order_moves(&mut moves, side, tt_move, &killers, ctx);

    let original_alpha = alpha;
    let mut best_score = -INF;
    let mut best_move = None;

    for i in 0..moves.len() {
        let mv = moves[i];
        let undo = make_move(board, mv);
        let score = -alpha_beta(
            board,
            tables,
            tt,
            ctx,
            time,
            depth - 1,
            ply + 1,
            -beta,
            -alpha,
            nodes,
        );
        unmake_move(board, mv, undo);

        if time.halted() {
            return best_score;
        }

        if score > best_score {
            best_score = score;
            best_move = Some(mv);
        }
        if score >= beta {
            if mv.is_quiet() {
                ctx.store_killer(ply, mv);
                ctx.bump_history(side, mv, depth);
            }
            tt.store(
                key,
                Some(mv),
                score_to_tt(score, ply as i32),
                depth as u8,
                Bound::Lower,
            );
            return score;
        }
        if score > alpha {
            alpha = score;
            ctx.pv.extend(ply, mv);
        }
    }

    let bound = if alpha > original_alpha {
        Bound::Exact
    } else {
        Bound::Upper
    };
    tt.store(
        key,
        best_move,
        score_to_tt(best_score, ply as i32),
        depth as u8,
        bound,
    );

    best_score
}

/// Iterative deepening driver. Runs depth 1, 2, 3... until the depth
/// limit, the deadline, or the stop flag; an iteration interrupted midway
/// is discarded and the previous completed one stands.
pub fn iterative_deepening(
    board: &mut Board,
    tables: &MagicTables,
    tt: &mut TranspositionTable,
    ctx: &mut SearchContext,
    limits: &SearchLimits,
    stop: Arc<AtomicBool>,
    mut on_iteration: impl FnMut(&SearchInfo),
) -> SearchOutcome {
    let mut time = TimeManager::new(limits.movetime, stop);
    // catch a stop flag raised before the search even started
    time.poll();
    tt.new_search();

    let max_depth = limits
        .depth
        .unwrap_or(MAX_SEARCH_DEPTH)
        .clamp(1, MAX_SEARCH_DEPTH);
    let mut nodes = 0u64;
    let mut outcome = SearchOutcome::default();

    for depth in 1..=max_depth {
        ctx.age_history();

        let score = alpha_beta(
            board,
            tables,
            tt,
            ctx,
            &mut time,
            depth as i32,
            0,
            -INF,
            INF,
            &mut nodes,
        );

        if time.halted() {
            debug!(depth, "iteration interrupted, keeping previous result");
            break;
        }

        let pv = ctx.pv.line(0);
        outcome = SearchOutcome {
            best_move: pv.first().copied(),
            score,
            depth,
            nodes,
            pv: pv.clone(),
        };

        on_iteration(&SearchInfo {
            depth,
            score,
            nodes,
            elapsed: time.elapsed(),
            pv,
        });

        // checkmate/stalemate root, or a forced mate already proven:
        // deeper iterations cannot change the answer
        if outcome.best_move.is_none() || score.abs() >= MATE_THRESHOLD {
            break;
        }
    }

    outcome.nodes = nodes;
    outcome
}
