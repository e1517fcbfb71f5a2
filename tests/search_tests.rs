use std::str::FromStr;
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::AtomicBool;
use tempo::board::{Board, Color, PIECES};
use tempo::moves::execute::{generate_legal, make_move};
use tempo::moves::magic::{MagicTables, load_magic_tables};
use tempo::search::context::SearchContext;
use tempo::search::search::{
    INF, MATE_SCORE, SearchLimits, SearchOutcome, TimeManager, alpha_beta, iterative_deepening,
};
use tempo::search::tt::TranspositionTable;

fn tables() -> &'static MagicTables {
    static TABLES: OnceLock<MagicTables> = OnceLock::new();
    TABLES.get_or_init(load_magic_tables)
}

fn no_stop() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

fn search_depth(fen: &str, depth: u32) -> SearchOutcome {
    let mut board = Board::from_str(fen).unwrap();
    let mut tt = TranspositionTable::new(16);
    let mut ctx = SearchContext::new();
    iterative_deepening(
        &mut board,
        tables(),
        &mut tt,
        &mut ctx,
        &SearchLimits::depth(depth),
        no_stop(),
        |_| {},
    )
}

/// Bare fail-soft search of one window, fresh TT and heuristics.
fn window_search(fen: &str, depth: i32, alpha: i32, beta: i32) -> i32 {
    let mut board = Board::from_str(fen).unwrap();
    let mut tt = TranspositionTable::new(16);
    let mut ctx = SearchContext::new();
    let mut time = TimeManager::new(None, no_stop());
    let mut nodes = 0;
    alpha_beta(
        &mut board,
        tables(),
        &mut tt,
        &mut ctx,
        &mut time,
        depth,
        0,
        alpha,
        beta,
        &mut nodes,
    )
}

fn material_balance(board: &Board, side: Color) -> i32 {
    let mut balance = 0;
    for piece in PIECES {
        let value = piece.value();
        balance += board.pieces(side, piece).count_ones() as i32 * value;
        balance -= board.pieces(side.opposite(), piece).count_ones() as i32 * value;
    }
    balance
}

/// S1: mate in one is found at depth 2 with the mating PV.
#[test]
fn finds_mate_in_one() {
    let outcome = search_depth("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", 2);
    assert_eq!(outcome.best_move.map(|m| m.to_uci()), Some("a1a8".into()));
    assert!(outcome.score >= MATE_SCORE - 2, "score {}", outcome.score);
    assert_eq!(outcome.pv.len(), 1);
    assert_eq!(outcome.pv[0].to_uci(), "a1a8");
}

/// Deeper search must not dilute the mate distance: the TT ply
/// adjustment keeps "mate in 1" exact at depth 4.
#[test]
fn mate_distance_is_stable_across_depths() {
    let outcome = search_depth("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", 4);
    assert_eq!(outcome.score, MATE_SCORE - 1);
    assert_eq!(outcome.best_move.map(|m| m.to_uci()), Some("a1a8".into()));
}

/// Two-rook ladder: mate in two, score encodes three plies to mate.
#[test]
fn finds_mate_in_two_with_ladder() {
    let outcome = search_depth("7k/8/8/8/8/8/8/RR4K1 w - - 0 1", 4);
    assert_eq!(outcome.score, MATE_SCORE - 3);
}

/// S3: stalemate root returns score 0 and the null move.
#[test]
fn stalemate_root_returns_zero_and_no_move() {
    let outcome = search_depth("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 3);
    assert_eq!(outcome.score, 0);
    assert_eq!(outcome.best_move, None);
    assert!(outcome.pv.is_empty());
}

/// Checkmated root: no move, shortest-mate score against us.
#[test]
fn checkmated_root_returns_mate_score() {
    let outcome = search_depth(
        "r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4",
        3,
    );
    assert_eq!(outcome.best_move, None);
    assert_eq!(outcome.score, -MATE_SCORE);
}

/// S2: the exchange Ruy Lopez is close to material-equal at depth 4 and
/// the chosen move survives a short tactical refutation attempt.
#[test]
fn exchange_ruy_is_roughly_equal() {
    const FEN: &str = "r1bqkbnr/1pp2ppp/p1p5/4p3/4P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 0 5";

    let outcome = search_depth(FEN, 4);
    assert!(
        outcome.score.abs() <= 50,
        "exchange position scored {}",
        outcome.score
    );

    // play best move, best reply, best response; material must not drop
    let mut board = Board::from_str(FEN).unwrap();
    let mut tt = TranspositionTable::new(16);
    let mut ctx = SearchContext::new();
    let initial = material_balance(&board, Color::White);

    let first = outcome.best_move.expect("a best move exists");
    make_move(&mut board, first);

    for _ in 0..2 {
        let next = iterative_deepening(
            &mut board,
            tables(),
            &mut tt,
            &mut ctx,
            &SearchLimits::depth(2),
            no_stop(),
            |_| {},
        );
        match next.best_move {
            Some(mv) => {
                make_move(&mut board, mv);
            }
            None => break,
        }
    }

    let swing = material_balance(&board, Color::White) - initial;
    assert!(swing >= -50, "best move dropped {} material", -swing);
}

/// A side about to lose on material is saved by the fifty-move rule: one
/// more quiet move reaches 100 halfmoves and the subtree is a draw.
#[test]
fn fifty_move_rule_saves_the_losing_side() {
    // black is a queen down but the clock stands at 99
    let outcome = search_depth("4k3/8/8/8/8/8/5Q2/4K3 b - - 99 80", 4);
    assert_eq!(outcome.score, 0, "draw by the fifty-move rule");

    // with a fresh clock the position is simply lost
    let outcome = search_depth("4k3/8/8/8/8/8/5Q2/4K3 b - - 0 1", 4);
    assert!(outcome.score < -500, "queen-down score {}", outcome.score);
}

/// A position that already occurred scores 0 at any interior node.
#[test]
fn repeated_position_scores_zero_inside_the_tree() {
    let mut board = Board::new();
    for notation in ["g1f3", "g8f6", "f3g1", "f6g8"] {
        let mut moves = Vec::new();
        let mut scratch = Vec::new();
        generate_legal(&mut board, tables(), &mut moves, &mut scratch);
        let mv = *moves.iter().find(|m| m.to_uci() == notation).unwrap();
        make_move(&mut board, mv);
    }
    assert!(board.is_repetition());

    // the draw rule fires before anything else at ply > 0
    let mut tt = TranspositionTable::new(1);
    let mut ctx = SearchContext::new();
    let mut time = TimeManager::new(None, no_stop());
    let mut nodes = 0;
    let score = alpha_beta(
        &mut board,
        tables(),
        &mut tt,
        &mut ctx,
        &mut time,
        6,
        1,
        -INF,
        INF,
        &mut nodes,
    );
    assert_eq!(score, 0);
    assert_eq!(nodes, 1, "draw must be detected without expanding the node");
}

/// Fail-soft window soundness: values inside the window are exact,
/// fail-lows are upper bounds, fail-highs are lower bounds.
#[test]
fn window_results_bound_the_true_score() {
    const FEN: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    const DEPTH: i32 = 3;

    let exact = window_search(FEN, DEPTH, -INF, INF);

    // window containing the score: the same exact value comes back
    let inside = window_search(FEN, DEPTH, exact - 40, exact + 40);
    assert_eq!(inside, exact);

    // window strictly below: fail-high, a lower bound at or under truth
    let below = window_search(FEN, DEPTH, exact - 200, exact - 100);
    assert!(below >= exact - 100);
    assert!(below <= exact);

    // window strictly above: fail-low, an upper bound at or over truth
    let above = window_search(FEN, DEPTH, exact + 100, exact + 200);
    assert!(above <= exact + 100);
    assert!(above >= exact);
}

/// The root value does not depend on the ordering heuristics' state.
/// Depth 3 keeps the horizon short of any possible in-tree repetition,
/// so the minimax value is strictly path-independent.
#[test]
fn score_is_independent_of_move_ordering_state() {
    const FEN: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";

    let clean = search_depth(FEN, 3);

    // pollute the heuristics with an unrelated search first, then rerun
    let mut board = Board::from_str(FEN).unwrap();
    let mut tt = TranspositionTable::new(16);
    let mut ctx = SearchContext::new();
    let mut warmup = Board::new();
    let _ = iterative_deepening(
        &mut warmup,
        tables(),
        &mut tt,
        &mut ctx,
        &SearchLimits::depth(4),
        no_stop(),
        |_| {},
    );
    tt.clear();
    let polluted = iterative_deepening(
        &mut board,
        tables(),
        &mut tt,
        &mut ctx,
        &SearchLimits::depth(3),
        no_stop(),
        |_| {},
    );

    assert_eq!(clean.score, polluted.score);
}

/// The PV is a playable sequence of legal moves starting with the best
/// move.
#[test]
fn principal_variation_is_playable() {
    let outcome = search_depth(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        4,
    );
    assert!(!outcome.pv.is_empty());
    assert_eq!(outcome.pv.first().copied(), outcome.best_move);

    let mut board = Board::from_str(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    )
    .unwrap();
    for mv in &outcome.pv {
        let mut legal = Vec::new();
        let mut scratch = Vec::new();
        generate_legal(&mut board, tables(), &mut legal, &mut scratch);
        assert!(legal.contains(mv), "PV move {mv} is not legal");
        make_move(&mut board, *mv);
    }
}

/// Progress events arrive once per completed depth with growing depth
/// and node counts.
#[test]
fn iteration_events_are_monotonic() {
    let mut board = Board::new();
    let mut tt = TranspositionTable::new(16);
    let mut ctx = SearchContext::new();
    let mut seen: Vec<(u32, u64)> = Vec::new();

    let outcome = iterative_deepening(
        &mut board,
        tables(),
        &mut tt,
        &mut ctx,
        &SearchLimits::depth(5),
        no_stop(),
        |info| seen.push((info.depth, info.nodes)),
    );

    assert_eq!(seen.len(), 5);
    for (i, &(depth, nodes)) in seen.iter().enumerate() {
        assert_eq!(depth, i as u32 + 1);
        if i > 0 {
            assert!(nodes >= seen[i - 1].1);
        }
    }
    assert_eq!(outcome.depth, 5);
}

/// A pre-set stop flag cancels before depth 1 completes; no stale result
/// is fabricated.
#[test]
fn preset_stop_flag_yields_no_result() {
    let mut board = Board::new();
    let mut tt = TranspositionTable::new(1);
    let mut ctx = SearchContext::new();
    let stop = Arc::new(AtomicBool::new(true));

    let outcome = iterative_deepening(
        &mut board,
        tables(),
        &mut tt,
        &mut ctx,
        &SearchLimits::depth(6),
        stop,
        |_| {},
    );
    assert_eq!(outcome.best_move, None);
    assert_eq!(outcome.depth, 0);
}

/// Hanging material is resolved by quiescence rather than trusted from
/// the static eval: a queen down on the surface, the depth-1 search
/// still finds the pawn wins it back.
#[test]
fn quiescence_sees_hanging_material() {
    // white to move, black queen en prise on d5
    let outcome = search_depth("k7/8/8/3q4/4P3/8/8/K7 w - - 0 1", 1);
    assert_eq!(outcome.best_move.map(|m| m.to_uci()), Some("e4d5".into()));
    assert!(
        outcome.score > 0 && outcome.score < 400,
        "score {} should be about a pawn up",
        outcome.score
    );
}
