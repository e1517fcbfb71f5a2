use std::str::FromStr;
use std::sync::OnceLock;
use tempo::board::{Board, Piece};
use tempo::moves::execute::generate_legal;
use tempo::moves::legality::in_check;
use tempo::moves::magic::{MagicTables, load_magic_tables};
use tempo::moves::types::Move;

fn tables() -> &'static MagicTables {
    static TABLES: OnceLock<MagicTables> = OnceLock::new();
    TABLES.get_or_init(load_magic_tables)
}

fn legal_moves(fen: &str) -> Vec<Move> {
    let mut board = Board::from_str(fen).unwrap();
    let mut moves = Vec::new();
    let mut scratch = Vec::new();
    generate_legal(&mut board, tables(), &mut moves, &mut scratch);
    moves
}

/// After 1.e4 d6 2.e5 f5 the pawn on e5 may capture f6 en passant.
#[test]
fn en_passant_capture_is_generated_with_flag_and_victim() {
    let mut board = Board::new();
    for notation in ["e2e4", "d7d6", "e4e5", "f7f5"] {
        let mut moves = Vec::new();
        let mut scratch = Vec::new();
        generate_legal(&mut board, tables(), &mut moves, &mut scratch);
        let mv = *moves.iter().find(|m| m.to_uci() == notation).unwrap();
        tempo::moves::execute::make_move(&mut board, mv);
    }
    assert_eq!(board.en_passant.map(|sq| sq.to_string()), Some("f6".into()));

    let mut moves = Vec::new();
    let mut scratch = Vec::new();
    generate_legal(&mut board, tables(), &mut moves, &mut scratch);

    let ep = moves
        .iter()
        .find(|m| m.to_uci() == "e5f6" && m.is_en_passant())
        .expect("e5f6 en passant missing");
    assert_eq!(ep.captured, Some(Piece::Pawn));
    assert_eq!(ep.to.to_string(), "f6");
}

/// With the back rank clear, White may castle both ways.
#[test]
fn both_castlings_legal_when_paths_are_clear() {
    let moves = legal_moves("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
    assert!(moves.iter().any(|m| m.to_uci() == "e1g1" && m.is_kingside_castle()));
    assert!(moves.iter().any(|m| m.to_uci() == "e1c1" && m.is_queenside_castle()));
}

/// A rook on e4 pins the castling paths shut: the king would castle out
/// of check, which is illegal in both directions.
#[test]
fn castling_rejected_when_king_is_in_check() {
    let board = Board::from_str("r3k2r/8/8/8/4r3/8/8/R3K2R w KQkq - 0 1").unwrap();
    assert!(in_check(&board, tempo::board::Color::White, tables()));

    let moves = legal_moves("r3k2r/8/8/8/4r3/8/8/R3K2R w KQkq - 0 1");
    assert!(!moves.iter().any(|m| m.is_castling()));
    assert!(!moves.is_empty(), "evasions must still exist");
}

/// A rook on f4 attacks only the kingside crossing square: short
/// castling is rejected, long castling stays available.
#[test]
fn castling_rejected_only_on_the_attacked_wing() {
    let moves = legal_moves("r3k2r/8/8/8/5r2/8/8/R3K2R w KQkq - 0 1");
    assert!(!moves.iter().any(|m| m.is_kingside_castle()));
    assert!(moves.iter().any(|m| m.is_queenside_castle()));
}

/// The queenside b-file square may be attacked (only crossed squares
/// matter), but it must be empty.
#[test]
fn queenside_b_file_rules() {
    // black rook hits b1 yet O-O-O is legal
    let moves = legal_moves("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1");
    assert!(moves.iter().any(|m| m.is_queenside_castle()));

    // piece on b1 blocks O-O-O
    let moves = legal_moves("4k3/8/8/8/8/8/8/RN2K3 w Q - 0 1");
    assert!(!moves.iter().any(|m| m.is_queenside_castle()));
}

#[test]
fn checkmate_positions_have_no_legal_moves() {
    // scholar's mate
    let moves = legal_moves("r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4");
    assert!(moves.is_empty());
    let board =
        Board::from_str("r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4")
            .unwrap();
    assert!(in_check(&board, tempo::board::Color::Black, tables()));
}

#[test]
fn stalemate_positions_have_no_legal_moves_and_no_check() {
    let fen = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";
    assert!(legal_moves(fen).is_empty());
    let board = Board::from_str(fen).unwrap();
    assert!(!in_check(&board, tempo::board::Color::Black, tables()));
}

#[test]
fn every_promotion_kind_is_offered_once() {
    let moves = legal_moves("4k3/P7/8/8/8/8/8/4K3 w - - 0 1");
    let mut kinds: Vec<Piece> = moves
        .iter()
        .filter(|m| m.from.to_string() == "a7")
        .map(|m| m.promotion.expect("promotion kind"))
        .collect();
    kinds.sort_by_key(|p| *p as u8);
    assert_eq!(
        kinds,
        vec![Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen]
    );
}

#[test]
fn en_passant_is_rejected_when_it_exposes_the_king() {
    // rank pin: Kd5/Pe5 vs rook h5, black just played f7f5
    let moves = legal_moves("4k3/8/8/3KPp1r/8/8/8/8 w - f6 0 1");
    assert!(
        !moves.iter().any(|m| m.is_en_passant()),
        "exf6 ep would expose the king on the fifth rank"
    );
}
