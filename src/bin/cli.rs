//! UCI driver: a thin loop that parses commands, owns the [`Engine`] and
//! prints info/bestmove lines. All engine behavior lives in the library.

use std::io::{self, BufRead};
use std::time::Duration;
use tempo::board::Color;
use tempo::engine::Engine;
use tempo::logger::init_logging;
use tempo::moves::perft::{perft, perft_divide};
use tempo::search::search::{SearchInfo, SearchLimits};

fn main() {
    init_logging("logs/tempo.log", "tempo=info");

    let mut engine = Engine::new();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(&command) = parts.first() else {
            continue;
        };

        match command {
            "uci" => {
                println!("id name tempo {}", env!("CARGO_PKG_VERSION"));
                println!("id author tempo contributors");
                println!("uciok");
            }
            "isready" => println!("readyok"),
            "ucinewgame" => {
                engine.new_game();
                engine.set_start_position();
            }
            "position" => handle_position(&mut engine, &parts),
            "go" => handle_go(&mut engine, &parts),
            "stop" => engine.stop(),
            "fen" => println!("{}", engine.board().to_fen()),
            "d" | "display" => println!("{}", engine.board()),
            "perft" => handle_perft(&mut engine, &parts),
            "quit" => break,
            _ => {}
        }
    }
}

fn handle_position(engine: &mut Engine, parts: &[&str]) {
    let moves_at = parts.iter().position(|&p| p == "moves");

    match parts.get(1) {
        Some(&"startpos") => engine.set_start_position(),
        Some(&"fen") => {
            let fen_end = moves_at.unwrap_or(parts.len());
            let fen = parts[2..fen_end].join(" ");
            if let Err(err) = engine.set_from_fen(&fen) {
                eprintln!("info string bad fen: {err}");
                return;
            }
        }
        _ => engine.set_start_position(),
    }

    if let Some(moves_at) = moves_at {
        for notation in &parts[moves_at + 1..] {
            if let Err(err) = engine.apply_move(notation) {
                eprintln!("info string bad move: {err}");
                return;
            }
        }
    }
}

fn handle_perft(engine: &mut Engine, parts: &[&str]) {
    let depth: u32 = parts.get(1).and_then(|raw| raw.parse().ok()).unwrap_or(5);
    let tables = engine.tables().clone();
    let mut board = engine.board().clone();

    if depth == 0 {
        println!("Nodes: {}", perft(&mut board, &tables, 0));
        return;
    }
    let rows = perft_divide(&mut board, &tables, depth);
    for (mv, nodes) in &rows {
        println!("{}: {}", mv, nodes);
    }
    println!("Nodes: {}", rows.iter().map(|(_, nodes)| nodes).sum::<u64>());
}

fn handle_go(engine: &mut Engine, parts: &[&str]) {
    let mut limits = SearchLimits::infinite();
    let mut wtime: Option<u64> = None;
    let mut btime: Option<u64> = None;
    let mut winc = 0u64;
    let mut binc = 0u64;
    let mut movestogo: Option<u64> = None;

    let mut i = 1;
    while i < parts.len() {
        let value = parts.get(i + 1).and_then(|raw| raw.parse::<u64>().ok());
        match parts[i] {
            "depth" => {
                limits.depth = value.map(|d| d as u32);
                i += 2;
            }
            "movetime" => {
                limits.movetime = value.map(Duration::from_millis);
                i += 2;
            }
            "wtime" => {
                wtime = value;
                i += 2;
            }
            "btime" => {
                btime = value;
                i += 2;
            }
            "winc" => {
                winc = value.unwrap_or(0);
                i += 2;
            }
            "binc" => {
                binc = value.unwrap_or(0);
                i += 2;
            }
            "movestogo" => {
                movestogo = value;
                i += 2;
            }
            "infinite" => {
                limits = SearchLimits::infinite();
                i += 1;
            }
            _ => i += 1,
        }
    }

    // Clock-based allocation: a fraction of the remaining time plus most
    // of the increment, capped so a single move can never flag us.
    if limits.movetime.is_none() {
        let (time_left, increment) = match engine.board().side_to_move {
            Color::White => (wtime, winc),
            Color::Black => (btime, binc),
        };
        if let Some(time_left) = time_left {
            let reserve = (time_left * 5 / 100).min(250);
            let usable = time_left.saturating_sub(reserve);
            let slice = movestogo.unwrap_or(35).max(2);
            let alloc = (usable / slice + increment * 3 / 4)
                .min(usable / 4)
                .max(10.min(usable));
            limits.movetime = Some(Duration::from_millis(alloc));
        }
    }

    let outcome = engine.go(&limits, |info: &SearchInfo| {
        println!(
            "info depth {} score {} nodes {} time {} pv {}",
            info.depth,
            info.score_uci(),
            info.nodes,
            info.elapsed.as_millis(),
            info.pv_uci()
        );
    });

    match outcome.best_move {
        Some(best) => println!("bestmove {}", best.to_uci()),
        None => println!("bestmove (none)"),
    }
}
