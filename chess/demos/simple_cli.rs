// Simple command-line application to play chess against a UCI engine

use clap::{Parser, ValueEnum};
use tabiya::{
    board::PrettyStyle,
    engine::{Engine, EngineOptions, ProcessTransport},
    Color, Coord, Game, PieceKind, Session, SessionOptions,
};
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use std::thread;
use std::time::Duration;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Side {
    White,
    Black,
}

impl From<Side> for Color {
    fn from(s: Side) -> Color {
        match s {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Play chess in the terminal, optionally against a UCI engine")]
struct Args {
    /// Path to the engine executable
    #[arg(long)]
    engine: Option<String>,
    /// Side played by the engine
    #[arg(long, value_enum, default_value = "black")]
    engine_color: Side,
    /// Engine skill level, from 0 to 20
    #[arg(long, default_value_t = 20)]
    skill: u8,
    /// Maximum search depth
    #[arg(long, default_value_t = 10)]
    depth: u32,
    /// Time limit for a single search, in milliseconds
    #[arg(long, default_value_t = 1000)]
    movetime: u64,
    /// Starting position
    #[arg(long)]
    fen: Option<String>,
}

fn parse_input(s: &str) -> Option<(Coord, Coord, Option<PieceKind>)> {
    if !s.is_ascii() || !(4..=5).contains(&s.len()) {
        return None;
    }
    let src = Coord::from_str(&s[0..2]).ok()?;
    let dst = Coord::from_str(&s[2..4]).ok()?;
    let promote = match s.get(4..5) {
        Some(p) => Some(PieceKind::from_str(p).ok()?),
        None => None,
    };
    Some((src, dst, promote))
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut options = SessionOptions::default();
    let mut session = match &args.engine {
        Some(path) => {
            options.engine_color = Some(args.engine_color.into());
            options.engine = EngineOptions {
                path: path.clone(),
                skill_level: args.skill,
                depth: args.depth,
                movetime_ms: args.movetime,
            };
            let transport = match ProcessTransport::spawn(path) {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("Cannot start engine {}: {}", path, e);
                    return;
                }
            };
            let engine = match Engine::new(transport, options.engine.clone()) {
                Ok(e) => e,
                Err(e) => {
                    eprintln!("Engine error: {}", e);
                    return;
                }
            };
            Session::with_engine(options, engine)
        }
        None => Session::new(options),
    };
    if let Some(fen) = &args.fen {
        match Game::from_fen(fen) {
            Ok(game) => session.set_game(game),
            Err(e) => {
                eprintln!("Bad FEN: {}", e);
                return;
            }
        }
    }

    let mut stdin = io::stdin().lock();
    loop {
        let report = session.report();
        if report.game_over {
            println!("{}", session.game().board().pretty(PrettyStyle::Ascii));
            println!("Game finished: {}", report.message);
            println!("Moves: {}", session.game().uci_list());
            break;
        }

        // Let the engine play until it's the human's turn again
        if !session.can_human_move() {
            match session.tick() {
                Ok(_) => thread::sleep(Duration::from_millis(10)),
                Err(e) => {
                    eprintln!("Engine error: {}", e);
                    break;
                }
            }
            continue;
        }

        println!("{}", session.game().board().pretty(PrettyStyle::Ascii));
        println!("{}", report.message);
        print!("Your move: ");
        let _ = io::stdout().flush();
        let mut s = String::new();
        match stdin.read_line(&mut s) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let s = s.trim();
        if s == "new" {
            if let Err(e) = session.new_game() {
                eprintln!("Engine error: {}", e);
                break;
            }
            continue;
        }

        let (src, dst, promote) = match parse_input(s) {
            Some(mv) => mv,
            None => {
                println!("Bad move: {:?}", s);
                println!();
                continue;
            }
        };
        let before = session.game().history().len();
        session.human_move(src, dst, promote);
        if session.game().history().len() == before {
            println!("Illegal move");
        }
        println!();
    }

    if let Err(e) = session.quit() {
        eprintln!("Engine error: {}", e);
    }
}
