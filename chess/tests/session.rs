use tabiya::engine::{Engine, EngineOptions, Transport};
use tabiya::{Color, Coord, PieceKind, Session, SessionOptions, Status};

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::str::FromStr;

#[derive(Default)]
struct Wire {
    sent: Vec<String>,
    output: VecDeque<String>,
    closed: bool,
}

#[derive(Clone, Default)]
struct ScriptedTransport(Rc<RefCell<Wire>>);

impl ScriptedTransport {
    fn reply(&self, line: &str) {
        self.0.borrow_mut().output.push_back(line.to_string());
    }

    fn sent(&self) -> Vec<String> {
        self.0.borrow().sent.clone()
    }

    fn last_sent(&self) -> String {
        self.0.borrow().sent.last().cloned().unwrap_or_default()
    }
}

impl Transport for ScriptedTransport {
    fn send_line(&mut self, line: &str) -> io::Result<()> {
        self.0.borrow_mut().sent.push(line.to_string());
        Ok(())
    }

    fn poll_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.0.borrow_mut().output.pop_front())
    }

    fn close(&mut self) -> io::Result<()> {
        self.0.borrow_mut().closed = true;
        Ok(())
    }
}

fn c(s: &str) -> Coord {
    Coord::from_str(s).unwrap()
}

fn session(engine_color: Color) -> (Session<ScriptedTransport>, ScriptedTransport) {
    let wire = ScriptedTransport::default();
    let options = SessionOptions {
        engine_color: Some(engine_color),
        engine: EngineOptions {
            skill_level: 3,
            depth: 5,
            movetime_ms: 200,
            ..EngineOptions::default()
        },
        ..SessionOptions::default()
    };
    let engine = Engine::new(wire.clone(), options.engine.clone()).unwrap();
    (Session::with_engine(options, engine), wire)
}

const INITIAL: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[test]
fn test_engine_plays_black() {
    let (mut s, wire) = session(Color::Black);
    assert_eq!(
        wire.sent(),
        ["uci", "setoption name Skill Level value 3"]
    );

    // Nothing to do on human's turn
    assert_eq!(s.tick().unwrap(), None);
    assert!(!s.is_engine_thinking());
    assert_eq!(s.select_square(c("e2")).len(), 2);

    s.human_move(c("e2"), c("e4"), None);
    assert!(s.is_engine_turn());
    assert!(s.select_square(c("e7")).is_empty());

    assert_eq!(s.tick().unwrap(), None);
    assert!(s.is_engine_thinking());
    let sent = wire.sent();
    assert_eq!(
        sent[sent.len() - 2..],
        [
            format!("position fen {} moves e2e4", INITIAL),
            "go depth 5 movetime 200".to_string()
        ]
    );

    // Still thinking, so neither side may move
    assert_eq!(s.tick().unwrap(), None);
    let before = s.game().clone();
    s.human_move(c("d2"), c("d4"), None);
    s.human_move(c("e7"), c("e5"), None);
    assert_eq!(s.game(), &before);

    wire.reply("info depth 5 score cp -30 pv e7e5");
    wire.reply("bestmove e7e5 ponder g1f3");
    assert_eq!(
        s.tick().unwrap(),
        Some(Status::InProgress {
            turn: Color::White,
            check: false
        })
    );
    assert!(!s.is_engine_thinking());
    assert_eq!(s.game().uci_list().to_string(), "e2e4 e7e5");
    assert!(s.can_human_move());
}

#[test]
fn test_engine_plays_white() {
    let (mut s, wire) = session(Color::White);
    assert!(!s.can_human_move());
    s.tick().unwrap();
    assert_eq!(wire.last_sent(), "go depth 5 movetime 200");
    assert!(wire.sent().contains(&format!("position fen {}", INITIAL)));
    wire.reply("bestmove g1f3");
    s.tick().unwrap();
    assert_eq!(s.game().uci_list().to_string(), "g1f3");
    assert_eq!(s.game().side(), Color::Black);
}

#[test]
fn test_malformed_reply_hands_move_to_player() {
    let (mut s, wire) = session(Color::Black);
    s.human_move(c("e2"), c("e4"), None);
    s.tick().unwrap();
    wire.reply("bestmove (none)");
    assert_eq!(s.tick().unwrap(), None);
    assert!(!s.is_engine_thinking());
    assert!(!s.is_engine_turn());

    // The player moves for the engine side, then the engine is back
    s.human_move(c("e7"), c("e5"), None);
    assert_eq!(s.game().uci_list().to_string(), "e2e4 e7e5");
    s.human_move(c("g1"), c("f3"), None);
    assert!(s.is_engine_turn());
}

#[test]
fn test_illegal_engine_move_is_rejected() {
    let (mut s, wire) = session(Color::Black);
    s.human_move(c("e2"), c("e4"), None);
    s.tick().unwrap();
    wire.reply("bestmove e8e6");
    assert_eq!(s.tick().unwrap(), None);
    assert_eq!(s.game().history().len(), 1);
    assert!(s.can_human_move());
}

#[test]
fn test_new_game_discards_pending_reply() {
    let (mut s, wire) = session(Color::Black);
    s.human_move(c("d2"), c("d4"), None);
    s.tick().unwrap();
    assert!(s.is_engine_thinking());

    s.new_game().unwrap();
    assert_eq!(wire.last_sent(), "ucinewgame");
    assert!(!s.is_engine_thinking());
    assert!(s.game().history().is_empty());

    s.human_move(c("e2"), c("e4"), None);
    s.tick().unwrap();
    // Answer to the abandoned search arrives first
    wire.reply("bestmove d7d5");
    assert_eq!(s.tick().unwrap(), None);
    wire.reply("bestmove c7c5");
    s.tick().unwrap();
    assert_eq!(s.game().uci_list().to_string(), "e2e4 c7c5");
}

#[test]
fn test_promotion_choice() {
    let mut s: Session<ScriptedTransport> = Session::new(SessionOptions {
        promotion: PieceKind::Knight,
        ..SessionOptions::default()
    });
    s.set_game(tabiya::Game::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap());
    s.human_move(c("a7"), c("a8"), None);
    assert_eq!(s.game().as_fen(), "N3k3/8/8/8/8/8/8/4K3 b - - 0 1");
    s.human_move(c("e8"), c("e7"), None);
    s.human_move(c("e1"), c("e2"), Some(PieceKind::Queen));
    assert_eq!(s.game().side(), Color::White);
}

#[test]
fn test_two_humans() {
    let mut s: Session<ScriptedTransport> = Session::new(SessionOptions::default());
    for (src, dst) in [("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")] {
        assert!(s.can_human_move());
        assert_eq!(s.tick().unwrap(), None);
        s.human_move(c(src), c(dst), None);
    }
    let report = s.report();
    assert!(report.game_over);
    assert_eq!(report.message, "Checkmate, Black wins");
    assert!(!s.can_human_move());
    assert!(s.select_square(c("a2")).is_empty());
    s.quit().unwrap();
}

#[test]
fn test_quit() {
    let (s, wire) = session(Color::Black);
    s.quit().unwrap();
    assert_eq!(wire.last_sent(), "quit");
    assert!(wire.0.borrow().closed);
}
