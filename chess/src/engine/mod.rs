//! Talking to an external UCI engine
//!
//! The engine is driven as a request/poll state machine. [`Engine::request_move()`] sends the
//! position and starts the search, then [`Engine::try_get_engine_move()`] is called repeatedly
//! and returns `None` until the engine reports its best move. Nothing here ever blocks on the
//! engine output.
//!
//! The way lines reach the engine and come back is abstracted with [`Transport`]. See
//! [`ProcessTransport`] for the implementation that runs the engine as a child process.

mod process;

pub use process::ProcessTransport;

use crate::moves::uci::{self, RawParseError};

use std::fmt;
use std::io;
use std::str::FromStr;

use log::{debug, info, warn};
use thiserror::Error;

/// Skill levels accepted by the engine
pub const MAX_SKILL_LEVEL: u8 = 20;

/// Error talking to the engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Transport failed
    #[error("engine i/o error: {0}")]
    Io(#[from] io::Error),
    /// The engine sent `bestmove` with a token which is not a move
    #[error("malformed best move {token:?}: {source}")]
    Malformed {
        token: String,
        source: RawParseError,
    },
    /// A search is already running
    #[error("engine is already thinking")]
    Busy,
}

/// Command sent to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Uci,
    UciNewGame,
    /// Set the skill level, clamped to `0..=20` when sent
    SetSkillLevel(u8),
    /// Set the position as FEN, followed by a space-separated list of UCI moves
    Position { fen: String, moves: String },
    Go { depth: u32, movetime_ms: u64 },
    Quit,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Command::Uci => write!(f, "uci"),
            Command::UciNewGame => write!(f, "ucinewgame"),
            Command::SetSkillLevel(level) => write!(
                f,
                "setoption name Skill Level value {}",
                (*level).min(MAX_SKILL_LEVEL)
            ),
            Command::Position { fen, moves } => {
                write!(f, "position fen {}", fen)?;
                if !moves.trim().is_empty() {
                    write!(f, " moves {}", moves.trim())?;
                }
                Ok(())
            }
            Command::Go { depth, movetime_ms } => {
                write!(f, "go depth {} movetime {}", depth, movetime_ms)
            }
            Command::Quit => write!(f, "quit"),
        }
    }
}

/// Line-oriented channel to the engine
pub trait Transport {
    /// Sends a single line, without the trailing newline
    fn send_line(&mut self, line: &str) -> io::Result<()>;

    /// Returns the next line of engine output, or `None` if nothing has arrived yet
    ///
    /// Must never block.
    fn poll_line(&mut self) -> io::Result<Option<String>>;

    /// Shuts the channel down after `quit` was sent
    fn close(&mut self) -> io::Result<()>;
}

/// Accumulates engine output and extracts the token following `bestmove`
///
/// The token is delimited by a space or a newline. If the delimiter hasn't arrived yet, the
/// token is considered incomplete and the scanner waits for more data.
#[derive(Debug, Default, Clone)]
pub struct BestMoveScanner {
    acc: String,
}

const BESTMOVE: &str = "bestmove";

impl BestMoveScanner {
    pub fn new() -> BestMoveScanner {
        BestMoveScanner::default()
    }

    pub fn push(&mut self, data: &str) {
        self.acc.push_str(data);
    }

    /// Returns the best move token, if a complete one was received
    ///
    /// On success, everything accumulated so far is dropped.
    pub fn take_token(&mut self) -> Option<String> {
        let pos = self.acc.find(BESTMOVE)?;
        let rest = &self.acc[pos + BESTMOVE.len()..];
        let rest = rest.trim_start_matches(' ');
        let end = rest.find(|c: char| c == ' ' || c == '\n')?;
        let token = rest[..end].trim_end_matches('\r').to_string();
        self.acc.clear();
        Some(token)
    }

    pub fn clear(&mut self) {
        self.acc.clear();
    }
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Path to the engine executable
    pub path: String,
    /// Skill level, from 0 to 20
    pub skill_level: u8,
    /// Maximum search depth
    pub depth: u32,
    /// Time limit for a single search
    pub movetime_ms: u64,
}

impl Default for EngineOptions {
    fn default() -> EngineOptions {
        EngineOptions {
            path: "stockfish".to_string(),
            skill_level: MAX_SKILL_LEVEL,
            depth: 10,
            movetime_ms: 1000,
        }
    }
}

/// State of the engine request
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineState {
    /// No search is running
    Idle,
    /// The engine is searching, and its answer is awaited
    Thinking,
}

/// Client for an external UCI engine
pub struct Engine<T: Transport> {
    transport: T,
    options: EngineOptions,
    scanner: BestMoveScanner,
    state: EngineState,
    stale: usize,
}

impl<T: Transport> Engine<T> {
    /// Starts talking to the engine over `transport`
    ///
    /// Sends `uci` and sets the skill level from `options`.
    pub fn new(transport: T, options: EngineOptions) -> Result<Engine<T>, EngineError> {
        let mut res = Engine {
            transport,
            options,
            scanner: BestMoveScanner::new(),
            state: EngineState::Idle,
            stale: 0,
        };
        res.send(&Command::Uci)?;
        res.send(&Command::SetSkillLevel(res.options.skill_level))?;
        info!("engine started, skill level {}", res.options.skill_level);
        Ok(res)
    }

    fn send(&mut self, cmd: &Command) -> Result<(), EngineError> {
        let line = cmd.to_string();
        debug!(">> {}", line);
        self.transport.send_line(&line)?;
        Ok(())
    }

    #[inline]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    #[inline]
    pub fn state(&self) -> EngineState {
        self.state
    }

    #[inline]
    pub fn is_thinking(&self) -> bool {
        self.state == EngineState::Thinking
    }

    pub fn set_skill_level(&mut self, level: u8) -> Result<(), EngineError> {
        self.options.skill_level = level.min(MAX_SKILL_LEVEL);
        self.send(&Command::SetSkillLevel(self.options.skill_level))
    }

    /// Tells the engine that the next search belongs to a new game
    pub fn new_game(&mut self) -> Result<(), EngineError> {
        self.send(&Command::UciNewGame)
    }

    /// Sends the position and starts the search
    ///
    /// `moves` is a space-separated list of UCI moves made from `fen`.
    pub fn request_move(&mut self, fen: &str, moves: &str) -> Result<(), EngineError> {
        if self.is_thinking() {
            return Err(EngineError::Busy);
        }
        if self.stale == 0 {
            self.scanner.clear();
        }
        self.send(&Command::Position {
            fen: fen.to_string(),
            moves: moves.to_string(),
        })?;
        self.send(&Command::Go {
            depth: self.options.depth,
            movetime_ms: self.options.movetime_ms,
        })?;
        self.state = EngineState::Thinking;
        Ok(())
    }

    /// Forgets about the running search
    ///
    /// The engine still finishes the search, but its answer will be ignored.
    pub fn discard_pending(&mut self) {
        if self.is_thinking() {
            debug!("discarding the pending engine answer");
            self.stale += 1;
            self.state = EngineState::Idle;
        }
    }

    /// Reads whatever the engine has sent, and returns its best move if it's ready
    ///
    /// Returns `Ok(None)` while the engine is still thinking, or if no search was requested.
    /// If the engine answers with something that isn't a move, the search is considered finished
    /// and [`EngineError::Malformed`] is returned.
    pub fn try_get_engine_move(&mut self) -> Result<Option<uci::Move>, EngineError> {
        while self.is_thinking() || self.stale > 0 {
            let line = match self.transport.poll_line()? {
                Some(line) => line,
                None => return Ok(None),
            };
            debug!("<< {}", line);
            self.scanner.push(&line);
            self.scanner.push("\n");
            let token = match self.scanner.take_token() {
                Some(token) => token,
                None => continue,
            };
            if self.stale > 0 {
                self.stale -= 1;
                debug!("ignoring stale best move {:?}", token);
                continue;
            }
            self.state = EngineState::Idle;
            return match uci::Move::from_str(&token) {
                Ok(mv) => {
                    debug!("engine move {}", mv);
                    Ok(Some(mv))
                }
                Err(source) => {
                    warn!("malformed best move {:?}: {}", token, source);
                    Err(EngineError::Malformed { token, source })
                }
            };
        }
        Ok(None)
    }

    /// Sends `quit` and closes the transport
    pub fn quit(mut self) -> Result<(), EngineError> {
        self.send(&Command::Quit)?;
        self.transport.close()?;
        info!("engine stopped");
        Ok(())
    }
}
