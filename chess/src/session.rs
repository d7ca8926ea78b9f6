//! Game session shared by a UI and an optional engine
//!
//! A [`Session`] is the single owner of the game state. The UI calls
//! [`Session::select_square()`] and [`Session::human_move()`] in response to user input, and
//! [`Session::tick()`] once per frame to let the engine play. Human moves are refused while the
//! engine is thinking or when it's the engine's turn, so human and engine moves never interleave.

use crate::engine::{Engine, EngineError, EngineOptions, Transport};
use crate::game::Game;
use crate::movegen::DestList;
use crate::types::{Color, Coord, PieceKind, Status, StatusReport};

use log::{debug, info, warn};

/// Session settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Color played by the engine, or `None` if both sides are human
    pub engine_color: Option<Color>,
    /// Piece a human pawn is promoted to, if the UI offers no choice
    pub promotion: PieceKind,
    pub engine: EngineOptions,
}

impl Default for SessionOptions {
    fn default() -> SessionOptions {
        SessionOptions {
            engine_color: None,
            promotion: PieceKind::Queen,
            engine: EngineOptions::default(),
        }
    }
}

/// Owner of the game and the engine
pub struct Session<T: Transport> {
    game: Game,
    engine: Option<Engine<T>>,
    options: SessionOptions,
    // Engine failed to answer properly, so the human plays its side for one move
    handoff: bool,
}

impl<T: Transport> Session<T> {
    /// Creates a session without an engine
    pub fn new(options: SessionOptions) -> Session<T> {
        Session {
            game: Game::new_initial(),
            engine: None,
            options,
            handoff: false,
        }
    }

    /// Creates a session in which `engine` plays `options.engine_color`
    pub fn with_engine(options: SessionOptions, engine: Engine<T>) -> Session<T> {
        Session {
            engine: Some(engine),
            ..Session::new(options)
        }
    }

    /// Replaces the game, for example to start from a custom position
    pub fn set_game(&mut self, game: Game) {
        self.discard_engine_move();
        self.game = game;
        self.handoff = false;
    }

    #[inline]
    pub fn game(&self) -> &Game {
        &self.game
    }

    #[inline]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    #[inline]
    pub fn engine(&self) -> Option<&Engine<T>> {
        self.engine.as_ref()
    }

    pub fn is_engine_thinking(&self) -> bool {
        self.engine.as_ref().map_or(false, |e| e.is_thinking())
    }

    /// Returns `true` if the engine is expected to make the next move
    pub fn is_engine_turn(&self) -> bool {
        self.engine.is_some()
            && !self.handoff
            && !self.game.is_over()
            && self.options.engine_color == Some(self.game.side())
    }

    /// Returns `true` if a human move would be accepted now
    pub fn can_human_move(&self) -> bool {
        !self.is_engine_thinking() && !self.is_engine_turn() && !self.game.is_over()
    }

    /// Selects the square `c` and returns legal destinations for the piece on it
    ///
    /// Returns an empty list if humans cannot move now.
    pub fn select_square(&mut self, c: Coord) -> DestList {
        if !self.can_human_move() {
            return DestList::new();
        }
        self.game.select_square(c)
    }

    /// Makes a human move from `src` to `dst`
    ///
    /// If `promote` is `None` and the move is a promotion, the piece from the session options
    /// is used. Illegal moves and moves made out of turn are ignored. Returns the status after
    /// the call.
    pub fn human_move(&mut self, src: Coord, dst: Coord, promote: Option<PieceKind>) -> Status {
        if !self.can_human_move() {
            debug!("human move {}{} refused, not human's turn", src, dst);
            return self.game.status();
        }
        let promote = promote.or_else(|| {
            self.game
                .is_promotion(src, dst)
                .then_some(self.options.promotion)
        });
        match self.game.try_move(src, dst, promote) {
            Ok(status) => {
                self.handoff = false;
                status
            }
            Err(e) => {
                debug!("human move {}{} rejected: {}", src, dst, e);
                self.game.status()
            }
        }
    }

    /// Lets the engine play
    ///
    /// If it's the engine's turn and no search is running, the search is started. If a search is
    /// running, the engine output is polled. When the engine move arrives, it is applied to the
    /// game and the new status is returned.
    ///
    /// A malformed or illegal engine move is not an error: it is logged, and the human is allowed
    /// to make the move for the engine side instead.
    pub fn tick(&mut self) -> Result<Option<Status>, EngineError> {
        let engine_turn = self.is_engine_turn();
        let engine = match self.engine.as_mut() {
            Some(engine) => engine,
            None => return Ok(None),
        };

        if !engine.is_thinking() {
            if engine_turn {
                let moves = self.game.uci_list().to_string();
                engine.request_move(self.game.start_fen(), &moves)?;
            }
            return Ok(None);
        }

        let mv = match engine.try_get_engine_move() {
            Ok(Some(mv)) => mv,
            Ok(None) => return Ok(None),
            Err(EngineError::Malformed { token, .. }) => {
                warn!("engine answered {:?}, handing its move to the player", token);
                self.handoff = true;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        match self.game.push_uci_move(mv) {
            Ok(status) => {
                info!("engine played {}", mv);
                self.handoff = false;
                Ok(Some(status))
            }
            Err(e) => {
                warn!("engine move {} rejected: {}", mv, e);
                self.handoff = true;
                Ok(None)
            }
        }
    }

    fn discard_engine_move(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.discard_pending();
        }
    }

    /// Starts a new game from the initial position
    ///
    /// A running engine search is abandoned, its result will be ignored.
    pub fn new_game(&mut self) -> Result<(), EngineError> {
        self.set_game(Game::new_initial());
        if let Some(engine) = self.engine.as_mut() {
            engine.new_game()?;
        }
        info!("new game started");
        Ok(())
    }

    pub fn report(&self) -> StatusReport {
        self.game.report()
    }

    /// Stops the engine, if any
    pub fn quit(self) -> Result<(), EngineError> {
        match self.engine {
            Some(engine) => engine.quit(),
            None => Ok(()),
        }
    }
}
