//! Game state machine

use crate::attack;
use crate::board::Board;
use crate::fen::{self, Fen, FenParseError};
use crate::legal;
use crate::movegen::DestList;
use crate::moves::{uci, Move, MoveError, MoveKind};
use crate::types::{Color, Coord, Piece, PieceKind, Status, StatusReport};
use tabiya_base::geometry;

use std::fmt;
use std::str::FromStr;

use log::{debug, info};
use thiserror::Error;

/// Error applying a list of UCI moves
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot apply UCI move #{}: {}", .pos + 1, .source)]
pub struct UciListError {
    pub pos: usize,
    pub source: uci::ParseError,
}

/// Chess game
///
/// Owns the board together with the state the board itself doesn't know: the side to move, the
/// en passant target and the list of moves made since the start position. Every move goes through
/// [`Game::try_move()`], which checks legality, applies special moves and recomputes the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    board: Board,
    side: Color,
    ep_target: Option<Coord>,
    start_fen: String,
    history: Vec<Move>,
    status: Status,
    selected: Option<Coord>,
}

impl Game {
    /// Creates a game from the position `fen`
    pub fn new(fen: Fen) -> Game {
        let start_fen = fen.to_string();
        let mut res = Game {
            board: fen.board,
            side: fen.side,
            ep_target: fen.ep_target,
            start_fen,
            history: Vec::new(),
            status: Status::Stalemate,
            selected: None,
        };
        res.status = res.calc_status();
        res
    }

    pub fn new_initial() -> Game {
        Game::new(Fen::initial())
    }

    pub fn from_fen(s: &str) -> Result<Game, FenParseError> {
        Ok(Game::new(Fen::from_str(s)?))
    }

    /// Restores the initial position and clears the history
    pub fn reset(&mut self) {
        *self = Game::new_initial();
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the side to move
    #[inline]
    pub fn side(&self) -> Color {
        self.side
    }

    #[inline]
    pub fn ep_target(&self) -> Option<Coord> {
        self.ep_target
    }

    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    #[inline]
    pub fn is_over(&self) -> bool {
        self.status.is_over()
    }

    /// Returns all the moves made since the start position
    #[inline]
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Returns the position the game started from, as FEN
    #[inline]
    pub fn start_fen(&self) -> &str {
        &self.start_fen
    }

    /// Returns the square chosen by the last [`Game::select_square()`] call
    #[inline]
    pub fn selected(&self) -> Option<Coord> {
        self.selected
    }

    /// Returns legal destinations for the piece on `src`
    ///
    /// The list is empty if the game is over, or if `src` doesn't hold a piece of the side
    /// to move.
    pub fn legal_moves(&mut self, src: Coord) -> DestList {
        if self.is_over() || self.board.color_at(src) != Some(self.side) {
            return DestList::new();
        }
        legal::legal_moves(&mut self.board, src, self.ep_target)
    }

    /// Selects the square `c` and returns legal destinations for the piece standing there
    ///
    /// If there are no such destinations, the selection is cleared.
    pub fn select_square(&mut self, c: Coord) -> DestList {
        let res = self.legal_moves(c);
        self.selected = (!res.is_empty()).then_some(c);
        res
    }

    /// Returns `true` if moving from `src` to `dst` would promote a pawn
    ///
    /// Only the piece and the destination rank are checked, not legality.
    pub fn is_promotion(&self, src: Coord, dst: Coord) -> bool {
        match self.board.get(src) {
            Some(p) => {
                p.kind() == PieceKind::Pawn && dst.rank() == geometry::promote_dst_rank(p.color())
            }
            None => false,
        }
    }

    fn calc_status(&mut self) -> Status {
        let check = attack::is_king_in_check(&self.board, self.side);
        if legal::has_legal_moves(&mut self.board, self.side, self.ep_target) {
            return Status::InProgress {
                turn: self.side,
                check,
            };
        }
        if check {
            Status::Checkmate {
                winner: self.side.inv(),
            }
        } else {
            Status::Stalemate
        }
    }

    fn validate(
        &mut self,
        src: Coord,
        dst: Coord,
        promote: Option<PieceKind>,
    ) -> Result<(Piece, Move), MoveError> {
        if self.is_over() {
            return Err(MoveError::GameOver);
        }
        let piece = self.board.get(src).ok_or(MoveError::NoPiece(src))?;
        if piece.color() != self.side {
            return Err(MoveError::WrongSide(src));
        }
        if !legal::legal_moves(&mut self.board, src, self.ep_target).contains(&dst) {
            return Err(MoveError::Illegal { src, dst });
        }
        let mv = Move::classify(&self.board, &piece, dst, promote);
        match (mv.kind(), promote) {
            (MoveKind::Promote(p), _) if !p.is_promotion_target() => {
                return Err(MoveError::BadPromote(p))
            }
            (MoveKind::Promote(_), _) | (_, None) => {}
            (_, Some(_)) => return Err(MoveError::UnexpectedPromote),
        }
        Ok((piece, mv))
    }

    fn apply(&mut self, piece: Piece, mv: Move) {
        let (src, dst) = (mv.src(), mv.dst());
        match mv.kind() {
            MoveKind::Enpassant => {
                self.board.take(Coord::from_parts(dst.file(), src.rank()));
                self.board.relocate(src, dst);
            }
            MoveKind::Castling(side) => {
                self.board.relocate(src, dst);
                let rank = src.rank();
                self.board.relocate(
                    Coord::from_parts(geometry::castling_rook_src(side), rank),
                    Coord::from_parts(geometry::castling_rook_dst(side), rank),
                );
            }
            MoveKind::Promote(kind) => {
                self.board.take(src);
                self.board
                    .place(Piece::new(kind, piece.color(), dst).with_moved(true));
            }
            MoveKind::Simple | MoveKind::PawnSimple | MoveKind::PawnDouble => {
                self.board.relocate(src, dst);
            }
        }
        self.ep_target = mv.enpassant_target();
        self.side = self.side.inv();
        self.history.push(mv);
    }

    /// Makes the move from `src` to `dst`
    ///
    /// If the move is a promotion, the pawn turns into `promote`, or into a queen if `promote`
    /// is `None`. For other moves, `promote` must be `None`.
    ///
    /// On success, returns the new status. On error, the game is left unchanged. In both cases,
    /// the selection is cleared.
    pub fn try_move(
        &mut self,
        src: Coord,
        dst: Coord,
        promote: Option<PieceKind>,
    ) -> Result<Status, MoveError> {
        self.selected = None;
        let (piece, mv) = self.validate(src, dst, promote)?;
        self.apply(piece, mv);
        self.status = self.calc_status();
        debug!("move {} accepted, {}", mv, self.status);
        if self.is_over() {
            info!("game over: {}", self.status);
        }
        Ok(self.status)
    }

    /// Makes the move from `src` to `dst`, ignoring it if it's not legal
    ///
    /// This is the same as [`Game::try_move()`], except that the error is only logged. Returns
    /// the status after the call, which is unchanged if the move was rejected.
    pub fn execute_move(&mut self, src: Coord, dst: Coord, promote: Option<PieceKind>) -> Status {
        match self.try_move(src, dst, promote) {
            Ok(status) => status,
            Err(e) => {
                debug!("move {}{} rejected: {}", src, dst, e);
                self.status
            }
        }
    }

    /// Makes the move given in UCI format
    pub fn push_uci(&mut self, s: &str) -> Result<Status, uci::ParseError> {
        let mv = uci::Move::from_str(s)?;
        self.push_uci_move(mv).map_err(uci::ParseError::Validate)
    }

    /// Makes the move given as a parsed UCI move
    #[inline]
    pub fn push_uci_move(&mut self, mv: uci::Move) -> Result<Status, MoveError> {
        self.try_move(mv.src, mv.dst, mv.promote)
    }

    /// Makes all the moves from a space-separated list of UCI moves
    ///
    /// Stops at the first move that cannot be made, leaving the previous ones applied.
    pub fn push_uci_list(&mut self, uci_list: &str) -> Result<Status, UciListError> {
        for (pos, token) in uci_list.split_ascii_whitespace().enumerate() {
            self.push_uci(token)
                .map_err(|source| UciListError { pos, source })?;
        }
        Ok(self.status)
    }

    /// Returns a wrapper that formats the history as space-separated UCI moves
    #[inline]
    pub fn uci_list(&self) -> UciList<'_> {
        UciList(&self.history)
    }

    /// Returns the current position as FEN
    pub fn as_fen(&self) -> String {
        fen::write(&self.board, self.side, self.ep_target)
    }

    /// Returns the state of the game for the UI layer
    pub fn report(&self) -> StatusReport {
        StatusReport {
            turn: self.side,
            in_check: self.status.is_check(),
            game_over: self.status.is_over(),
            message: self.status.to_string(),
        }
    }
}

impl Default for Game {
    fn default() -> Game {
        Game::new_initial()
    }
}

/// Wrapper to format the move list
///
/// See [`Game::uci_list()`].
pub struct UciList<'a>(&'a [Move]);

impl<'a> fmt::Display for UciList<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        for (i, m) in self.0.iter().enumerate() {
            if i != 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", m)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(s: &str) -> Coord {
        Coord::from_str(s).unwrap()
    }

    fn sorted(list: DestList) -> Vec<String> {
        let mut v: Vec<_> = list.iter().map(|c| c.to_string()).collect();
        v.sort();
        v
    }

    #[test]
    fn test_initial() {
        let g = Game::new_initial();
        assert_eq!(
            g.status(),
            Status::InProgress {
                turn: Color::White,
                check: false
            }
        );
        assert_eq!(
            g.as_fen(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
        assert_eq!(g.start_fen(), g.as_fen());
        assert_eq!(g.uci_list().to_string(), "");
        assert_eq!(
            g.report(),
            StatusReport {
                turn: Color::White,
                in_check: false,
                game_over: false,
                message: "White to move".to_string(),
            }
        );
    }

    #[test]
    fn test_fools_mate() {
        let mut g = Game::new_initial();
        g.push_uci_list("f2f3 e7e5 g2g4").unwrap();
        assert_eq!(
            g.push_uci("d8h4").unwrap(),
            Status::Checkmate {
                winner: Color::Black
            }
        );
        assert_eq!(g.uci_list().to_string(), "f2f3 e7e5 g2g4 d8h4");
        let report = g.report();
        assert!(report.game_over);
        assert!(report.in_check);
        assert_eq!(report.message, "Checkmate, Black wins");

        assert_eq!(
            g.try_move(c("a2"), c("a3"), None),
            Err(MoveError::GameOver)
        );
        assert!(g.select_square(c("a2")).is_empty());
    }

    #[test]
    fn test_select_square() {
        let mut g = Game::new_initial();
        assert_eq!(sorted(g.select_square(c("g1"))), ["f3", "h3"]);
        assert_eq!(g.selected(), Some(c("g1")));
        assert!(g.select_square(c("e7")).is_empty());
        assert_eq!(g.selected(), None);
        assert!(g.select_square(c("e4")).is_empty());

        g.select_square(c("e2"));
        let before = g.clone();
        assert_eq!(g.execute_move(c("e2"), c("e5"), None), before.status());
        assert_eq!(g.selected(), None);
        assert_eq!(g.board(), before.board());
        assert!(g.history().is_empty());
    }

    #[test]
    fn test_rejected_moves() {
        let mut g = Game::new_initial();
        assert_eq!(
            g.try_move(c("e4"), c("e5"), None),
            Err(MoveError::NoPiece(c("e4")))
        );
        assert_eq!(
            g.try_move(c("e7"), c("e5"), None),
            Err(MoveError::WrongSide(c("e7")))
        );
        assert_eq!(
            g.try_move(c("e1"), c("g1"), None),
            Err(MoveError::Illegal {
                src: c("e1"),
                dst: c("g1")
            })
        );
        assert_eq!(
            g.try_move(c("e2"), c("e4"), Some(PieceKind::Queen)),
            Err(MoveError::UnexpectedPromote)
        );
        assert_eq!(
            g.push_uci("e2e5"),
            Err(uci::ParseError::Validate(MoveError::Illegal {
                src: c("e2"),
                dst: c("e5")
            }))
        );
        assert!(matches!(
            g.push_uci("0000"),
            Err(uci::ParseError::Parse(_))
        ));
        assert_eq!(g, Game::new_initial());

        let err = g.push_uci_list("e2e4 e7e5 e4e5").unwrap_err();
        assert_eq!(err.pos, 2);
        assert_eq!(g.uci_list().to_string(), "e2e4 e7e5");
    }

    #[test]
    fn test_enpassant() {
        let mut g = Game::new_initial();
        g.push_uci_list("e2e4 a7a6 e4e5 d7d5").unwrap();
        assert_eq!(g.ep_target(), Some(c("d6")));
        assert_eq!(
            g.as_fen(),
            "rnbqkbnr/1pp1pppp/p7/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 1"
        );
        assert_eq!(sorted(g.legal_moves(c("e5"))), ["d6", "e6"]);

        g.push_uci("e5d6").unwrap();
        assert!(g.history()[4].is_enpassant());
        assert!(g.board().is_free(c("d5")));
        assert_eq!(g.ep_target(), None);
        assert_eq!(
            g.as_fen(),
            "rnbqkbnr/1pp1pppp/p2P4/8/8/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_enpassant_expires() {
        let mut g = Game::new_initial();
        g.push_uci_list("e2e4 a7a6 e4e5 d7d5 b1c3 a6a5").unwrap();
        assert_eq!(g.ep_target(), None);
        assert_eq!(sorted(g.legal_moves(c("e5"))), ["e6"]);
        assert!(g.push_uci("e5d6").is_err());
    }

    #[test]
    fn test_castling() {
        let mut g = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        g.push_uci("e1g1").unwrap();
        assert!(g.history()[0].is_castling());
        assert_eq!(g.as_fen(), "r3k2r/8/8/8/8/8/8/R4RK1 b kq - 0 1");
        g.push_uci("e8c8").unwrap();
        assert_eq!(g.as_fen(), "2kr3r/8/8/8/8/8/8/R4RK1 w - - 0 1");
    }

    #[test]
    fn test_castling_rejected() {
        // Through check
        let mut g = Game::from_fen("r3k2r/8/8/8/8/8/5r2/R3K2R w KQkq - 0 1").unwrap();
        assert!(g.push_uci("e1g1").is_err());
        assert!(g.push_uci("e1c1").is_ok());

        // Into check
        let mut g = Game::from_fen("r3k2r/8/8/8/8/8/6r1/R3K2R w KQkq - 0 1").unwrap();
        assert!(g.push_uci("e1g1").is_err());

        // Out of check
        let mut g = Game::from_fen("r3k2r/8/8/8/8/8/4r3/R3K2R w KQkq - 0 1").unwrap();
        assert!(g.status().is_check());
        assert!(g.push_uci("e1g1").is_err());
        assert!(g.push_uci("e1c1").is_err());

        // Rook has moved
        let mut g = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w Qkq - 0 1").unwrap();
        assert!(g.push_uci("e1g1").is_err());

        // Rook moves away and back
        let mut g = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        g.push_uci_list("h1h2 a8a7 h2h1 a7a8").unwrap();
        assert_eq!(g.as_fen(), "r3k2r/8/8/8/8/8/8/R3K2R w Qk - 0 1");
        assert!(g.push_uci("e1g1").is_err());
        assert!(g.push_uci("e1c1").is_ok());

        // Piece in between
        let mut g = Game::from_fen("r3k2r/8/8/8/8/8/8/RN2K2R w KQkq - 0 1").unwrap();
        assert!(g.push_uci("e1c1").is_err());
    }

    #[test]
    fn test_promote() {
        let mut g = Game::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let status = g.execute_move(c("a7"), c("a8"), None);
        assert_eq!(
            status,
            Status::InProgress {
                turn: Color::Black,
                check: true
            }
        );
        assert_eq!(g.as_fen(), "Q3k3/8/8/8/8/8/8/4K3 b - - 0 1");
        assert_eq!(g.uci_list().to_string(), "a7a8q");

        let mut g = Game::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        g.push_uci("a7a8n").unwrap();
        assert_eq!(g.as_fen(), "N3k3/8/8/8/8/8/8/4K3 b - - 0 1");
        assert!(!g.status().is_check());

        let mut g = Game::from_fen("4k3/8/8/8/8/8/p7/4K3 b - - 0 1").unwrap();
        assert_eq!(
            g.try_move(c("a2"), c("a1"), Some(PieceKind::King)),
            Err(MoveError::BadPromote(PieceKind::King))
        );
        assert_eq!(
            g.try_move(c("a2"), c("a1"), Some(PieceKind::Pawn)),
            Err(MoveError::BadPromote(PieceKind::Pawn))
        );
        g.try_move(c("a2"), c("a1"), Some(PieceKind::Rook)).unwrap();
        assert_eq!(g.as_fen(), "4k3/8/8/8/8/8/8/r3K3 w - - 0 1");
        assert!(g.status().is_check());
    }

    #[test]
    fn test_stalemate() {
        let mut g = Game::from_fen("7k/8/5QK1/8/8/8/8/8 w - - 0 1").unwrap();
        assert_eq!(g.push_uci("f6f7").unwrap(), Status::Stalemate);
        assert!(g.report().game_over);
        assert!(!g.report().in_check);
        assert_eq!(g.report().message, "Stalemate");
    }

    #[test]
    fn test_pinned_piece_cannot_move() {
        let mut g = Game::from_fen("4k3/4r3/8/8/8/8/4B3/4K3 w - - 0 1").unwrap();
        assert!(g.select_square(c("e2")).is_empty());
        assert!(g.push_uci("e2d3").is_err());
        assert_eq!(sorted(g.select_square(c("e1"))), ["d1", "d2", "f1", "f2"]);
    }

    #[test]
    fn test_reset() {
        let mut g = Game::new_initial();
        g.push_uci_list("f2f3 e7e5 g2g4 d8h4").unwrap();
        assert!(g.is_over());
        g.reset();
        assert_eq!(g, Game::new_initial());
    }
}
