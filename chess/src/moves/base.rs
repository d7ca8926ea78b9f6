use super::uci;
use crate::board::Board;
use crate::legal;
use crate::types::{CastlingSide, Color, Coord, Piece, PieceKind};
use tabiya_base::geometry;

use std::fmt;

use thiserror::Error;

/// Move kind
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MoveKind {
    /// Non-pawn move or capture (except castling)
    Simple,
    /// Castling to the given side
    Castling(CastlingSide),
    /// Single pawn move (either non-capture or capture)
    PawnSimple,
    /// Double pawn move
    PawnDouble,
    /// En passant capture
    Enpassant,
    /// Pawn promotion to the given piece (either non-capture or capture)
    Promote(PieceKind),
}

/// Executed chess move
///
/// Moves are created by [`Game`](crate::game::Game) after the legality check, so a `Move` found
/// in the history was legal in the position where it was made.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Move {
    kind: MoveKind,
    src: Coord,
    dst: Coord,
    side: Color,
}

/// Error indicating that a move cannot be executed
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum MoveError {
    /// The game has already finished
    #[error("game is over")]
    GameOver,
    /// There is no piece on the source square
    #[error("no piece on {0}")]
    NoPiece(Coord),
    /// The piece on the source square belongs to the side not on move
    #[error("piece on {0} belongs to the wrong side")]
    WrongSide(Coord),
    /// The destination is not among the legal moves of the piece
    #[error("move {src}{dst} is not legal")]
    Illegal { src: Coord, dst: Coord },
    /// Promotion to this piece is not allowed
    #[error("cannot promote to {0:?}")]
    BadPromote(PieceKind),
    /// Promotion piece is given for a move which is not a promotion
    #[error("promotion piece given for a non-promotion move")]
    UnexpectedPromote,
}

impl Move {
    /// Detects the kind of the move of `piece` to `dst` on the board `b`
    ///
    /// The move must be legal. `promote` is used only if the move is a promotion, and defaults
    /// to the queen.
    pub(crate) fn classify(b: &Board, piece: &Piece, dst: Coord, promote: Option<PieceKind>) -> Move {
        let src = piece.pos();
        let kind = match piece.kind() {
            PieceKind::Pawn => {
                if dst.rank() == geometry::promote_dst_rank(piece.color()) {
                    MoveKind::Promote(promote.unwrap_or(PieceKind::Queen))
                } else if legal::capture_square(b, piece, dst) != dst {
                    MoveKind::Enpassant
                } else if src.rank() == geometry::double_move_src_rank(piece.color())
                    && src.file() == dst.file()
                    && (dst.rank().index() as isize - src.rank().index() as isize).abs() == 2
                {
                    MoveKind::PawnDouble
                } else {
                    MoveKind::PawnSimple
                }
            }
            PieceKind::King if legal::is_castling(piece, dst) => {
                match CastlingSide::from_king_shift(src.file(), dst.file()) {
                    Some(side) => MoveKind::Castling(side),
                    None => MoveKind::Simple,
                }
            }
            _ => MoveKind::Simple,
        };
        Move {
            kind,
            src,
            dst,
            side: piece.color(),
        }
    }

    #[inline]
    pub const fn kind(&self) -> MoveKind {
        self.kind
    }

    #[inline]
    pub const fn src(&self) -> Coord {
        self.src
    }

    #[inline]
    pub const fn dst(&self) -> Coord {
        self.dst
    }

    /// Returns the side which made the move
    #[inline]
    pub const fn side(&self) -> Color {
        self.side
    }

    /// Returns the piece the pawn is promoted to, if the move is a promotion
    #[inline]
    pub const fn promote(&self) -> Option<PieceKind> {
        match self.kind {
            MoveKind::Promote(p) => Some(p),
            _ => None,
        }
    }

    #[inline]
    pub const fn castling_side(&self) -> Option<CastlingSide> {
        match self.kind {
            MoveKind::Castling(side) => Some(side),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_castling(&self) -> bool {
        matches!(self.kind, MoveKind::Castling(_))
    }

    #[inline]
    pub const fn is_enpassant(&self) -> bool {
        matches!(self.kind, MoveKind::Enpassant)
    }

    /// Returns the square a pawn can be captured on en passant after this move
    pub fn enpassant_target(&self) -> Option<Coord> {
        if self.kind != MoveKind::PawnDouble {
            return None;
        }
        self.src
            .try_shift(0, geometry::pawn_forward_delta(self.side))
    }

    /// Converts the move into UCI representation
    #[inline]
    pub fn uci(&self) -> uci::Move {
        uci::Move {
            src: self.src,
            dst: self.dst,
            promote: self.promote(),
        }
    }
}

impl fmt::Display for Move {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        self.uci().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::Fen;
    use std::str::FromStr;

    fn c(s: &str) -> Coord {
        Coord::from_str(s).unwrap()
    }

    fn classify(fen: &str, src: &str, dst: &str, promote: Option<PieceKind>) -> Move {
        let b = Fen::from_str(fen).unwrap().board;
        let piece = b.get(c(src)).unwrap();
        Move::classify(&b, &piece, c(dst), promote)
    }

    #[test]
    fn test_classify() {
        let init = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        let mv = classify(init, "e2", "e4", None);
        assert_eq!(mv.kind(), MoveKind::PawnDouble);
        assert_eq!(mv.enpassant_target(), Some(c("e3")));
        assert_eq!(mv.to_string(), "e2e4");

        let mv = classify(init, "e7", "e6", None);
        assert_eq!(mv.kind(), MoveKind::PawnSimple);
        assert_eq!(mv.side(), Color::Black);
        assert_eq!(mv.enpassant_target(), None);

        assert_eq!(classify(init, "g1", "f3", None).kind(), MoveKind::Simple);

        let castle = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        let mv = classify(castle, "e1", "g1", None);
        assert!(mv.is_castling());
        assert_eq!(mv.castling_side(), Some(CastlingSide::King));
        assert_eq!(
            classify(castle, "e8", "c8", None).kind(),
            MoveKind::Castling(CastlingSide::Queen)
        );
        assert_eq!(classify(castle, "e1", "f1", None).kind(), MoveKind::Simple);

        let ep = "4k3/8/8/3Pp3/8/8/8/4K3 w - e6 0 1";
        assert!(classify(ep, "d5", "e6", None).is_enpassant());
        assert_eq!(classify(ep, "d5", "d6", None).kind(), MoveKind::PawnSimple);
    }

    #[test]
    fn test_promote() {
        let fen = "1r2k3/P7/8/8/8/8/8/4K3 w - - 0 1";
        let mv = classify(fen, "a7", "a8", None);
        assert_eq!(mv.promote(), Some(PieceKind::Queen));
        assert_eq!(mv.to_string(), "a7a8q");

        let mv = classify(fen, "a7", "b8", Some(PieceKind::Knight));
        assert_eq!(mv.kind(), MoveKind::Promote(PieceKind::Knight));
        assert_eq!(mv.to_string(), "a7b8n");
    }
}
