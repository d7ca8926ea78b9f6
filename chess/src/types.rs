//! Core chess types

use std::fmt;

pub use tabiya_base::types::{
    CastlingRights, CastlingRightsParseError, CastlingSide, Color, ColorParseError, Coord,
    CoordParseError, File, PieceKind, PieceKindParseError, Rank,
};

/// Chess piece standing on the board
///
/// A piece knows its own square, and the board keeps this square equal to the slot the
/// piece occupies. Only [`Board`](crate::board::Board) is able to change it.
///
/// The `moved` flag matters only for pawns, rooks and kings, but it is tracked for every
/// piece, so snapshots of pieces can be restored verbatim.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Piece {
    kind: PieceKind,
    color: Color,
    pos: Coord,
    moved: bool,
}

impl Piece {
    /// Creates a piece which has not moved yet
    #[inline]
    pub const fn new(kind: PieceKind, color: Color, pos: Coord) -> Piece {
        Piece {
            kind,
            color,
            pos,
            moved: false,
        }
    }

    #[inline]
    pub const fn with_moved(self, moved: bool) -> Piece {
        Piece { moved, ..self }
    }

    #[inline]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    #[inline]
    pub const fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub const fn pos(&self) -> Coord {
        self.pos
    }

    #[inline]
    pub const fn has_moved(&self) -> bool {
        self.moved
    }

    #[inline]
    pub(crate) fn set_pos(&mut self, pos: Coord) {
        self.pos = pos;
        self.moved = true;
    }

    /// Returns FEN letter of the piece: uppercase for White, lowercase for Black
    pub fn as_char(&self) -> char {
        let c = self.kind.as_char();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    pub fn as_utf8_char(&self) -> char {
        let table = match self.color {
            Color::White => ['♙', '♖', '♘', '♗', '♕', '♔'],
            Color::Black => ['♟', '♜', '♞', '♝', '♛', '♚'],
        };
        table[self.kind as usize]
    }
}

/// State of the game after the last executed move
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    /// Game continues, `turn` is to move
    InProgress { turn: Color, check: bool },
    /// Side to move is checkmated
    Checkmate { winner: Color },
    /// Side to move has no legal moves, but is not in check
    Stalemate,
}

impl Status {
    #[inline]
    pub fn is_over(&self) -> bool {
        !matches!(self, Status::InProgress { .. })
    }

    #[inline]
    pub fn is_check(&self) -> bool {
        matches!(self, Status::InProgress { check: true, .. } | Status::Checkmate { .. })
    }

    pub fn winner(&self) -> Option<Color> {
        match *self {
            Status::Checkmate { winner } => Some(winner),
            _ => None,
        }
    }
}

fn color_name(c: Color) -> &'static str {
    match c {
        Color::White => "White",
        Color::Black => "Black",
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match *self {
            Status::InProgress { turn, check: false } => {
                write!(f, "{} to move", color_name(turn))
            }
            Status::InProgress { turn, check: true } => {
                write!(f, "{} to move, check", color_name(turn))
            }
            Status::Checkmate { winner } => write!(f, "Checkmate, {} wins", color_name(winner)),
            Status::Stalemate => write!(f, "Stalemate"),
        }
    }
}

/// Snapshot of the game state for the UI layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub turn: Color,
    pub in_check: bool,
    pub game_over: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_chars() {
        let e1 = Coord::from_parts(File::E, Rank::R1);
        assert_eq!(Piece::new(PieceKind::King, Color::White, e1).as_char(), 'K');
        assert_eq!(Piece::new(PieceKind::Knight, Color::Black, e1).as_char(), 'n');
        assert_eq!(Piece::new(PieceKind::Queen, Color::Black, e1).as_utf8_char(), '♛');
    }

    #[test]
    fn test_set_pos_marks_moved() {
        let mut p = Piece::new(
            PieceKind::Rook,
            Color::White,
            Coord::from_parts(File::A, Rank::R1),
        );
        assert!(!p.has_moved());
        p.set_pos(Coord::from_parts(File::A, Rank::R4));
        assert!(p.has_moved());
        assert_eq!(p.pos(), Coord::from_parts(File::A, Rank::R4));
    }

    #[test]
    fn test_status() {
        let s = Status::InProgress {
            turn: Color::Black,
            check: true,
        };
        assert!(!s.is_over());
        assert!(s.is_check());
        assert_eq!(s.to_string(), "Black to move, check");

        let s = Status::Checkmate {
            winner: Color::Black,
        };
        assert!(s.is_over());
        assert_eq!(s.winner(), Some(Color::Black));
        assert_eq!(s.to_string(), "Checkmate, Black wins");

        assert!(Status::Stalemate.is_over());
        assert!(!Status::Stalemate.is_check());
    }
}
