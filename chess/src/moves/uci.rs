//! Utilities to work with moves in UCI format

use super::base::MoveError;
use crate::types::{Coord, CoordParseError, PieceKind};

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error creating a parsed UCI representation from string
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum RawParseError {
    /// Bad string length
    #[error("bad string length")]
    BadLength,
    /// Null move `0000`, which cannot be played
    #[error("null move is not supported")]
    Null,
    /// Bad source square
    #[error("bad source: {0}")]
    BadSrc(CoordParseError),
    /// Bad destination square
    #[error("bad destination: {0}")]
    BadDst(CoordParseError),
    /// Bad promote character
    #[error("bad promote char {0:?}")]
    BadPromote(char),
}

/// Error parsing UCI into a legal move
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ParseError {
    /// Error parsing move
    #[error("cannot parse move: {0}")]
    Parse(#[from] RawParseError),
    /// Move is not legal in the current position
    #[error("invalid move: {0}")]
    Validate(#[from] MoveError),
}

/// Parsed move in UCI format
///
/// This is only a syntactic representation. Legality is checked when the move is played, see
/// [`Game::push_uci()`](crate::game::Game::push_uci).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Move {
    /// Source square
    pub src: Coord,
    /// Destination square
    pub dst: Coord,
    /// Piece to promote, if any
    pub promote: Option<PieceKind>,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}{}", self.src, self.dst)?;
        if let Some(p) = self.promote {
            write!(f, "{}", p.as_char())?;
        }
        Ok(())
    }
}

impl FromStr for Move {
    type Err = RawParseError;

    fn from_str(s: &str) -> Result<Move, Self::Err> {
        if s == "0000" {
            return Err(RawParseError::Null);
        }
        if !s.is_ascii() || !matches!(s.len(), 4 | 5) {
            return Err(RawParseError::BadLength);
        }
        let src = Coord::from_str(&s[0..2]).map_err(RawParseError::BadSrc)?;
        let dst = Coord::from_str(&s[2..4]).map_err(RawParseError::BadDst)?;
        let promote = match s.as_bytes().get(4) {
            Some(&b) => match PieceKind::from_char(b as char) {
                Some(p) if p.is_promotion_target() => Some(p),
                _ => return Err(RawParseError::BadPromote(b as char)),
            },
            None => None,
        };
        Ok(Move { src, dst, promote })
    }
}
