//! Reading and writing positions in Forsyth-Edwards notation

use crate::board::Board;
use crate::types::{
    self, CastlingRights, CastlingSide, Color, Coord, File, Piece, PieceKind, Rank,
};
use tabiya_base::geometry;

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use thiserror::Error;

/// Position validation error
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ValidateError {
    /// One of the sides has more than one king
    #[error("more than one king of color {0:?}")]
    TooManyKings(Color),
    /// There is a pawn on the 1st or on the 8th rank
    #[error("invalid pawn position {0}")]
    InvalidPawn(Coord),
    /// En passant target square is not empty
    #[error("en passant target {0} is occupied")]
    OccupiedEnpassant(Coord),
}

/// Error parsing the first part of FEN (i.e. the positions of pieces on the board)
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum CellsParseError {
    /// Rank is too large
    #[error("too many items in rank {0}")]
    RankOverflow(Rank),
    /// Rank is too small
    #[error("not enough items in rank {0}")]
    RankUnderflow(Rank),
    /// Too many ranks
    #[error("too many ranks")]
    Overflow,
    /// Not enough ranks
    #[error("not enough ranks")]
    Underflow,
    /// Unexpected character
    #[error("unexpected char {0:?}")]
    UnexpectedChar(char),
}

/// Error parsing [`Fen`]
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum FenParseError {
    /// FEN contains non-ASCII characters
    #[error("non-ASCII data in FEN")]
    NonAscii,
    /// FEN doesn't have board part
    #[error("board not specified")]
    NoBoard,
    /// Error parsing board from FEN
    #[error("bad board: {0}")]
    Board(#[from] CellsParseError),
    /// FEN doesn't have move side part
    #[error("no move side")]
    NoMoveSide,
    /// Error parsing move side from FEN
    #[error("bad move side: {0}")]
    MoveSide(#[from] types::ColorParseError),
    /// FEN doesn't have castling rights part
    #[error("no castling rights")]
    NoCastling,
    /// Error parsing castling rights from FEN
    #[error("bad castling rights: {0}")]
    Castling(#[from] types::CastlingRightsParseError),
    /// FEN doesn't have en passant part
    #[error("no enpassant")]
    NoEnpassant,
    /// Error parsing en passant from FEN
    #[error("bad enpassant: {0}")]
    Enpassant(#[from] types::CoordParseError),
    /// En passant rank doesn't match the side to move
    #[error("invalid enpassant rank {0}")]
    InvalidEnpassantRank(Rank),
    /// Error parsing move counter
    #[error("bad move counter: {0}")]
    MoveCounter(ParseIntError),
    /// Error parsing move number
    #[error("bad move number: {0}")]
    MoveNumber(ParseIntError),
    /// FEN contains extra data
    #[error("extra data in FEN")]
    ExtraData,
    /// Position was parsed, but it's invalid
    #[error("invalid position: {0}")]
    Valid(#[from] ValidateError),
}

/// Position decoded from FEN
///
/// The board doesn't store castling rights directly. Instead, the `moved` flags of kings, rooks
/// and pawns are derived from the FEN fields:
///
/// - a pawn has moved iff it's not on its double-move rank;
/// - a king hasn't moved iff it stands on its home square and its side has any castling right;
/// - a rook hasn't moved iff it stands on its home corner and the corresponding right is present.
///
/// Move counters are parsed and checked, but not kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fen {
    pub board: Board,
    pub side: Color,
    pub ep_target: Option<Coord>,
}

impl Fen {
    pub fn initial() -> Fen {
        Fen {
            board: Board::initial(),
            side: Color::White,
            ep_target: None,
        }
    }
}

/// Returns the en passant target rank when `side` is to move
fn enpassant_dst_rank(side: Color) -> Rank {
    match side {
        Color::White => Rank::R6,
        Color::Black => Rank::R3,
    }
}

fn parse_cells(s: &str) -> Result<[Option<(PieceKind, Color)>; 64], CellsParseError> {
    type Error = CellsParseError;

    let mut file = 0_usize;
    let mut rank = 0_usize;
    let mut pos = 0_usize;
    let mut cells = [None; 64];
    for b in s.bytes() {
        match b {
            b'1'..=b'8' => {
                let add = (b - b'0') as usize;
                if file + add > 8 {
                    return Err(Error::RankOverflow(Rank::from_index(rank)));
                }
                file += add;
                pos += add;
            }
            b'/' => {
                if file < 8 {
                    return Err(Error::RankUnderflow(Rank::from_index(rank)));
                }
                rank += 1;
                file = 0;
                if rank >= 8 {
                    return Err(Error::Overflow);
                }
            }
            _ => {
                if file >= 8 {
                    return Err(Error::RankOverflow(Rank::from_index(rank)));
                }
                let ch = b as char;
                let kind = PieceKind::from_char(ch).ok_or(Error::UnexpectedChar(ch))?;
                let color = if ch.is_ascii_uppercase() {
                    Color::White
                } else {
                    Color::Black
                };
                cells[pos] = Some((kind, color));
                file += 1;
                pos += 1;
            }
        };
    }

    if file < 8 {
        return Err(Error::RankUnderflow(Rank::from_index(rank)));
    }
    if rank < 7 {
        return Err(Error::Underflow);
    }
    Ok(cells)
}

fn parse_ep_target(s: &str, side: Color) -> Result<Option<Coord>, FenParseError> {
    if s == "-" {
        return Ok(None);
    }
    let target = Coord::from_str(s)?;
    if target.rank() != enpassant_dst_rank(side) {
        return Err(FenParseError::InvalidEnpassantRank(target.rank()));
    }
    Ok(Some(target))
}

fn is_unmoved(kind: PieceKind, color: Color, pos: Coord, castling: CastlingRights) -> bool {
    let home = geometry::castling_rank(color);
    match kind {
        PieceKind::Pawn => pos.rank() == geometry::double_move_src_rank(color),
        PieceKind::King => {
            pos == Coord::from_parts(File::E, home) && castling.has_color(color)
        }
        PieceKind::Rook => [CastlingSide::King, CastlingSide::Queen]
            .into_iter()
            .any(|side| {
                pos == Coord::from_parts(geometry::castling_rook_src(side), home)
                    && castling.has(color, side)
            }),
        _ => true,
    }
}

fn build_board(
    cells: [Option<(PieceKind, Color)>; 64],
    castling: CastlingRights,
) -> Result<Board, ValidateError> {
    let mut board = Board::empty();
    let mut kings = [0_usize; 2];
    for (pos, cell) in Coord::iter().zip(cells) {
        let (kind, color) = match cell {
            Some(cell) => cell,
            None => continue,
        };
        match kind {
            PieceKind::King => {
                kings[color as usize] += 1;
                if kings[color as usize] > 1 {
                    return Err(ValidateError::TooManyKings(color));
                }
            }
            PieceKind::Pawn => {
                if pos.rank() == Rank::R1 || pos.rank() == Rank::R8 {
                    return Err(ValidateError::InvalidPawn(pos));
                }
            }
            _ => {}
        }
        let moved = !is_unmoved(kind, color, pos, castling);
        board.place(Piece::new(kind, color, pos).with_moved(moved));
    }
    Ok(board)
}

impl FromStr for Fen {
    type Err = FenParseError;

    fn from_str(s: &str) -> Result<Fen, Self::Err> {
        type Error = FenParseError;

        if !s.is_ascii() {
            return Err(Error::NonAscii);
        }
        let mut iter = s.split_ascii_whitespace().fuse();

        let cells = parse_cells(iter.next().ok_or(Error::NoBoard)?)?;
        let side = Color::from_str(iter.next().ok_or(Error::NoMoveSide)?)?;
        let castling = CastlingRights::from_str(iter.next().ok_or(Error::NoCastling)?)?;
        let ep_target = parse_ep_target(iter.next().ok_or(Error::NoEnpassant)?, side)?;
        if let Some(s) = iter.next() {
            u16::from_str(s).map_err(Error::MoveCounter)?;
        }
        if let Some(s) = iter.next() {
            u16::from_str(s).map_err(Error::MoveNumber)?;
        }
        if iter.next().is_some() {
            return Err(Error::ExtraData);
        }

        let board = build_board(cells, castling)?;
        if let Some(target) = ep_target {
            if !board.is_free(target) {
                return Err(ValidateError::OccupiedEnpassant(target).into());
            }
        }
        Ok(Fen {
            board,
            side,
            ep_target,
        })
    }
}

/// Computes castling rights from the `moved` flags of kings and rooks
///
/// A right is present if the king stands unmoved on its home square and the rook of the same
/// color stands unmoved on the corresponding corner. Attacks and pieces in between are not
/// considered.
pub fn castling_rights(b: &Board) -> CastlingRights {
    let mut res = CastlingRights::EMPTY;
    for color in [Color::White, Color::Black] {
        let home = geometry::castling_rank(color);
        match b.get2(File::E, home) {
            Some(k) if k.kind() == PieceKind::King && k.color() == color && !k.has_moved() => {}
            _ => continue,
        }
        for side in [CastlingSide::King, CastlingSide::Queen] {
            match b.get2(geometry::castling_rook_src(side), home) {
                Some(r) if r.kind() == PieceKind::Rook && r.color() == color && !r.has_moved() => {
                    res.set(color, side)
                }
                _ => {}
            }
        }
    }
    res
}

fn format_cells(b: &Board, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
    for rank in Rank::iter() {
        if rank.index() != 0 {
            write!(f, "/")?;
        }
        let mut empty = 0;
        for file in File::iter() {
            let p = match b.get2(file, rank) {
                Some(p) => p,
                None => {
                    empty += 1;
                    continue;
                }
            };
            if empty != 0 {
                write!(f, "{}", empty)?;
                empty = 0;
            }
            write!(f, "{}", p.as_char())?;
        }
        if empty != 0 {
            write!(f, "{}", empty)?;
        }
    }
    Ok(())
}

/// Formats the position as FEN
///
/// The halfmove clock and the move number are not tracked, so they are always written
/// as `0 1`.
impl fmt::Display for Fen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        format_cells(&self.board, f)?;
        write!(f, " {} {}", self.side, castling_rights(&self.board))?;
        match self.ep_target {
            Some(c) => write!(f, " {}", c)?,
            None => write!(f, " -")?,
        };
        write!(f, " 0 1")
    }
}

/// Returns the FEN string of the position
pub fn write(board: &Board, side: Color, ep_target: Option<Coord>) -> String {
    Fen {
        board: board.clone(),
        side,
        ep_target,
    }
    .to_string()
}
