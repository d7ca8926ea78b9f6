//! Board and related things

use crate::types::{Color, Coord, File, Piece, PieceKind, Rank};
use tabiya_base::geometry;

use std::fmt;

/// Chess board
///
/// The board is a fixed array of 64 slots, indexed by [`Coord::index()`]. Each slot owns at most
/// one [`Piece`], and the piece's own position is always equal to the coordinate of its slot.
/// All the operations that relocate pieces keep both in sync.
///
/// The board doesn't know whose turn it is. Such state is kept in [`Game`](crate::game::Game).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [Option<Piece>; 64],
}

impl Board {
    /// Returns a board without any pieces
    #[inline]
    pub const fn empty() -> Board {
        Board { cells: [None; 64] }
    }

    /// Returns a board with the initial position
    pub fn initial() -> Board {
        let mut res = Board::empty();
        for file in File::iter() {
            res.put(file, Rank::R2, PieceKind::Pawn, Color::White);
            res.put(file, Rank::R7, PieceKind::Pawn, Color::Black);
        }
        for color in [Color::White, Color::Black] {
            let rank = geometry::castling_rank(color);
            for (file, kind) in [
                (File::A, PieceKind::Rook),
                (File::B, PieceKind::Knight),
                (File::C, PieceKind::Bishop),
                (File::D, PieceKind::Queen),
                (File::E, PieceKind::King),
                (File::F, PieceKind::Bishop),
                (File::G, PieceKind::Knight),
                (File::H, PieceKind::Rook),
            ] {
                res.put(file, rank, kind, color);
            }
        }
        res
    }

    fn put(&mut self, file: File, rank: Rank, kind: PieceKind, color: Color) {
        self.place(Piece::new(kind, color, Coord::from_parts(file, rank)));
    }

    /// Returns the piece on the square `c`
    #[inline]
    pub fn get(&self, c: Coord) -> Option<Piece> {
        self.cells[c.index()]
    }

    /// Returns the piece on the square with file `file` and rank `rank`
    #[inline]
    pub fn get2(&self, file: File, rank: Rank) -> Option<Piece> {
        self.get(Coord::from_parts(file, rank))
    }

    /// Returns `true` if the square `c` is empty
    #[inline]
    pub fn is_free(&self, c: Coord) -> bool {
        self.cells[c.index()].is_none()
    }

    /// Returns the color of the piece on the square `c`, if any
    #[inline]
    pub fn color_at(&self, c: Coord) -> Option<Color> {
        self.get(c).map(|p| p.color())
    }

    /// Puts the piece `p` onto its own square, returning the piece previously standing there
    ///
    /// The piece is stored verbatim, including its `moved` flag. This is used both to set up
    /// positions and to restore snapshots taken before a trial move.
    #[inline]
    pub fn place(&mut self, p: Piece) -> Option<Piece> {
        self.cells[p.pos().index()].replace(p)
    }

    /// Removes the piece from the square `c` and returns it
    #[inline]
    pub fn take(&mut self, c: Coord) -> Option<Piece> {
        self.cells[c.index()].take()
    }

    /// Moves the piece from `src` to `dst`, returning the piece previously standing on `dst`
    ///
    /// The moved piece gets its position updated and its `moved` flag set. If `src` is empty,
    /// nothing happens and `None` is returned.
    pub fn relocate(&mut self, src: Coord, dst: Coord) -> Option<Piece> {
        let mut p = self.take(src)?;
        p.set_pos(dst);
        self.place(p)
    }

    /// Returns the position of the king of color `c`
    ///
    /// Returns `None` if there is no such king, which doesn't happen in valid game states.
    pub fn king_pos(&self, c: Color) -> Option<Coord> {
        self.iter()
            .find(|p| p.kind() == PieceKind::King && p.color() == c)
            .map(|p| p.pos())
    }

    /// Iterates over all the pieces on the board, in the order of square indices
    pub fn iter(&self) -> impl Iterator<Item = Piece> + '_ {
        self.cells.iter().flatten().copied()
    }

    /// Iterates over all the pieces of color `c`
    pub fn pieces(&self, c: Color) -> impl Iterator<Item = Piece> + '_ {
        self.iter().filter(move |p| p.color() == c)
    }

    /// Wraps the board to allow pretty-printing with the given style `style`
    ///
    /// The resulting wrapper implements [`fmt::Display`], so can be used with
    /// `write!()`, `println!()`, or `ToString::to_string`.
    ///
    /// # Example
    ///
    /// ```
    /// # use tabiya::board::{Board, PrettyStyle};
    /// #
    /// let b = Board::initial();
    ///
    /// let res = r#"
    /// 8|rnbqkbnr
    /// 7|pppppppp
    /// 6|........
    /// 5|........
    /// 4|........
    /// 3|........
    /// 2|PPPPPPPP
    /// 1|RNBQKBNR
    /// -+--------
    ///  |abcdefgh
    /// "#;
    /// assert_eq!(b.pretty(PrettyStyle::Ascii).to_string().trim(), res.trim());
    /// ```
    #[inline]
    pub fn pretty(&self, style: PrettyStyle) -> Pretty<'_> {
        Pretty { board: self, style }
    }
}

impl Default for Board {
    #[inline]
    fn default() -> Board {
        Board::empty()
    }
}

/// Style for [`Board::pretty()`]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PrettyStyle {
    /// Print pieces and frames as ASCII characters
    Ascii,
    /// Print pieces and frames as fancy Unicode characters
    Utf8,
}

/// Wrapper to pretty-print the board
///
/// See docs for [`Board::pretty()`] for more details.
pub struct Pretty<'a> {
    board: &'a Board,
    style: PrettyStyle,
}

trait StyleTable {
    const HORZ_FRAME: char;
    const VERT_FRAME: char;
    const ANGLE_FRAME: char;

    fn cell(p: Option<Piece>) -> char;

    fn fmt(b: &Board, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        for rank in Rank::iter() {
            write!(f, "{}{}", rank, Self::VERT_FRAME)?;
            for file in File::iter() {
                write!(f, "{}", Self::cell(b.get2(file, rank)))?;
            }
            writeln!(f)?;
        }
        write!(f, "{}{}", Self::HORZ_FRAME, Self::ANGLE_FRAME)?;
        for _ in File::iter() {
            write!(f, "{}", Self::HORZ_FRAME)?;
        }
        writeln!(f)?;
        write!(f, " {}", Self::VERT_FRAME)?;
        for file in File::iter() {
            write!(f, "{}", file)?;
        }
        writeln!(f)?;
        Ok(())
    }
}

struct AsciiStyleTable;
struct Utf8StyleTable;

impl StyleTable for AsciiStyleTable {
    const HORZ_FRAME: char = '-';
    const VERT_FRAME: char = '|';
    const ANGLE_FRAME: char = '+';

    fn cell(p: Option<Piece>) -> char {
        p.map_or('.', |p| p.as_char())
    }
}

impl StyleTable for Utf8StyleTable {
    const HORZ_FRAME: char = '─';
    const VERT_FRAME: char = '│';
    const ANGLE_FRAME: char = '┼';

    fn cell(p: Option<Piece>) -> char {
        p.map_or('.', |p| p.as_utf8_char())
    }
}

impl<'a> fmt::Display for Pretty<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self.style {
            PrettyStyle::Ascii => AsciiStyleTable::fmt(self.board, f),
            PrettyStyle::Utf8 => Utf8StyleTable::fmt(self.board, f),
        }
    }
}
