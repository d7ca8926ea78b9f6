//! Pseudo-legal move generation
//!
//! Every function here is a pure function of the board contents: it never mutates the board and
//! never checks whether the king stays safe. See [`legal`](crate::legal) for the filtering.

use crate::board::Board;
use crate::types::{CastlingSide, Color, Coord, File, Piece, PieceKind};
use tabiya_base::geometry;

use std::slice;

use arrayvec::ArrayVec;
use derive_more::{Deref, DerefMut};

/// Destination squares of a single piece
///
/// The capacity covers the largest possible set, which is a queen in the center (27 squares).
#[derive(Default, Debug, Clone, Eq, PartialEq, Deref, DerefMut)]
pub struct DestList(ArrayVec<Coord, 32>);

impl DestList {
    pub fn new() -> DestList {
        DestList(ArrayVec::new())
    }
}

impl<'a> IntoIterator for &'a DestList {
    type Item = &'a Coord;
    type IntoIter = slice::Iter<'a, Coord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for DestList {
    type Item = Coord;
    type IntoIter = arrayvec::IntoIter<Coord, 32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

const KNIGHT_OFFSETS: [(isize, isize); 8] = [
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
];

const KING_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const ROOK_DIRS: [(isize, isize); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const BISHOP_DIRS: [(isize, isize); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Mode {
    /// Squares the piece may move to
    Moves,
    /// Squares the piece attacks
    Attacks,
}

fn can_land(b: &Board, c: Coord, color: Color) -> bool {
    b.color_at(c) != Some(color)
}

fn gen_pawn(b: &Board, p: &Piece, mode: Mode, res: &mut DestList) {
    let color = p.color();
    let forward = geometry::pawn_forward_delta(color);

    if mode == Mode::Moves {
        if let Some(one) = p.pos().try_shift(0, forward) {
            if b.is_free(one) {
                res.push(one);
                if p.pos().rank() == geometry::double_move_src_rank(color) {
                    if let Some(two) = one.try_shift(0, forward) {
                        if b.is_free(two) {
                            res.push(two);
                        }
                    }
                }
            }
        }
    }

    for delta_file in [-1, 1] {
        if let Some(dst) = p.pos().try_shift(delta_file, forward) {
            let capture = b.color_at(dst) == Some(color.inv());
            if capture || mode == Mode::Attacks {
                res.push(dst);
            }
        }
    }
}

fn gen_leaper(b: &Board, p: &Piece, offsets: &[(isize, isize)], res: &mut DestList) {
    for &(df, dr) in offsets {
        if let Some(dst) = p.pos().try_shift(df, dr) {
            if can_land(b, dst, p.color()) {
                res.push(dst);
            }
        }
    }
}

fn gen_slider(b: &Board, p: &Piece, dirs: &[(isize, isize)], res: &mut DestList) {
    for &(df, dr) in dirs {
        let mut cur = p.pos();
        while let Some(dst) = cur.try_shift(df, dr) {
            match b.color_at(dst) {
                None => res.push(dst),
                Some(color) => {
                    if color != p.color() {
                        res.push(dst);
                    }
                    break;
                }
            }
            cur = dst;
        }
    }
}

/// Returns the square the king lands on when castling to `side`, if the board allows it
///
/// The king must not have moved, the rook of the same color must stand unmoved on its home corner
/// of the king's rank, and all the squares strictly between them must be empty. Attacks on the
/// king's path are not considered here.
pub fn castling_dest(b: &Board, king: &Piece, side: CastlingSide) -> Option<Coord> {
    if king.kind() != PieceKind::King || king.has_moved() {
        return None;
    }
    let src = king.pos();
    let rook_pos = Coord::from_parts(geometry::castling_rook_src(side), src.rank());
    match b.get(rook_pos) {
        Some(rook)
            if rook.kind() == PieceKind::Rook
                && rook.color() == king.color()
                && !rook.has_moved() => {}
        _ => return None,
    }
    let (lo, hi) = {
        let (k, r) = (src.file().index(), rook_pos.file().index());
        (k.min(r), k.max(r))
    };
    let path_clear = (lo + 1..hi)
        .map(|file| Coord::from_parts(File::from_index(file), src.rank()))
        .all(|c| b.is_free(c));
    if !path_clear {
        return None;
    }
    src.try_shift(geometry::castling_king_delta(side), 0)
}

fn gen(b: &Board, p: &Piece, mode: Mode) -> DestList {
    let mut res = DestList::new();
    match p.kind() {
        PieceKind::Pawn => gen_pawn(b, p, mode, &mut res),
        PieceKind::Knight => gen_leaper(b, p, &KNIGHT_OFFSETS, &mut res),
        PieceKind::Bishop => gen_slider(b, p, &BISHOP_DIRS, &mut res),
        PieceKind::Rook => gen_slider(b, p, &ROOK_DIRS, &mut res),
        PieceKind::Queen => {
            gen_slider(b, p, &ROOK_DIRS, &mut res);
            gen_slider(b, p, &BISHOP_DIRS, &mut res);
        }
        PieceKind::King => {
            gen_leaper(b, p, &KING_OFFSETS, &mut res);
            if mode == Mode::Moves {
                for side in [CastlingSide::King, CastlingSide::Queen] {
                    if let Some(dst) = castling_dest(b, p, side) {
                        res.push(dst);
                    }
                }
            }
        }
    }
    res
}

/// Returns pseudo-legal destinations of the piece `p`
///
/// Castling candidates are included, en passant is not, as it depends on the previous move which
/// the board doesn't remember.
#[inline]
pub fn possible_moves(b: &Board, p: &Piece) -> DestList {
    gen(b, p, Mode::Moves)
}

/// Returns the squares attacked by the piece `p`
///
/// For squares occupied by the opponent of `p`, this is exactly the subset of
/// [`possible_moves()`] landing there. The difference is on empty squares: pawns attack both
/// diagonals regardless of occupancy and never attack by pushing, kings don't attack through
/// castling.
#[inline]
pub fn attacked_squares(b: &Board, p: &Piece) -> DestList {
    gen(b, p, Mode::Attacks)
}

/// Counts all the pseudo-legal moves of color `c`, excluding en passant
pub fn count_pseudo_legal(b: &Board, c: Color) -> usize {
    b.pieces(c).map(|p| possible_moves(b, &p).len()).sum()
}
