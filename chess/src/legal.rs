//! Filtering pseudo-legal moves down to legal ones

use crate::attack;
use crate::board::Board;
use crate::movegen::{self, DestList};
use crate::types::{CastlingSide, Color, Coord, Piece, PieceKind};
use tabiya_base::geometry;

use arrayvec::ArrayVec;

/// Everything needed to revert a trial move
///
/// Pieces are stored as complete values, so restoring them brings back their `moved`
/// flags as well as their positions.
struct Undo {
    mover: Piece,
    captured: Option<Piece>,
}

/// Returns the square of the piece captured when `mover` goes to `dst`
///
/// A pawn moving diagonally onto an empty square captures en passant, so the victim stands
/// beside the pawn, not on `dst`.
pub(crate) fn capture_square(b: &Board, mover: &Piece, dst: Coord) -> Coord {
    let src = mover.pos();
    if mover.kind() == PieceKind::Pawn && src.file() != dst.file() && b.is_free(dst) {
        Coord::from_parts(dst.file(), src.rank())
    } else {
        dst
    }
}

fn make_trial(b: &mut Board, mover: Piece, dst: Coord) -> Undo {
    let captured = b.take(capture_square(b, &mover, dst));
    b.relocate(mover.pos(), dst);
    Undo { mover, captured }
}

fn unmake_trial(b: &mut Board, dst: Coord, u: Undo) {
    b.take(dst);
    b.place(u.mover);
    if let Some(captured) = u.captured {
        b.place(captured);
    }
}

/// Returns `true` if moving the piece from `src` to `dst` doesn't leave the king of `color` in
/// check
///
/// The move is played on the board and then reverted, so the board is exactly the same after the
/// call as before it, whatever the result is. Returns `false` if there is no piece of `color`
/// on `src`.
pub fn is_move_safe(b: &mut Board, src: Coord, dst: Coord, color: Color) -> bool {
    let mover = match b.get(src) {
        Some(p) if p.color() == color => p,
        _ => return false,
    };
    let undo = make_trial(b, mover, dst);
    let safe = !attack::is_king_in_check(b, color);
    unmake_trial(b, dst, undo);
    safe
}

/// Returns the en passant destination for the pawn `p`, if the target square allows it
pub fn enpassant_dest(b: &Board, p: &Piece, ep_target: Option<Coord>) -> Option<Coord> {
    let target = ep_target?;
    if p.kind() != PieceKind::Pawn {
        return None;
    }
    let forward = geometry::pawn_forward_delta(p.color());
    let reachable = [-1, 1]
        .into_iter()
        .any(|df| p.pos().try_shift(df, forward) == Some(target));
    if !reachable || !b.is_free(target) {
        return None;
    }
    let victim = b.get(Coord::from_parts(target.file(), p.pos().rank()))?;
    (victim.kind() == PieceKind::Pawn && victim.color() != p.color()).then_some(target)
}

fn is_castling_path_safe(b: &Board, king: &Piece, dst: Coord) -> bool {
    let side = match CastlingSide::from_king_shift(king.pos().file(), dst.file()) {
        Some(side) => side,
        None => return true,
    };
    let step = geometry::castling_king_delta(side) / 2;
    let passed = match king.pos().try_shift(step, 0) {
        Some(c) => c,
        None => return false,
    };
    !attack::is_square_attacked(b, king.pos(), king.color())
        && !attack::is_square_attacked(b, passed, king.color())
}

/// Returns `true` if the king move `src` to `dst` is a castling
pub(crate) fn is_castling(king: &Piece, dst: Coord) -> bool {
    king.kind() == PieceKind::King
        && king.pos().rank() == dst.rank()
        && CastlingSide::from_king_shift(king.pos().file(), dst.file()).is_some()
}

/// Returns legal destinations for the piece on `src`
///
/// Candidates are the pseudo-legal moves of the piece, plus en passant if `ep_target` allows it.
/// A candidate is kept if the king stays safe after it. Castling additionally requires that the
/// king is not in check and doesn't pass through an attacked square.
///
/// Returns an empty list if `src` is empty.
pub fn legal_moves(b: &mut Board, src: Coord, ep_target: Option<Coord>) -> DestList {
    let piece = match b.get(src) {
        Some(p) => p,
        None => return DestList::new(),
    };
    let mut candidates = movegen::possible_moves(b, &piece);
    if let Some(ep) = enpassant_dest(b, &piece, ep_target) {
        candidates.push(ep);
    }
    candidates.retain(|dst| {
        if is_castling(&piece, *dst) && !is_castling_path_safe(b, &piece, *dst) {
            return false;
        }
        is_move_safe(b, src, *dst, piece.color())
    });
    candidates
}

/// Returns `true` if the side `c` has at least one legal move
pub fn has_legal_moves(b: &mut Board, c: Color, ep_target: Option<Coord>) -> bool {
    let sources: ArrayVec<Coord, 64> = b.pieces(c).map(|p| p.pos()).collect();
    sources.into_iter().any(|src| {
        let piece = match b.get(src) {
            Some(p) => p,
            None => return false,
        };
        let mut candidates = movegen::possible_moves(b, &piece);
        if let Some(ep) = enpassant_dest(b, &piece, ep_target) {
            candidates.push(ep);
        }
        candidates.into_iter().any(|dst| {
            (!is_castling(&piece, dst) || is_castling_path_safe(b, &piece, dst))
                && is_move_safe(b, src, dst, c)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::Fen;
    use std::str::FromStr;

    fn c(s: &str) -> Coord {
        Coord::from_str(s).unwrap()
    }

    fn fen(s: &str) -> Fen {
        Fen::from_str(s).unwrap()
    }

    fn sorted(list: DestList) -> Vec<String> {
        let mut v: Vec<_> = list.iter().map(|c| c.to_string()).collect();
        v.sort();
        v
    }

    #[test]
    fn test_pinned_piece() {
        let mut b = fen("4k3/4r3/8/8/8/8/4B3/4K3 w - - 0 1").board;
        assert!(!is_move_safe(&mut b, c("e2"), c("d3"), Color::White));
        assert!(legal_moves(&mut b, c("e2"), None).is_empty());
    }

    #[test]
    fn test_king_cannot_step_into_check() {
        let mut b = fen("4k3/8/8/8/8/8/r7/4K3 w - - 0 1").board;
        assert_eq!(sorted(legal_moves(&mut b, c("e1"), None)), ["d1", "f1"]);
    }

    #[test]
    fn test_safe_check_leaves_board_intact() {
        let mut b = fen("4k3/4r3/8/8/8/8/4B3/R3K2R w KQ - 0 1").board;
        let copy = b.clone();
        for (src, dst) in [("e2", "d3"), ("e1", "d1"), ("e1", "f2"), ("a1", "a8"), ("e2", "e7")] {
            is_move_safe(&mut b, c(src), c(dst), Color::White);
            assert_eq!(b, copy);
        }
    }

    #[test]
    fn test_unsafe_king_move_keeps_moved_flag() {
        let mut b = fen("4k3/8/8/8/8/8/3r4/R3K3 w Q - 0 1").board;
        let king = b.get(c("e1")).unwrap();
        assert!(!king.has_moved());
        assert!(!is_move_safe(&mut b, c("e1"), c("e2"), Color::White));
        assert_eq!(b.get(c("e1")), Some(king));
        assert!(!b.get(c("e1")).unwrap().has_moved());
        // The king can still castle afterwards
        assert!(movegen::castling_dest(&b, &king, CastlingSide::Queen).is_some());
    }

    #[test]
    fn test_wrong_color_or_empty() {
        let mut b = Board::initial();
        assert!(!is_move_safe(&mut b, c("e7"), c("e5"), Color::White));
        assert!(!is_move_safe(&mut b, c("e4"), c("e5"), Color::White));
        assert!(legal_moves(&mut b, c("e4"), None).is_empty());
    }

    #[test]
    fn test_enpassant() {
        let f = fen("4k3/8/8/3Pp3/8/8/8/4K3 w - e6 0 1");
        let mut b = f.board;
        assert_eq!(sorted(legal_moves(&mut b, c("d5"), f.ep_target)), ["d6", "e6"]);
        assert_eq!(sorted(legal_moves(&mut b, c("d5"), None)), ["d6"]);
    }

    #[test]
    fn test_enpassant_exposing_king() {
        // Taking en passant removes both pawns from the fifth rank, opening it for the rook
        let f = fen("8/8/8/K2Pp2r/8/8/8/7k w - e6 0 1");
        let mut b = f.board;
        let copy = b.clone();
        assert!(!is_move_safe(&mut b, c("d5"), c("e6"), Color::White));
        assert_eq!(b, copy);
        assert_eq!(sorted(legal_moves(&mut b, c("d5"), f.ep_target)), ["d6"]);
    }

    #[test]
    fn test_castling_through_check() {
        // f1 is attacked
        let mut b = fen("4kr2/8/8/8/8/8/8/4K2R w K - 0 1").board;
        assert!(!legal_moves(&mut b, c("e1"), None).contains(&c("g1")));

        // King is in check
        let mut b = fen("4kr2/8/8/8/8/8/8/4K2R w K - 0 1").board;
        b.take(c("f8"));
        b.place(Piece::new(PieceKind::Rook, Color::Black, c("e7")));
        assert!(!legal_moves(&mut b, c("e1"), None).contains(&c("g1")));

        // Destination is attacked
        let mut b = fen("4k1r1/8/8/8/8/8/8/4K2R w K - 0 1").board;
        assert!(!legal_moves(&mut b, c("e1"), None).contains(&c("g1")));

        // b1 is attacked, but the king doesn't pass it
        let mut b = fen("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1").board;
        assert!(legal_moves(&mut b, c("e1"), None).contains(&c("c1")));

        // Pawn attacks an empty square on the path
        let mut b = fen("4k3/8/8/8/8/8/6p1/4K2R w K - 0 1").board;
        assert!(!legal_moves(&mut b, c("e1"), None).contains(&c("g1")));
    }

    #[test]
    fn test_has_legal_moves() {
        let mut b = Board::initial();
        assert!(has_legal_moves(&mut b, Color::White, None));

        let mut b = fen("7K/8/5n2/5n2/8/8/7k/8 w - - 0 1").board;
        assert!(!has_legal_moves(&mut b, Color::White, None));

        let mut b = fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3").board;
        assert!(!has_legal_moves(&mut b, Color::White, None));
        assert!(has_legal_moves(&mut b, Color::Black, None));
    }
}
