//! Attack and check detection

use crate::board::Board;
use crate::movegen;
use crate::types::{Color, Coord};

/// Returns `true` if the square `c` is attacked by any piece of the opponent of `defender`
pub fn is_square_attacked(b: &Board, c: Coord, defender: Color) -> bool {
    b.pieces(defender.inv())
        .any(|p| movegen::attacked_squares(b, &p).contains(&c))
}

/// Returns `true` if the king of color `c` is in check
///
/// If there is no king of color `c` on the board, the king is considered not in check.
pub fn is_king_in_check(b: &Board, c: Color) -> bool {
    match b.king_pos(c) {
        Some(king) => is_square_attacked(b, king, c),
        None => false,
    }
}
