//! # Tabiya
//!
//! Chess rules on a plain 64-slot board, with a bridge to an external UCI engine.
//!
//! The crate is organized bottom-up:
//!
//! - [`board`] stores the pieces;
//! - [`movegen`] produces pseudo-legal destinations of a single piece;
//! - [`attack`] answers whether a square is attacked and whether a king is in check;
//! - [`legal`] tries a move on the board, checks the king and reverts the move;
//! - [`game`] tracks the side to move, en passant, castling and promotion, and detects
//!   checkmate and stalemate;
//! - [`fen`] reads and writes positions;
//! - [`engine`] speaks the UCI text protocol, and [`session`] ties a game and an engine together.
//!
//! # Example
//!
//! ```
//! # use tabiya::{Game, Status, Color};
//! #
//! let mut game = Game::new_initial();
//! game.push_uci_list("f2f3 e7e5 g2g4 d8h4").unwrap();
//! assert_eq!(game.status(), Status::Checkmate { winner: Color::Black });
//! assert_eq!(game.as_fen(), "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 0 1");
//! ```

pub mod attack;
pub mod board;
pub mod engine;
pub mod fen;
pub mod game;
pub mod legal;
pub mod movegen;
pub mod moves;
pub mod session;
pub mod types;

pub use board::{Board, PrettyStyle};
pub use fen::Fen;
pub use game::Game;
pub use moves::{Move, MoveError, MoveKind};
pub use session::{Session, SessionOptions};
pub use types::{CastlingSide, Color, Coord, File, Piece, PieceKind, Rank, Status, StatusReport};
