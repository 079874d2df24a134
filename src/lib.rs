use wasm_bindgen::prelude::*;

pub mod ai;
pub mod api;
pub mod board;
pub mod error;
pub mod game;
pub mod movegen;
pub mod ruleset;
pub mod snapshot;
pub mod types;

pub use ai::{MoveSelector, Player, Players};
pub use board::Board;
pub use error::{CheckersResult, GameError, SnapshotError};
pub use game::{Game, GamePhase, MoveOutcome};
pub use ruleset::Ruleset;
pub use snapshot::Snapshot;
pub use types::{Color, GameView, Move, Piece, Position};

#[wasm_bindgen]
pub fn wasm_ready() -> bool {
    true
}
