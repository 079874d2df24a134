use rand::seq::IndexedRandom;

use crate::ai::MoveSelector;
use crate::game::Game;
use crate::types::Move;

/// Plays a uniformly random legal move.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSelector;

impl MoveSelector for RandomSelector {
    fn select_move(&self, game: &Game) -> Option<Move> {
        game.available_moves().choose(&mut rand::rng()).cloned()
    }
}
