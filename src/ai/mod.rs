//! Computer opponents.
//!
//! Every strategy only sees the public contract of [`Game`]: it reads the
//! legal moves and works on clones, never on the live board.

use serde::{Deserialize, Serialize};

use crate::game::Game;
use crate::types::{Color, Move};

pub mod greedy;
pub mod minimax;
pub mod random;

pub use greedy::GreedySelector;
pub use minimax::{MinimaxSelector, SearchOptions};
pub use random::RandomSelector;

pub trait MoveSelector: Send + Sync {
    /// Picks one of the legal moves of the side to act, or `None` when there
    /// is nothing to play.
    fn select_move(&self, game: &Game) -> Option<Move>;
}

/// Who controls one side of the board.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Player {
    #[default]
    Human,
    Random,
    Greedy,
    Minimax,
}

impl Player {
    pub fn is_ai(self) -> bool {
        self != Player::Human
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Player::Human => "Human",
            Player::Random => "Random AI",
            Player::Greedy => "Greedy AI",
            Player::Minimax => "Minimax AI",
        }
    }

    /// Strategy driving this player; `None` for humans.
    pub fn selector(self) -> Option<Box<dyn MoveSelector>> {
        match self {
            Player::Human => None,
            Player::Random => Some(Box::new(RandomSelector)),
            Player::Greedy => Some(Box::new(GreedySelector)),
            Player::Minimax => Some(Box::new(MinimaxSelector::new())),
        }
    }
}

/// Player assignment for both colors.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Players {
    pub black: Player,
    pub white: Player,
}

impl Players {
    pub fn new(black: Player, white: Player) -> Self {
        Self { black, white }
    }

    pub fn get(&self, color: Color) -> Player {
        match color {
            Color::Black => self.black,
            Color::White => self.white,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_humans_have_no_selector() {
        assert!(Player::Human.selector().is_none());
        assert!(!Player::Human.is_ai());
        for player in [Player::Random, Player::Greedy, Player::Minimax] {
            assert!(player.is_ai());
            assert!(player.selector().is_some());
        }
    }

    #[test]
    fn players_are_looked_up_by_color() {
        let players = Players::new(Player::Human, Player::Greedy);
        assert_eq!(players.get(Color::Black), Player::Human);
        assert_eq!(players.get(Color::White).display_name(), "Greedy AI");
    }
}
