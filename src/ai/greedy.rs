use rand::seq::SliceRandom;

use crate::ai::MoveSelector;
use crate::board::Board;
use crate::game::Game;
use crate::movegen;
use crate::types::Move;

/// One-ply heuristic: prefers captures, then crowning.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedySelector;

impl GreedySelector {
    /// Static score of a single move. Captured pieces weigh twice a crowning.
    pub fn score(board: &Board, mv: &Move) -> u32 {
        let captured = u32::try_from(mv.captured.len()).unwrap_or(u32::MAX);
        captured.saturating_mul(2) + u32::from(movegen::promotes(board, mv))
    }
}

impl MoveSelector for GreedySelector {
    fn select_move(&self, game: &Game) -> Option<Move> {
        let mut moves = game.available_moves();
        // Shuffled so that ties are broken uniformly.
        moves.shuffle(&mut rand::rng());
        moves
            .into_iter()
            .max_by_key(|mv| Self::score(game.board(), mv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ruleset::Ruleset;
    use crate::types::{Color, Piece, Position};

    fn game_with(ruleset: Ruleset, turn: Color, pieces: &[(i32, i32, Piece)]) -> Game {
        let mut board = Board::empty(&ruleset);
        for &(x, y, piece) in pieces {
            board.set(x, y, Some(piece)).unwrap();
        }
        Game::from_board(ruleset, board, turn).unwrap()
    }

    #[test]
    fn prefers_capture_when_captures_are_optional() {
        let game = game_with(
            Ruleset::classic().with_must_capture(false),
            Color::Black,
            &[
                (1, 2, Piece::man(Color::Black)),
                (2, 3, Piece::man(Color::White)),
                (5, 0, Piece::man(Color::Black)),
            ],
        );
        assert!(game.available_moves().len() > 1);

        for _ in 0..20 {
            let mv = GreedySelector.select_move(&game).unwrap();
            assert_eq!(mv.captured, vec![Position::new(2, 3)]);
        }
    }

    #[test]
    fn prefers_crowning_over_plain_steps() {
        let game = game_with(
            Ruleset::classic(),
            Color::Black,
            &[
                (1, 6, Piece::man(Color::Black)),
                (5, 0, Piece::man(Color::Black)),
                (6, 7, Piece::man(Color::White)),
            ],
        );

        for _ in 0..20 {
            let mv = GreedySelector.select_move(&game).unwrap();
            assert_eq!(mv.from, Position::new(1, 6));
            assert_eq!(mv.to.y, 7);
        }
    }

    #[test]
    fn breaks_ties_among_equal_scores() {
        let game = Game::new(Ruleset::classic()).unwrap();
        let mut seen = Vec::new();
        for _ in 0..300 {
            let mv = GreedySelector.select_move(&game).unwrap();
            assert_eq!(GreedySelector::score(game.board(), &mv), 0);
            if !seen.contains(&mv) {
                seen.push(mv);
            }
        }
        assert!(seen.len() > 1);
    }
}
