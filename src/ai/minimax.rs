use std::time::Duration;

use rand::seq::SliceRandom;
use tracing::debug;
use web_time::Instant;

use crate::ai::MoveSelector;
use crate::game::Game;
use crate::types::{Color, Move};

const DEFAULT_TIMEOUT_MS: u64 = 500;
const DEFAULT_MAX_DEPTH: u8 = 12;
const OWN_PIECE_WEIGHT: f32 = 1.5;

/// Search budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Wall-clock budget for one move. The first ply is always searched.
    pub timeout: Duration,
    /// Deepest ply ever expanded.
    pub max_depth: u8,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Iterative-deepening minimax over an explicit game tree.
///
/// Every node holds its own forked [`Game`]. Each iteration widens every
/// unsettled leaf by one ply until the tree is settled, `max_depth` is
/// reached or the timeout fires; values computed so far are then used.
#[derive(Debug, Default, Clone, Copy)]
pub struct MinimaxSelector {
    options: SearchOptions,
}

impl MinimaxSelector {
    pub fn new() -> Self {
        Self::with_options(SearchOptions::default())
    }

    pub fn with_options(options: SearchOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> SearchOptions {
        self.options
    }
}

impl MoveSelector for MinimaxSelector {
    fn select_move(&self, game: &Game) -> Option<Move> {
        let mut moves = game.available_moves();
        if moves.len() <= 1 {
            return moves.pop();
        }

        let mut searcher = Searcher::new(game.current_turn(), self.options.timeout);
        let mut root = Node::new(None, game.fork(), 0.0);
        let depth = searcher.search(&mut root, self.options.max_depth);

        let mut children = root.children;
        children.shuffle(&mut rand::rng());
        let best = children
            .into_iter()
            .max_by(|a, b| a.value.total_cmp(&b.value))?;

        debug!(
            depth,
            nodes = searcher.nodes,
            timed_out = searcher.timed_out,
            score = best.value,
            "minimax search finished"
        );
        best.mv
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expansion {
    Complete,
    TimedOut,
}

struct Node {
    mv: Option<Move>,
    game: Game,
    value: f32,
    children: Vec<Node>,
    expanded: bool,
    /// Every branch below has reached a terminal state.
    settled: bool,
}

impl Node {
    fn new(mv: Option<Move>, game: Game, value: f32) -> Self {
        let settled = game.is_ended();
        Self {
            mv,
            game,
            value,
            children: Vec::new(),
            expanded: false,
            settled,
        }
    }
}

struct Searcher {
    root_color: Color,
    start_time: Instant,
    timeout: Duration,
    timed_out: bool,
    nodes: usize,
}

impl Searcher {
    fn new(root_color: Color, timeout: Duration) -> Self {
        Self {
            root_color,
            start_time: Instant::now(),
            timeout,
            timed_out: false,
            nodes: 0,
        }
    }

    /// Deepens `root` ply by ply and returns the depth reached.
    fn search(&mut self, root: &mut Node, max_depth: u8) -> u8 {
        self.start_time = Instant::now();
        self.timed_out = false;

        // Keep the first ply guaranteed by not checking the timeout there.
        self.deepen(root, false);
        let mut depth = 1;

        while depth < max_depth && !root.settled {
            match self.deepen(root, true) {
                Expansion::Complete => depth += 1,
                Expansion::TimedOut => break,
            }
        }
        depth
    }

    /// Adds one ply below every unsettled leaf of `node`.
    ///
    /// On timeout the node keeps what was fully built and its value reflects
    /// the children searched so far.
    fn deepen(&mut self, node: &mut Node, allow_timeout: bool) -> Expansion {
        if node.settled {
            return Expansion::Complete;
        }

        if !node.expanded {
            return self.expand(node, allow_timeout);
        }

        let mut result = Expansion::Complete;
        for child in &mut node.children {
            if self.deepen(child, allow_timeout) == Expansion::TimedOut {
                result = Expansion::TimedOut;
                break;
            }
        }
        node.settled = node.children.iter().all(|child| child.settled);
        node.value = self.backup(node);
        result
    }

    fn expand(&mut self, node: &mut Node, allow_timeout: bool) -> Expansion {
        let moves = node.game.available_moves();
        let mut children = Vec::with_capacity(moves.len());
        for mv in moves {
            if allow_timeout && self.start_time.elapsed() >= self.timeout {
                self.timed_out = true;
                return Expansion::TimedOut;
            }
            let mut next = node.game.fork();
            next.apply_move(&mv);
            let value = self.evaluate(&next);
            children.push(Node::new(Some(mv), next, value));
            self.nodes += 1;
        }

        // Most promising first for the side choosing at this node.
        if self.is_maximizing(&node.game) {
            children.sort_by(|a, b| b.value.total_cmp(&a.value));
        } else {
            children.sort_by(|a, b| a.value.total_cmp(&b.value));
        }

        node.children = children;
        node.expanded = true;
        node.settled = node.children.iter().all(|child| child.settled);
        node.value = self.backup(node);
        Expansion::Complete
    }

    fn is_maximizing(&self, game: &Game) -> bool {
        game.current_turn() == self.root_color
    }

    fn backup(&self, node: &Node) -> f32 {
        let values = node.children.iter().map(|child| child.value);
        let best = if self.is_maximizing(&node.game) {
            values.max_by(f32::total_cmp)
        } else {
            values.min_by(f32::total_cmp)
        };
        best.unwrap_or(node.value)
    }

    /// Material balance from the searching side's point of view.
    fn evaluate(&self, game: &Game) -> f32 {
        let own = f32::from(game.board().count(self.root_color));
        let opponent = f32::from(game.board().count(self.root_color.opponent()));
        own * OWN_PIECE_WEIGHT - opponent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::ruleset::Ruleset;
    use crate::types::{Piece, Position};

    fn game_with(ruleset: Ruleset, turn: Color, pieces: &[(i32, i32, Piece)]) -> Game {
        let mut board = Board::empty(&ruleset);
        for &(x, y, piece) in pieces {
            board.set(x, y, Some(piece)).unwrap();
        }
        Game::from_board(ruleset, board, turn).unwrap()
    }

    #[test]
    fn takes_the_only_capture_on_a_near_empty_board() {
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

        let mv = MinimaxSelector::new().select_move(&game).unwrap();

        assert_eq!(
            mv,
            Move::capture(Position::new(1, 2), Position::new(3, 4), Position::new(2, 3))
        );
    }

    #[test]
    fn avoids_stepping_into_a_capture() {
        // Stepping to (4, 3) lets White (5, 4) jump back onto (3, 2).
        let game = game_with(
            Ruleset::classic().with_must_capture(false),
            Color::Black,
            &[
                (3, 2, Piece::man(Color::Black)),
                (5, 4, Piece::man(Color::White)),
                (0, 7, Piece::man(Color::White)),
            ],
        );

        let selector = MinimaxSelector::with_options(SearchOptions {
            timeout: Duration::from_secs(5),
            max_depth: 2,
        });
        for _ in 0..10 {
            let mv = selector.select_move(&game).unwrap();
            assert_eq!(mv.to, Position::new(2, 3));
        }
    }

    #[test]
    fn zero_timeout_still_returns_a_legal_move() {
        let game = Game::new(Ruleset::classic()).unwrap();
        let selector = MinimaxSelector::with_options(SearchOptions {
            timeout: Duration::ZERO,
            max_depth: DEFAULT_MAX_DEPTH,
        });

        let mv = selector.select_move(&game).unwrap();

        assert!(game.available_moves().contains(&mv));
    }

    #[test]
    fn timeout_keeps_partially_deepened_tree_consistent() {
        let game = Game::new(Ruleset::classic()).unwrap();
        let mut searcher = Searcher::new(Color::Black, Duration::from_millis(20));
        let mut root = Node::new(None, game.fork(), 0.0);

        searcher.search(&mut root, u8::MAX);

        assert_eq!(root.children.len(), 7);
        assert!(root.children.iter().all(|child| child.game.history().is_empty()));
        let best = root
            .children
            .iter()
            .map(|child| child.value)
            .max_by(f32::total_cmp)
            .unwrap();
        assert_eq!(root.value, best);
    }

    #[test]
    fn settled_tree_stops_early() {
        let game = game_with(
            Ruleset::classic(),
            Color::Black,
            &[
                (1, 2, Piece::man(Color::Black)),
                (2, 3, Piece::man(Color::White)),
            ],
        );
        let mut searcher = Searcher::new(Color::Black, Duration::from_secs(5));
        let mut root = Node::new(None, game.fork(), 0.0);

        let depth = searcher.search(&mut root, DEFAULT_MAX_DEPTH);

        assert_eq!(depth, 1);
        assert!(root.settled);
        assert_eq!(root.value, 1.5);
    }

    #[test]
    fn returns_none_without_moves() {
        let mut game = Game::new(Ruleset::classic()).unwrap();
        game.forfeit(Color::White).unwrap();
        assert_eq!(MinimaxSelector::new().select_move(&game), None);
    }
}
