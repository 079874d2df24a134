use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use web_time::{SystemTime, UNIX_EPOCH};

use crate::ai::{MoveSelector, Players};
use crate::board::Board;
use crate::error::{CheckersResult, GameError, SnapshotError};
use crate::movegen;
use crate::ruleset::Ruleset;
use crate::snapshot::Snapshot;
use crate::types::{Color, GameView, Move, PLAYER_NONE, Position};

/// Where the game stands. `Won` and `Tied` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    AwaitingMove,
    /// The piece on `at` has just captured and must (or, without forced
    /// captures, may) keep capturing.
    MidMultiCapture { at: Position },
    Won { winner: Color },
    Tied,
}

impl GamePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::Won { .. } | GamePhase::Tied)
    }
}

/// What the last state-changing action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveOutcome {
    GameStarted,
    Moved,
    Captured,
    CaptureContinues,
    TurnEnded,
    Forfeited,
    DrawProposed,
    DrawAccepted,
    DrawRejected,
}

/// Checkers game state machine.
///
/// Owns the only live board of a game. Every state-changing action appends a
/// [`Snapshot`] to the history.
#[derive(Debug, Clone)]
pub struct Game {
    ruleset: Ruleset,
    board: Board,
    phase: GamePhase,
    current_turn: Color,
    black_move_count: u32,
    white_move_count: u32,
    last_moved_to: Option<Position>,
    last_outcome: MoveOutcome,
    draw_proposed_by: Option<Color>,
    ended_at: Option<u64>,
    players: Players,
    history: Vec<Snapshot>,
    record_history: bool,
}

impl Game {
    /// Starts a game between two humans from the initial position.
    pub fn new(ruleset: Ruleset) -> CheckersResult<Self> {
        Self::with_players(ruleset, Players::default())
    }

    pub fn with_players(ruleset: Ruleset, players: Players) -> CheckersResult<Self> {
        let board = Board::initial(&ruleset)?;
        let first = if ruleset.black_moves_first() {
            Color::Black
        } else {
            Color::White
        };
        Ok(Self::start(ruleset, board, first, players))
    }

    /// Starts a game from a custom position with `turn` to move.
    pub fn from_board(ruleset: Ruleset, board: Board, turn: Color) -> CheckersResult<Self> {
        if (board.width(), board.height()) != (ruleset.width(), ruleset.height()) {
            return Err(GameError::configuration(format!(
                "board is {}x{} but the ruleset requires {}x{}",
                board.width(),
                board.height(),
                ruleset.width(),
                ruleset.height()
            )));
        }
        Ok(Self::start(ruleset, board, turn, Players::default()))
    }

    fn start(ruleset: Ruleset, board: Board, turn: Color, players: Players) -> Self {
        let mut game = Self {
            ruleset,
            board,
            phase: GamePhase::AwaitingMove,
            current_turn: turn,
            black_move_count: 0,
            white_move_count: 0,
            last_moved_to: None,
            last_outcome: MoveOutcome::GameStarted,
            draw_proposed_by: None,
            ended_at: None,
            players,
            history: Vec::new(),
            record_history: true,
        };
        game.detect_loss();
        game.record();
        game
    }

    /// Resumes a game saved with [`Game::snapshot`]. Players default to humans
    /// and the history restarts from the snapshot.
    ///
    /// If the side to move has no legal moves the game ends on restore and one
    /// history entry is appended. `last_outcome` keeps the saved action, the
    /// same way a loss detected after a move keeps `Moved` or `Captured`.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self, SnapshotError> {
        let board = snapshot.to_board()?;
        let mut game = Self::restore(snapshot, board);
        game.detect_loss();
        if game.phase != snapshot.phase {
            game.record();
        }
        Ok(game)
    }

    fn restore(snapshot: &Snapshot, board: Board) -> Self {
        Self {
            ruleset: snapshot.ruleset,
            board,
            phase: snapshot.phase,
            current_turn: snapshot.current_turn,
            black_move_count: snapshot.black_move_count,
            white_move_count: snapshot.white_move_count,
            last_moved_to: snapshot.last_moved_to,
            last_outcome: snapshot.last_outcome,
            draw_proposed_by: snapshot.draw_proposed_by,
            ended_at: snapshot.ended_at,
            players: Players::default(),
            history: vec![snapshot.clone()],
            record_history: true,
        }
    }

    /// Copy for hypothetical play: same state, no history.
    pub(crate) fn fork(&self) -> Self {
        Self {
            ruleset: self.ruleset,
            board: self.board.clone(),
            phase: self.phase,
            current_turn: self.current_turn,
            black_move_count: self.black_move_count,
            white_move_count: self.white_move_count,
            last_moved_to: self.last_moved_to,
            last_outcome: self.last_outcome,
            draw_proposed_by: self.draw_proposed_by,
            ended_at: self.ended_at,
            players: self.players,
            history: Vec::new(),
            record_history: false,
        }
    }

    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn width(&self) -> u8 {
        self.board.width()
    }

    pub fn height(&self) -> u8 {
        self.board.height()
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn current_turn(&self) -> Color {
        self.current_turn
    }

    pub fn move_count(&self, color: Color) -> u32 {
        match color {
            Color::Black => self.black_move_count,
            Color::White => self.white_move_count,
        }
    }

    pub fn last_moved_to(&self) -> Option<Position> {
        self.last_moved_to
    }

    pub fn last_outcome(&self) -> MoveOutcome {
        self.last_outcome
    }

    /// Milliseconds since the Unix epoch at which the game ended.
    pub fn ended_at(&self) -> Option<u64> {
        self.ended_at
    }

    pub fn is_ended(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn winner(&self) -> Option<Color> {
        match self.phase {
            GamePhase::Won { winner } => Some(winner),
            _ => None,
        }
    }

    pub fn is_tied(&self) -> bool {
        self.phase == GamePhase::Tied
    }

    pub fn draw_proposed_by(&self) -> Option<Color> {
        self.draw_proposed_by
    }

    /// `true` while a draw proposal waits for the other side's answer.
    pub fn draw_resolution_expected(&self) -> bool {
        !self.is_ended() && self.draw_proposed_by.is_some()
    }

    pub fn players(&self) -> Players {
        self.players
    }

    pub fn set_players(&mut self, players: Players) {
        self.players = players;
    }

    /// Whether the side expected to act next is an AI. While a draw proposal
    /// is pending that is the side that has to answer it.
    pub fn is_ai_turn(&self) -> bool {
        !self.is_ended() && self.players.get(self.expected_actor()).is_ai()
    }

    /// Snapshots appended so far, oldest first.
    pub fn history(&self) -> &[Snapshot] {
        &self.history
    }

    /// Legal moves of the side to act. During a capture chain only the
    /// continuations of the capturing piece are returned.
    pub fn available_moves(&self) -> Vec<Move> {
        match self.phase {
            GamePhase::AwaitingMove => {
                movegen::available_moves(&self.board, &self.ruleset, self.current_turn)
            }
            GamePhase::MidMultiCapture { at } => {
                movegen::continuation_moves(&self.board, &self.ruleset, at)
            }
            GamePhase::Won { .. } | GamePhase::Tied => Vec::new(),
        }
    }

    pub fn is_move_valid(&self, from_x: i32, from_y: i32, to_x: i32, to_y: i32) -> bool {
        self.find_move(from_x, from_y, to_x, to_y).is_some()
    }

    pub fn is_piece_movable(&self, color: Color, x: i32, y: i32) -> bool {
        let Some(pos) = self.board.position(x, y) else {
            return false;
        };
        color == self.current_turn && self.available_moves().iter().any(|mv| mv.from == pos)
    }

    /// Plays one move (or one capture step) for the side to act.
    pub fn make_move(
        &mut self,
        from_x: i32,
        from_y: i32,
        to_x: i32,
        to_y: i32,
    ) -> CheckersResult<MoveOutcome> {
        self.ensure_accepting_moves()?;
        let mv = self
            .find_move(from_x, from_y, to_x, to_y)
            .ok_or(GameError::IllegalMove {
                from_x,
                from_y,
                to_x,
                to_y,
            })?;
        Ok(self.apply_move(&mv))
    }

    /// Asks the strategy configured for the side to act and plays its move.
    ///
    /// With a draw proposal pending, an AI on the answering side resolves it
    /// instead: it accepts unless it has more pieces than the proposer.
    pub fn do_ai_move(&mut self) -> CheckersResult<MoveOutcome> {
        self.ensure_not_ended()?;
        if let Some(proposer) = self.draw_proposed_by {
            let responder = proposer.opponent();
            if !self.players.get(responder).is_ai() {
                return Err(GameError::illegal_state(
                    "a draw proposal must be resolved first",
                ));
            }
            return self.answer_draw(responder, proposer);
        }
        let selector = self
            .players
            .get(self.current_turn)
            .selector()
            .ok_or_else(|| GameError::illegal_state("it is not AI's turn"))?;
        self.play_selected(selector.as_ref())
    }

    /// Plays the move chosen by `selector`, rejecting anything not legal.
    pub fn play_selected(&mut self, selector: &dyn MoveSelector) -> CheckersResult<MoveOutcome> {
        self.ensure_accepting_moves()?;
        let legal = self.available_moves();
        if legal.is_empty() {
            return Err(GameError::illegal_state("no legal moves to select from"));
        }

        let selected = selector
            .select_move(self)
            .ok_or_else(|| GameError::illegal_state("AI could not select a move"))?;
        if !legal.contains(&selected) {
            return Err(GameError::IllegalMove {
                from_x: i32::from(selected.from.x),
                from_y: i32::from(selected.from.y),
                to_x: i32::from(selected.to.x),
                to_y: i32::from(selected.to.y),
            });
        }
        Ok(self.apply_move(&selected))
    }

    /// Ends an optional capture chain early. Only possible when captures are
    /// not forced.
    pub fn end_turn(&mut self) -> CheckersResult<()> {
        self.ensure_accepting_moves()?;
        match self.phase {
            GamePhase::MidMultiCapture { .. } if !self.ruleset.must_capture() => {}
            GamePhase::MidMultiCapture { .. } => {
                return Err(GameError::illegal_state(
                    "the capture chain must be completed",
                ));
            }
            _ => return Err(GameError::illegal_state("no capture chain to end")),
        }

        self.last_outcome = MoveOutcome::TurnEnded;
        self.pass_turn();
        self.record();
        Ok(())
    }

    pub fn propose_draw(&mut self, color: Color) -> CheckersResult<()> {
        self.ensure_not_ended()?;
        if let Some(proposer) = self.draw_proposed_by {
            return Err(GameError::invalid_state(format!(
                "{} already proposed a draw",
                proposer.display_name()
            )));
        }

        debug!(color = color.display_name(), "draw proposed");
        self.draw_proposed_by = Some(color);
        self.last_outcome = MoveOutcome::DrawProposed;
        self.record();
        Ok(())
    }

    pub fn accept_draw(&mut self, color: Color) -> CheckersResult<()> {
        self.ensure_not_ended()?;
        self.pending_proposal_for(color)?;

        self.last_outcome = MoveOutcome::DrawAccepted;
        self.finish(GamePhase::Tied);
        self.record();
        Ok(())
    }

    pub fn reject_draw(&mut self, color: Color) -> CheckersResult<()> {
        self.ensure_not_ended()?;
        self.pending_proposal_for(color)?;

        debug!(color = color.display_name(), "draw rejected");
        self.draw_proposed_by = None;
        self.last_outcome = MoveOutcome::DrawRejected;
        self.record();
        Ok(())
    }

    /// `color` gives up; the opponent wins immediately.
    pub fn forfeit(&mut self, color: Color) -> CheckersResult<()> {
        self.ensure_not_ended()?;

        self.last_outcome = MoveOutcome::Forfeited;
        self.finish(GamePhase::Won {
            winner: color.opponent(),
        });
        self.record();
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }

    /// Flat read model for rendering.
    pub fn view(&self) -> GameView {
        let (black_count, white_count) = self.board.counts();
        GameView {
            width: self.width(),
            height: self.height(),
            board: self.board.to_cells(),
            current_player: self.current_turn.to_player_code(),
            black_count,
            white_count,
            black_move_count: self.black_move_count,
            white_move_count: self.white_move_count,
            is_game_over: self.is_ended(),
            winner: self.winner().map_or(PLAYER_NONE, Color::to_player_code),
            is_tied: self.is_tied(),
            draw_proposed_by: self
                .draw_proposed_by
                .map_or(PLAYER_NONE, Color::to_player_code),
            capture_chain_at: match self.phase {
                GamePhase::MidMultiCapture { at } => Some(at),
                _ => None,
            },
            last_moved_to: self.last_moved_to,
            is_ai_turn: self.is_ai_turn(),
        }
    }

    /// Applies a move taken from [`Game::available_moves`].
    pub(crate) fn apply_move(&mut self, mv: &Move) -> MoveOutcome {
        let mover = self.current_turn;
        let crowned = movegen::apply(&mut self.board, mv);
        self.last_moved_to = Some(mv.to);

        let continues = mv.is_capture()
            && !movegen::continuation_moves(&self.board, &self.ruleset, mv.to).is_empty();
        if continues {
            debug!(
                color = mover.display_name(),
                x = mv.to.x,
                y = mv.to.y,
                crowned,
                "capture chain continues"
            );
            self.phase = GamePhase::MidMultiCapture { at: mv.to };
            self.last_outcome = MoveOutcome::CaptureContinues;
        } else {
            debug!(
                color = mover.display_name(),
                from_x = mv.from.x,
                from_y = mv.from.y,
                to_x = mv.to.x,
                to_y = mv.to.y,
                captured = mv.captured.len(),
                crowned,
                "move applied"
            );
            self.last_outcome = if mv.is_capture() {
                MoveOutcome::Captured
            } else {
                MoveOutcome::Moved
            };
            self.pass_turn();
        }

        self.record();
        self.last_outcome
    }

    fn answer_draw(&mut self, responder: Color, proposer: Color) -> CheckersResult<MoveOutcome> {
        if self.board.count(responder) > self.board.count(proposer) {
            self.reject_draw(responder)?;
        } else {
            self.accept_draw(responder)?;
        }
        Ok(self.last_outcome)
    }

    fn expected_actor(&self) -> Color {
        self.draw_proposed_by.map_or(self.current_turn, Color::opponent)
    }

    fn find_move(&self, from_x: i32, from_y: i32, to_x: i32, to_y: i32) -> Option<Move> {
        let from = self.board.position(from_x, from_y)?;
        let to = self.board.position(to_x, to_y)?;
        self.available_moves()
            .into_iter()
            .find(|mv| mv.connects(from, to))
    }

    fn pass_turn(&mut self) {
        match self.current_turn {
            Color::Black => self.black_move_count += 1,
            Color::White => self.white_move_count += 1,
        }
        self.current_turn = self.current_turn.opponent();
        self.phase = GamePhase::AwaitingMove;
        self.detect_loss();
    }

    /// A side without legal moves on its turn has lost.
    fn detect_loss(&mut self) {
        if self.phase == GamePhase::AwaitingMove && self.available_moves().is_empty() {
            self.finish(GamePhase::Won {
                winner: self.current_turn.opponent(),
            });
        }
    }

    fn finish(&mut self, phase: GamePhase) {
        self.phase = phase;
        self.draw_proposed_by = None;
        self.ended_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));

        if self.record_history {
            match phase {
                GamePhase::Won { winner } => info!(
                    winner = winner.display_name(),
                    black_moves = self.black_move_count,
                    white_moves = self.white_move_count,
                    "game won"
                ),
                _ => info!(
                    black_moves = self.black_move_count,
                    white_moves = self.white_move_count,
                    "game tied"
                ),
            }
        }
    }

    fn record(&mut self) {
        if self.record_history {
            let snapshot = self.snapshot();
            self.history.push(snapshot);
        }
    }

    fn ensure_not_ended(&self) -> CheckersResult<()> {
        if self.is_ended() {
            return Err(GameError::illegal_state("game is already over"));
        }
        Ok(())
    }

    fn ensure_accepting_moves(&self) -> CheckersResult<()> {
        self.ensure_not_ended()?;
        if self.draw_proposed_by.is_some() {
            return Err(GameError::illegal_state(
                "a draw proposal must be resolved first",
            ));
        }
        Ok(())
    }

    fn pending_proposal_for(&self, color: Color) -> CheckersResult<Color> {
        match self.draw_proposed_by {
            None => Err(GameError::invalid_state("no draw proposal is pending")),
            Some(proposer) if proposer == color => Err(GameError::invalid_state(format!(
                "{} cannot resolve its own draw proposal",
                color.display_name()
            ))),
            Some(proposer) => Ok(proposer),
        }
    }
}
