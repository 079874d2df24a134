use serde::{Deserialize, Serialize};

pub const PLAYER_NONE: u8 = 0;
pub const PLAYER_BLACK: u8 = 1;
pub const PLAYER_WHITE: u8 = 2;

pub const CELL_EMPTY: u8 = 0;
pub const CELL_BLACK_MAN: u8 = 1;
pub const CELL_WHITE_MAN: u8 = 2;
pub const CELL_BLACK_KING: u8 = 3;
pub const CELL_WHITE_KING: u8 = 4;

/// Side of a piece or player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::Black, Color::White];

    pub fn opponent(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Row delta of a forward step. Black starts on top and moves down.
    pub fn forward(self) -> i32 {
        match self {
            Color::Black => 1,
            Color::White => -1,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Color::Black => "Black",
            Color::White => "White",
        }
    }

    pub fn to_player_code(self) -> u8 {
        match self {
            Color::Black => PLAYER_BLACK,
            Color::White => PLAYER_WHITE,
        }
    }

    pub fn from_player_code(code: u8) -> Option<Self> {
        match code {
            PLAYER_BLACK => Some(Color::Black),
            PLAYER_WHITE => Some(Color::White),
            _ => None,
        }
    }
}

/// A checkers piece. Crowning is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub crowned: bool,
}

impl Piece {
    pub fn man(color: Color) -> Self {
        Self {
            color,
            crowned: false,
        }
    }

    pub fn king(color: Color) -> Self {
        Self {
            color,
            crowned: true,
        }
    }

    pub fn cell_code(self) -> u8 {
        match (self.color, self.crowned) {
            (Color::Black, false) => CELL_BLACK_MAN,
            (Color::White, false) => CELL_WHITE_MAN,
            (Color::Black, true) => CELL_BLACK_KING,
            (Color::White, true) => CELL_WHITE_KING,
        }
    }
}

/// A board coordinate. `x` is the column, `y` the row counted from the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: u8,
    pub y: u8,
}

impl Position {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }
}

/// A single step of a turn.
///
/// A capture step removes exactly one piece; longer captures are chained
/// through the game state machine one step at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Position,
    pub to: Position,
    pub captured: Vec<Position>,
}

impl Move {
    pub fn simple(from: Position, to: Position) -> Self {
        Self {
            from,
            to,
            captured: Vec::new(),
        }
    }

    pub fn capture(from: Position, to: Position, captured: Position) -> Self {
        Self {
            from,
            to,
            captured: vec![captured],
        }
    }

    pub fn is_capture(&self) -> bool {
        !self.captured.is_empty()
    }

    pub(crate) fn connects(&self, from: Position, to: Position) -> bool {
        self.from == from && self.to == to
    }
}

/// Flat read model handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameView {
    pub width: u8,
    pub height: u8,
    /// Row-major cell codes, see the `CELL_*` constants.
    pub board: Vec<u8>,
    pub current_player: u8,
    pub black_count: u16,
    pub white_count: u16,
    pub black_move_count: u32,
    pub white_move_count: u32,
    pub is_game_over: bool,
    /// Contract:
    /// - `PLAYER_BLACK`/`PLAYER_WHITE` once a side has won.
    /// - `PLAYER_NONE` while playing and after a tie.
    pub winner: u8,
    pub is_tied: bool,
    /// `PLAYER_NONE` when no draw proposal is pending.
    pub draw_proposed_by: u8,
    /// Square of the piece that must continue a capture chain.
    pub capture_chain_at: Option<Position>,
    pub last_moved_to: Option<Position>,
    pub is_ai_turn: bool,
}
