use crate::error::{CheckersResult, GameError};
use crate::ruleset::Ruleset;
use crate::types::{CELL_EMPTY, Color, Piece, Position};

/// Checkers board: a `width x height` grid of optional pieces.
///
/// Only dark squares (`(x + y)` odd) are ever occupied. Cloning yields a fully
/// independent copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: u8,
    height: u8,
    cells: Vec<Option<Piece>>,
}

impl Board {
    /// Creates a board without pieces.
    pub fn empty(ruleset: &Ruleset) -> Self {
        let width = ruleset.width();
        let height = ruleset.height();
        Self {
            width,
            height,
            cells: vec![None; usize::from(width) * usize::from(height)],
        }
    }

    /// Creates the starting position: black fills the dark squares of the top
    /// `rows_per_player` rows, white the bottom ones.
    pub fn initial(ruleset: &Ruleset) -> CheckersResult<Self> {
        let rows = ruleset.rows_per_player();
        if rows < 1 {
            return Err(GameError::configuration(format!(
                "a {}-row board leaves no rows for the pieces",
                ruleset.height()
            )));
        }

        let mut board = Self::empty(ruleset);
        let height = board.height;
        for y in 0..height {
            let color = if y < rows {
                Color::Black
            } else if y >= height - rows {
                Color::White
            } else {
                continue;
            };
            for x in 0..board.width {
                if Self::is_dark(i32::from(x), i32::from(y)) {
                    board.put(Position::new(x, y), Some(Piece::man(color)));
                }
            }
        }
        Ok(board)
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// Returns whether `(x, y)` is a playable square color. Does not check bounds.
    pub fn is_dark(x: i32, y: i32) -> bool {
        (i64::from(x) + i64::from(y)).rem_euclid(2) == 1
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        (0..i32::from(self.width)).contains(&x) && (0..i32::from(self.height)).contains(&y)
    }

    /// Converts integer coordinates to an on-board position.
    pub fn position(&self, x: i32, y: i32) -> Option<Position> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some(Position::new(u8::try_from(x).ok()?, u8::try_from(y).ok()?))
    }

    /// Returns the piece at `(x, y)`; `None` for empty or off-board squares.
    pub fn get(&self, x: i32, y: i32) -> Option<Piece> {
        self.position(x, y).and_then(|pos| self.piece_at(pos))
    }

    pub fn piece_at(&self, pos: Position) -> Option<Piece> {
        self.cells.get(self.index(pos)).copied().flatten()
    }

    /// Places or clears a piece. Only dark on-board squares are accepted.
    pub fn set(&mut self, x: i32, y: i32, cell: Option<Piece>) -> CheckersResult<()> {
        let pos = self
            .position(x, y)
            .filter(|_| Self::is_dark(x, y))
            .ok_or(GameError::OutOfBounds { x, y })?;
        self.put(pos, cell);
        Ok(())
    }

    pub(crate) fn put(&mut self, pos: Position, cell: Option<Piece>) {
        let idx = self.index(pos);
        if let Some(slot) = self.cells.get_mut(idx) {
            *slot = cell;
        }
    }

    /// Moves `steps` squares from `pos` along `(dx, dy)`, if still on the board.
    pub(crate) fn step(&self, pos: Position, dx: i32, dy: i32, steps: i32) -> Option<Position> {
        self.position(
            i32::from(pos.x) + dx * steps,
            i32::from(pos.y) + dy * steps,
        )
    }

    /// Row on which pieces of `color` are crowned.
    pub fn crown_row(&self, color: Color) -> u8 {
        match color {
            Color::Black => self.height - 1,
            Color::White => 0,
        }
    }

    /// Iterates over occupied squares in row-major order.
    pub fn pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        let width = usize::from(self.width);
        self.cells.iter().enumerate().filter_map(move |(idx, cell)| {
            let piece = (*cell)?;
            // Indices are bounded by width * height, both u8.
            let pos = Position::new((idx % width) as u8, (idx / width) as u8);
            Some((pos, piece))
        })
    }

    pub fn count(&self, color: Color) -> u16 {
        self.pieces().filter(|(_, piece)| piece.color == color).count() as u16
    }

    /// Returns `(black_count, white_count)`.
    pub fn counts(&self) -> (u16, u16) {
        (self.count(Color::Black), self.count(Color::White))
    }

    /// Row-major cell codes, see the `CELL_*` constants.
    pub fn to_cells(&self) -> Vec<u8> {
        self.cells
            .iter()
            .map(|cell| cell.map_or(CELL_EMPTY, Piece::cell_code))
            .collect()
    }

    fn index(&self, pos: Position) -> usize {
        usize::from(pos.y) * usize::from(self.width) + usize::from(pos.x)
    }
}
