//! Flat, persistable form of a game.
//!
//! [`Snapshot`] derives serde for any structured format. [`Snapshot::encode`]
//! additionally produces a compact binary blob:
//!
//! | offset | size | field                         |
//! |--------|------|-------------------------------|
//! | 0      | 4    | magic `CKRS`                  |
//! | 4      | 4    | version (u32 LE)              |
//! | 8      | 4    | cell count (u32 LE)           |
//! | 12     | 4    | CRC32 of the payload (u32 LE) |
//! | 16     | 4    | reserved, zero                |
//! | 20     | ..   | payload                       |

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::SnapshotError;
use crate::game::{Game, GamePhase, MoveOutcome};
use crate::movegen;
use crate::ruleset::Ruleset;
use crate::types::{Color, Piece, Position};

const MAGIC: &[u8; 4] = b"CKRS";
const VERSION: u32 = 1;
const HEADER_SIZE: usize = 20;

const FLAG_BLACK_MOVES_FIRST: u8 = 1;
const FLAG_MUST_CAPTURE: u8 = 1 << 1;
const FLAG_CAPTURE_BACKWARDS: u8 = 1 << 2;
const FLAG_CAPTURE_BACKWARDS_IN_CHAIN: u8 = 1 << 3;
const FLAG_FLYING_KINGS: u8 = 1 << 4;
const KNOWN_FLAGS: u8 = (1 << 5) - 1;

/// One occupied square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRecord {
    pub x: u8,
    pub y: u8,
    pub color: Color,
    pub crowned: bool,
}

/// Everything needed to resume a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub ruleset: Ruleset,
    /// Occupied squares in row-major order.
    pub cells: Vec<CellRecord>,
    pub current_turn: Color,
    pub black_move_count: u32,
    pub white_move_count: u32,
    pub last_moved_to: Option<Position>,
    pub last_outcome: MoveOutcome,
    pub phase: GamePhase,
    /// Milliseconds since the Unix epoch.
    pub ended_at: Option<u64>,
    pub draw_proposed_by: Option<Color>,
}

impl Snapshot {
    pub(crate) fn capture(game: &Game) -> Self {
        Self {
            ruleset: *game.ruleset(),
            cells: game
                .board()
                .pieces()
                .map(|(pos, piece)| CellRecord {
                    x: pos.x,
                    y: pos.y,
                    color: piece.color,
                    crowned: piece.crowned,
                })
                .collect(),
            current_turn: game.current_turn(),
            black_move_count: game.move_count(Color::Black),
            white_move_count: game.move_count(Color::White),
            last_moved_to: game.last_moved_to(),
            last_outcome: game.last_outcome(),
            phase: game.phase(),
            ended_at: game.ended_at(),
            draw_proposed_by: game.draw_proposed_by(),
        }
    }

    pub fn winner(&self) -> Option<Color> {
        match self.phase {
            GamePhase::Won { winner } => Some(winner),
            _ => None,
        }
    }

    /// Rebuilds the board, rejecting cells that could never be occupied and
    /// capture chains that could not go on.
    pub fn to_board(&self) -> Result<Board, SnapshotError> {
        let mut board = Board::empty(&self.ruleset);
        for cell in &self.cells {
            let (x, y) = (i32::from(cell.x), i32::from(cell.y));
            if board.get(x, y).is_some() {
                return Err(SnapshotError::DuplicateCell {
                    x: cell.x,
                    y: cell.y,
                });
            }
            let piece = Piece {
                color: cell.color,
                crowned: cell.crowned,
            };
            board
                .set(x, y, Some(piece))
                .map_err(|_| SnapshotError::InvalidCell {
                    x: cell.x,
                    y: cell.y,
                    width: self.ruleset.width(),
                    height: self.ruleset.height(),
                })?;
        }

        if let GamePhase::MidMultiCapture { at } = self.phase {
            if board.piece_at(at).map(|piece| piece.color) != Some(self.current_turn) {
                return Err(SnapshotError::InconsistentPhase {
                    message: "capture chain square holds no piece of the side to move",
                });
            }
            if movegen::continuation_moves(&board, &self.ruleset, at).is_empty() {
                return Err(SnapshotError::InconsistentPhase {
                    message: "capture chain has no continuation",
                });
            }
        }
        Ok(board)
    }

    /// Serializes into the versioned, CRC-protected binary format.
    pub fn encode(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(32 + self.cells.len() * 3);
        payload.push(self.ruleset.width());
        payload.push(self.ruleset.height());
        payload.push(ruleset_flags(&self.ruleset));
        payload.push(self.current_turn.to_player_code());
        payload.extend_from_slice(&self.black_move_count.to_le_bytes());
        payload.extend_from_slice(&self.white_move_count.to_le_bytes());
        write_position(&mut payload, self.last_moved_to);
        payload.push(outcome_tag(self.last_outcome));
        match self.phase {
            GamePhase::AwaitingMove => payload.push(0),
            GamePhase::MidMultiCapture { at } => {
                payload.push(1);
                payload.extend_from_slice(&[at.x, at.y]);
            }
            GamePhase::Won { winner } => {
                payload.push(2);
                payload.push(winner.to_player_code());
            }
            GamePhase::Tied => payload.push(3),
        }
        match self.ended_at {
            None => payload.push(0),
            Some(millis) => {
                payload.push(1);
                payload.extend_from_slice(&millis.to_le_bytes());
            }
        }
        payload.push(self.draw_proposed_by.map_or(0, Color::to_player_code));
        for cell in &self.cells {
            let piece = Piece {
                color: cell.color,
                crowned: cell.crowned,
            };
            payload.extend_from_slice(&[cell.x, cell.y, piece.cell_code()]);
        }

        let crc = crc32fast::hash(&payload);
        let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&(self.cells.len() as u32).to_le_bytes());
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&payload);
        out
    }

    /// Parses data produced by [`Snapshot::encode`].
    pub fn decode(data: &[u8]) -> Result<Self, SnapshotError> {
        if data.len() < HEADER_SIZE {
            return Err(SnapshotError::TooShort {
                expected: HEADER_SIZE,
                actual: data.len(),
            });
        }
        if &data[0..4] != MAGIC {
            return Err(SnapshotError::BadMagic);
        }

        let mut header = Reader::new(&data[4..HEADER_SIZE]);
        let version = header.u32("version")?;
        if version != VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                expected: VERSION,
                actual: version,
            });
        }
        let num_cells = header.u32("cell count")? as usize;
        let expected_crc = header.u32("checksum")?;

        let payload = &data[HEADER_SIZE..];
        let actual_crc = crc32fast::hash(payload);
        if actual_crc != expected_crc {
            return Err(SnapshotError::CrcMismatch {
                expected: expected_crc,
                actual: actual_crc,
            });
        }

        let mut reader = Reader::new(payload);
        let width = reader.u8("ruleset")?;
        let height = reader.u8("ruleset")?;
        let flags = reader.u8("ruleset")?;
        if flags & !KNOWN_FLAGS != 0 {
            return Err(SnapshotError::InvalidTag {
                what: "ruleset flags",
                tag: flags,
            });
        }
        let ruleset = Ruleset::new(width, height)?
            .with_black_moves_first(flags & FLAG_BLACK_MOVES_FIRST != 0)
            .with_must_capture(flags & FLAG_MUST_CAPTURE != 0)
            .with_can_capture_backwards(flags & FLAG_CAPTURE_BACKWARDS != 0)
            .with_can_capture_backwards_during_multi_capture(
                flags & FLAG_CAPTURE_BACKWARDS_IN_CHAIN != 0,
            )
            .with_flying_kings(flags & FLAG_FLYING_KINGS != 0);

        let current_turn = read_color(&mut reader, "current turn")?;
        let black_move_count = reader.u32("move counters")?;
        let white_move_count = reader.u32("move counters")?;
        let last_moved_to = read_position(&mut reader)?;
        let last_outcome = outcome_from_tag(reader.u8("last outcome")?)?;
        let phase = match reader.u8("phase")? {
            0 => GamePhase::AwaitingMove,
            1 => GamePhase::MidMultiCapture {
                at: Position::new(reader.u8("phase")?, reader.u8("phase")?),
            },
            2 => GamePhase::Won {
                winner: read_color(&mut reader, "winner")?,
            },
            3 => GamePhase::Tied,
            tag => return Err(SnapshotError::InvalidTag { what: "phase", tag }),
        };
        let ended_at = match reader.u8("end time")? {
            0 => None,
            1 => Some(reader.u64("end time")?),
            tag => {
                return Err(SnapshotError::InvalidTag {
                    what: "end time",
                    tag,
                });
            }
        };
        let draw_proposed_by = match reader.u8("draw proposal")? {
            0 => None,
            code => Some(Color::from_player_code(code).ok_or(SnapshotError::InvalidTag {
                what: "draw proposal",
                tag: code,
            })?),
        };

        let mut cells = Vec::with_capacity(num_cells.min(payload.len() / 3));
        for _ in 0..num_cells {
            let x = reader.u8("cells")?;
            let y = reader.u8("cells")?;
            let code = reader.u8("cells")?;
            let (color, crowned) = match code {
                1 => (Color::Black, false),
                2 => (Color::White, false),
                3 => (Color::Black, true),
                4 => (Color::White, true),
                tag => return Err(SnapshotError::InvalidTag { what: "cell", tag }),
            };
            cells.push(CellRecord {
                x,
                y,
                color,
                crowned,
            });
        }

        if !reader.is_empty() {
            return Err(SnapshotError::TrailingBytes);
        }

        Ok(Self {
            ruleset,
            cells,
            current_turn,
            black_move_count,
            white_move_count,
            last_moved_to,
            last_outcome,
            phase,
            ended_at,
            draw_proposed_by,
        })
    }
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn take<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N], SnapshotError> {
        let end = self.offset + N;
        let bytes = self
            .data
            .get(self.offset..end)
            .ok_or(SnapshotError::UnexpectedEof { what })?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        self.offset = end;
        Ok(out)
    }

    fn u8(&mut self, what: &'static str) -> Result<u8, SnapshotError> {
        Ok(self.take::<1>(what)?[0])
    }

    fn u32(&mut self, what: &'static str) -> Result<u32, SnapshotError> {
        Ok(u32::from_le_bytes(self.take(what)?))
    }

    fn u64(&mut self, what: &'static str) -> Result<u64, SnapshotError> {
        Ok(u64::from_le_bytes(self.take(what)?))
    }

    fn is_empty(&self) -> bool {
        self.offset == self.data.len()
    }
}

fn ruleset_flags(ruleset: &Ruleset) -> u8 {
    [
        (ruleset.black_moves_first(), FLAG_BLACK_MOVES_FIRST),
        (ruleset.must_capture(), FLAG_MUST_CAPTURE),
        (ruleset.can_capture_backwards(), FLAG_CAPTURE_BACKWARDS),
        (
            ruleset.can_capture_backwards_during_multi_capture(),
            FLAG_CAPTURE_BACKWARDS_IN_CHAIN,
        ),
        (ruleset.flying_kings(), FLAG_FLYING_KINGS),
    ]
    .into_iter()
    .filter(|(enabled, _)| *enabled)
    .fold(0, |acc, (_, flag)| acc | flag)
}

fn write_position(out: &mut Vec<u8>, pos: Option<Position>) {
    match pos {
        None => out.push(0),
        Some(pos) => out.extend_from_slice(&[1, pos.x, pos.y]),
    }
}

fn read_position(reader: &mut Reader<'_>) -> Result<Option<Position>, SnapshotError> {
    match reader.u8("last move")? {
        0 => Ok(None),
        1 => Ok(Some(Position::new(
            reader.u8("last move")?,
            reader.u8("last move")?,
        ))),
        tag => Err(SnapshotError::InvalidTag {
            what: "last move",
            tag,
        }),
    }
}

fn read_color(reader: &mut Reader<'_>, what: &'static str) -> Result<Color, SnapshotError> {
    let code = reader.u8(what)?;
    Color::from_player_code(code).ok_or(SnapshotError::InvalidTag { what, tag: code })
}

const OUTCOMES: [MoveOutcome; 9] = [
    MoveOutcome::GameStarted,
    MoveOutcome::Moved,
    MoveOutcome::Captured,
    MoveOutcome::CaptureContinues,
    MoveOutcome::TurnEnded,
    MoveOutcome::Forfeited,
    MoveOutcome::DrawProposed,
    MoveOutcome::DrawAccepted,
    MoveOutcome::DrawRejected,
];

fn outcome_tag(outcome: MoveOutcome) -> u8 {
    OUTCOMES
        .iter()
        .position(|candidate| *candidate == outcome)
        .map_or(0, |idx| idx as u8)
}

fn outcome_from_tag(tag: u8) -> Result<MoveOutcome, SnapshotError> {
    OUTCOMES
        .get(usize::from(tag))
        .copied()
        .ok_or(SnapshotError::InvalidTag {
            what: "last outcome",
            tag,
        })
}
