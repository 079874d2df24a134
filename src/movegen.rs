//! Legal move generation.
//!
//! Everything here is a pure function of a board and a ruleset. Malformed
//! coordinates are never an error: they simply have no legal moves.

use crate::board::Board;
use crate::ruleset::Ruleset;
use crate::types::{Color, Move, Piece, Position};

const DIAGONALS: [(i32, i32); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

/// Returns every legal move of `color` at the start of a turn.
///
/// When captures are mandatory and any piece can capture, only captures are
/// returned. Otherwise captures come first, followed by simple moves.
pub fn available_moves(board: &Board, ruleset: &Ruleset, color: Color) -> Vec<Move> {
    let mut captures = Vec::new();
    let mut simple = Vec::new();

    for (pos, piece) in board.pieces().filter(|(_, piece)| piece.color == color) {
        collect_captures(board, ruleset, pos, piece, false, &mut captures);
        collect_simple_moves(board, ruleset, pos, piece, &mut simple);
    }

    if ruleset.must_capture() && !captures.is_empty() {
        return captures;
    }
    captures.extend(simple);
    captures
}

/// Returns the captures available to the piece on `at` in the middle of a
/// capture chain.
pub fn continuation_moves(board: &Board, ruleset: &Ruleset, at: Position) -> Vec<Move> {
    let mut out = Vec::new();
    if let Some(piece) = board.piece_at(at) {
        collect_captures(board, ruleset, at, piece, true, &mut out);
    }
    out
}

/// Returns whether any piece of `color` can capture right now.
pub fn has_any_capture(board: &Board, ruleset: &Ruleset, color: Color) -> bool {
    let mut out = Vec::new();
    board
        .pieces()
        .filter(|(_, piece)| piece.color == color)
        .any(|(pos, piece)| {
            out.clear();
            collect_captures(board, ruleset, pos, piece, false, &mut out);
            !out.is_empty()
        })
}

/// Checks a move of `color` at the start of a turn. Total over all integers.
pub fn is_move_valid(
    board: &Board,
    ruleset: &Ruleset,
    color: Color,
    from_x: i32,
    from_y: i32,
    to_x: i32,
    to_y: i32,
) -> bool {
    let (Some(from), Some(to)) = (board.position(from_x, from_y), board.position(to_x, to_y))
    else {
        return false;
    };
    if board.piece_at(from).is_none_or(|piece| piece.color != color)
        || board.piece_at(to).is_some()
    {
        return false;
    }

    available_moves(board, ruleset, color)
        .iter()
        .any(|mv| mv.connects(from, to))
}

/// Returns whether the piece of `color` on `(x, y)` has a legal move this turn.
pub fn is_piece_movable(board: &Board, ruleset: &Ruleset, color: Color, x: i32, y: i32) -> bool {
    let Some(pos) = board.position(x, y) else {
        return false;
    };
    available_moves(board, ruleset, color)
        .iter()
        .any(|mv| mv.from == pos)
}

/// Returns whether `mv` lands an uncrowned piece on its crowning row.
pub fn promotes(board: &Board, mv: &Move) -> bool {
    board
        .piece_at(mv.from)
        .is_some_and(|piece| !piece.crowned && mv.to.y == board.crown_row(piece.color))
}

/// Applies a move already known to be legal: relocates the piece, removes
/// captured pieces and crowns on the last row. Returns whether it crowned.
pub(crate) fn apply(board: &mut Board, mv: &Move) -> bool {
    let Some(mut piece) = board.piece_at(mv.from) else {
        return false;
    };
    for &captured in &mv.captured {
        board.put(captured, None);
    }
    board.put(mv.from, None);

    let crowned = !piece.crowned && mv.to.y == board.crown_row(piece.color);
    piece.crowned |= crowned;
    board.put(mv.to, Some(piece));
    crowned
}

fn flies(ruleset: &Ruleset, piece: Piece) -> bool {
    piece.crowned && ruleset.flying_kings()
}

fn may_capture_towards(ruleset: &Ruleset, piece: Piece, dy: i32, in_chain: bool) -> bool {
    piece.crowned
        || dy == piece.color.forward()
        || ruleset.can_capture_backwards()
        || (in_chain && ruleset.can_capture_backwards_during_multi_capture())
}

fn collect_simple_moves(
    board: &Board,
    ruleset: &Ruleset,
    from: Position,
    piece: Piece,
    out: &mut Vec<Move>,
) {
    let flying = flies(ruleset, piece);
    for (dx, dy) in DIAGONALS {
        if !piece.crowned && dy != piece.color.forward() {
            continue;
        }
        let mut distance = 1;
        while let Some(target) = board.step(from, dx, dy, distance) {
            if board.piece_at(target).is_some() {
                break;
            }
            out.push(Move::simple(from, target));
            if !flying {
                break;
            }
            distance += 1;
        }
    }
}

fn collect_captures(
    board: &Board,
    ruleset: &Ruleset,
    from: Position,
    piece: Piece,
    in_chain: bool,
    out: &mut Vec<Move>,
) {
    let flying = flies(ruleset, piece);
    for (dx, dy) in DIAGONALS {
        if !may_capture_towards(ruleset, piece, dy, in_chain) {
            continue;
        }

        // First occupied square along the ray; only kings may fly towards it.
        let mut distance = 1;
        let victim = loop {
            let Some(square) = board.step(from, dx, dy, distance) else {
                break None;
            };
            match board.piece_at(square) {
                None if flying => distance += 1,
                Some(other) if other.color != piece.color => break Some(square),
                _ => break None,
            }
        };
        let Some(victim) = victim else {
            continue;
        };

        let mut landing = distance + 1;
        while let Some(target) = board.step(from, dx, dy, landing) {
            if board.piece_at(target).is_some() {
                break;
            }
            out.push(Move::capture(from, target, victim));
            if !flying {
                break;
            }
            landing += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng as _, rngs::StdRng};

    use super::*;

    fn board_with(ruleset: &Ruleset, pieces: &[(i32, i32, Piece)]) -> Board {
        let mut board = Board::empty(ruleset);
        for &(x, y, piece) in pieces {
            board.set(x, y, Some(piece)).unwrap();
        }
        board
    }

    fn pos(x: u8, y: u8) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn initial_classic_position_has_seven_simple_moves_each() {
        let rules = Ruleset::classic();
        let board = Board::initial(&rules).unwrap();

        let black = available_moves(&board, &rules, Color::Black);
        let white = available_moves(&board, &rules, Color::White);

        assert_eq!(black.len(), 7);
        assert_eq!(white.len(), 7);
        assert!(black.iter().all(|mv| !mv.is_capture() && mv.from.y == 2));
        assert!(white.iter().all(|mv| mv.to.y == 4));
    }

    #[test]
    fn forced_capture_excludes_simple_moves() {
        let rules = Ruleset::classic()
            .with_must_capture(true)
            .with_can_capture_backwards(false);
        let board = board_with(
            &rules,
            &[
                (2, 5, Piece::man(Color::White)),
                (3, 4, Piece::man(Color::Black)),
                (6, 7, Piece::man(Color::White)),
            ],
        );

        let moves = available_moves(&board, &rules, Color::White);

        assert_eq!(moves, vec![Move::capture(pos(2, 5), pos(4, 3), pos(3, 4))]);
        assert!(is_move_valid(&board, &rules, Color::White, 2, 5, 4, 3));
        assert!(!is_move_valid(&board, &rules, Color::White, 2, 5, 1, 4));
        assert!(!is_piece_movable(&board, &rules, Color::White, 6, 7));
    }

    #[test]
    fn optional_capture_keeps_simple_moves() {
        let rules = Ruleset::classic().with_must_capture(false);
        let board = board_with(
            &rules,
            &[
                (2, 5, Piece::man(Color::White)),
                (3, 4, Piece::man(Color::Black)),
            ],
        );

        let moves = available_moves(&board, &rules, Color::White);

        assert_eq!(
            moves,
            vec![
                Move::capture(pos(2, 5), pos(4, 3), pos(3, 4)),
                Move::simple(pos(2, 5), pos(1, 4)),
            ]
        );
    }

    #[test]
    fn men_capture_backwards_only_when_allowed() {
        let pieces = [
            (3, 2, Piece::man(Color::White)),
            (4, 3, Piece::man(Color::Black)),
        ];
        let forward_only = Ruleset::classic();
        let board = board_with(&forward_only, &pieces);
        assert!(!has_any_capture(&board, &forward_only, Color::White));

        let backwards = forward_only.with_can_capture_backwards(true);
        assert_eq!(
            available_moves(&board, &backwards, Color::White),
            vec![Move::capture(pos(3, 2), pos(5, 4), pos(4, 3))]
        );
    }

    #[test]
    fn chain_continuation_may_capture_backwards_when_enabled() {
        let pieces = [
            (3, 2, Piece::man(Color::White)),
            (4, 3, Piece::man(Color::Black)),
        ];
        let rules = Ruleset::classic();
        let board = board_with(&rules, &pieces);
        assert!(continuation_moves(&board, &rules, pos(3, 2)).is_empty());

        let chain_rules = rules.with_can_capture_backwards_during_multi_capture(true);
        assert_eq!(
            continuation_moves(&board, &chain_rules, pos(3, 2)),
            vec![Move::capture(pos(3, 2), pos(5, 4), pos(4, 3))]
        );
        assert!(!has_any_capture(&board, &chain_rules, Color::White));
    }

    #[test]
    fn kings_move_one_square_in_all_directions_without_flying() {
        let rules = Ruleset::classic();
        let board = board_with(&rules, &[(3, 4, Piece::king(Color::Black))]);

        let mut targets: Vec<_> = available_moves(&board, &rules, Color::Black)
            .into_iter()
            .map(|mv| mv.to)
            .collect();
        targets.sort_by_key(|p| (p.y, p.x));

        assert_eq!(targets, vec![pos(2, 3), pos(4, 3), pos(2, 5), pos(4, 5)]);
    }

    #[test]
    fn flying_king_slides_along_clear_diagonals() {
        let rules = Ruleset::classic().with_flying_kings(true);
        let board = board_with(
            &rules,
            &[
                (0, 7, Piece::king(Color::White)),
                (4, 3, Piece::man(Color::White)),
            ],
        );

        let moves: Vec<_> = available_moves(&board, &rules, Color::White)
            .into_iter()
            .filter(|mv| mv.from == pos(0, 7))
            .map(|mv| mv.to)
            .collect();

        assert_eq!(moves, vec![pos(1, 6), pos(2, 5), pos(3, 4)]);
    }

    #[test]
    fn flying_king_captures_from_distance_and_lands_anywhere_beyond() {
        let rules = Ruleset::classic().with_flying_kings(true);
        let board = board_with(
            &rules,
            &[
                (0, 7, Piece::king(Color::White)),
                (3, 4, Piece::man(Color::Black)),
                (6, 1, Piece::man(Color::Black)),
            ],
        );

        let captures = available_moves(&board, &rules, Color::White);

        assert_eq!(
            captures,
            vec![
                Move::capture(pos(0, 7), pos(4, 3), pos(3, 4)),
                Move::capture(pos(0, 7), pos(5, 2), pos(3, 4)),
            ]
        );
    }

    #[test]
    fn flying_king_cannot_jump_two_pieces_in_a_row() {
        let rules = Ruleset::classic().with_flying_kings(true);
        let board = board_with(
            &rules,
            &[
                (0, 7, Piece::king(Color::White)),
                (2, 5, Piece::man(Color::Black)),
                (3, 4, Piece::man(Color::Black)),
            ],
        );

        assert!(!has_any_capture(&board, &rules, Color::White));
    }

    #[test]
    fn invalid_inputs_are_never_valid() {
        let rules = Ruleset::classic();
        let board = Board::initial(&rules).unwrap();

        // off board
        assert!(!is_move_valid(&board, &rules, Color::Black, -1, 2, 0, 3));
        assert!(!is_move_valid(&board, &rules, Color::Black, 1, 2, 100, 3));
        assert!(!is_move_valid(&board, &rules, Color::Black, i32::MIN, i32::MAX, 0, 0));
        // empty source
        assert!(!is_move_valid(&board, &rules, Color::Black, 0, 3, 1, 4));
        // foreign piece
        assert!(!is_move_valid(&board, &rules, Color::Black, 0, 5, 1, 4));
        // occupied destination
        assert!(!is_move_valid(&board, &rules, Color::Black, 0, 1, 1, 2));
        assert!(is_move_valid(&board, &rules, Color::Black, 1, 2, 0, 3));
    }

    #[test]
    fn apply_crowns_once_and_removes_only_the_victim() {
        let rules = Ruleset::classic();
        let mut board = board_with(
            &rules,
            &[
                (3, 2, Piece::man(Color::White)),
                (4, 1, Piece::man(Color::Black)),
                (0, 5, Piece::man(Color::White)),
            ],
        );

        let capture = Move::capture(pos(3, 2), pos(5, 0), pos(4, 1));
        assert!(promotes(&board, &capture));
        assert!(apply(&mut board, &capture));
        assert_eq!(board.get(5, 0), Some(Piece::king(Color::White)));
        assert_eq!(board.counts(), (0, 2));

        let back = Move::simple(pos(5, 0), pos(6, 1));
        assert!(!apply(&mut board, &back));
        let again = Move::simple(pos(6, 1), pos(5, 0));
        assert!(!promotes(&board, &again));
        assert!(!apply(&mut board, &again));
        assert_eq!(board.get(5, 0), Some(Piece::king(Color::White)));
    }

    #[test]
    fn random_boards_never_yield_off_board_or_occupied_landings() {
        let mut rng = StdRng::seed_from_u64(7);
        for round in 0..200 {
            let rules = Ruleset::new(rng.random_range(4..=10), rng.random_range(4..=10))
                .unwrap()
                .with_must_capture(round % 2 == 0)
                .with_can_capture_backwards(round % 3 == 0)
                .with_flying_kings(round % 5 < 2);
            let mut board = Board::empty(&rules);
            for y in 0..i32::from(rules.height()) {
                for x in 0..i32::from(rules.width()) {
                    if Board::is_dark(x, y) && rng.random_bool(0.4) {
                        let color = if rng.random_bool(0.5) {
                            Color::Black
                        } else {
                            Color::White
                        };
                        let piece = Piece {
                            color,
                            crowned: rng.random_bool(0.3),
                        };
                        board.set(x, y, Some(piece)).unwrap();
                    }
                }
            }

            for color in Color::ALL {
                let moves = available_moves(&board, &rules, color);
                let any_capture = moves.iter().any(Move::is_capture);
                for mv in &moves {
                    assert!(board.in_bounds(i32::from(mv.to.x), i32::from(mv.to.y)));
                    assert!(board.piece_at(mv.to).is_none());
                    assert_eq!(board.piece_at(mv.from).map(|p| p.color), Some(color));
                    for &victim in &mv.captured {
                        assert_eq!(
                            board.piece_at(victim).map(|p| p.color),
                            Some(color.opponent())
                        );
                    }
                    if rules.must_capture() && any_capture {
                        assert!(mv.is_capture());
                    }
                }
            }
        }
    }
}
