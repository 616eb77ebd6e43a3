//! Move rules engine: which moves a rolled value allows, and what applying
//! one does to the board.
//!
//! Legality rules:
//! - A piece leaves Home only on a 6, always to its color's start cell.
//! - A piece on the track or in its stretch moves iff it would not overshoot
//!   the finish (exact landing required, no wraparound at the end).
//! - Landing on a non-safe track cell occupied by exactly one opposing piece
//!   captures it; own-color pieces stack; safe cells never capture.

use crate::board::{Board, PieceLocation, PIECES};
use crate::error::GameError;
use log::debug;
use shared::{is_safe_cell, Color};

/// A single legal option for the current roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegalMove {
    pub piece: u8,
    pub destination: PieceLocation,
}

/// Result of a successfully applied move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub piece: u8,
    pub destination: PieceLocation,
    /// The opposing piece sent back to Home, if the move captured one.
    pub captured: Option<(Color, u8)>,
}

impl MoveOutcome {
    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }
}

/// Every move `color` may legally make with `dice`. Empty means the turn
/// auto-passes.
pub fn legal_moves(board: &Board, color: Color, dice: u8) -> Vec<LegalMove> {
    let mut moves = Vec::new();
    for piece in 0..PIECES as u8 {
        match board.piece_location(color, piece) {
            PieceLocation::Home => {
                if dice == 6 {
                    moves.push(LegalMove {
                        piece,
                        destination: PieceLocation::Path(color.start_cell()),
                    });
                }
            }
            PieceLocation::Path(_) | PieceLocation::HomeStretch(_) => {
                if let Some(destination) = board.target_location(color, piece, dice) {
                    moves.push(LegalMove { piece, destination });
                }
            }
            PieceLocation::Finished => {}
        }
    }
    moves
}

/// Validate and apply one move. On error the board is untouched.
pub fn apply_move(
    board: &mut Board,
    color: Color,
    piece: u8,
    dice: u8,
) -> Result<MoveOutcome, GameError> {
    if piece as usize >= PIECES {
        return Err(GameError::IllegalMove("no such piece"));
    }

    match board.piece_location(color, piece) {
        PieceLocation::Home => {
            if dice != 6 {
                return Err(GameError::IllegalMove("a 6 is required to leave home"));
            }
            board.enter_path(color, piece);
            // Start cells are safe, so entry never captures.
            Ok(MoveOutcome {
                piece,
                destination: PieceLocation::Path(color.start_cell()),
                captured: None,
            })
        }
        PieceLocation::Finished => Err(GameError::IllegalMove("piece already finished")),
        PieceLocation::Path(_) | PieceLocation::HomeStretch(_) => {
            let destination = board
                .target_location(color, piece, dice)
                .ok_or(GameError::IllegalMove("move would overshoot the finish"))?;

            let captured = resolve_capture(board, color, destination);
            if let Some((victim_color, victim_piece)) = captured {
                debug!(
                    "{} piece {} captures {} piece {}",
                    color, piece, victim_color, victim_piece
                );
                board.send_home(victim_color, victim_piece);
            }

            // Cannot fail: the same target was just computed above.
            let landed = board.advance(color, piece, dice);
            debug_assert_eq!(landed, Some(destination));

            Ok(MoveOutcome {
                piece,
                destination,
                captured,
            })
        }
    }
}

/// The piece captured by landing on `destination`, if any: a non-safe track
/// cell occupied by exactly one opposing piece. Own-color stacks and opposing
/// stacks of two or more are left alone.
fn resolve_capture(
    board: &Board,
    mover: Color,
    destination: PieceLocation,
) -> Option<(Color, u8)> {
    let cell = match destination {
        PieceLocation::Path(cell) => cell,
        _ => return None,
    };
    if is_safe_cell(cell) {
        return None;
    }

    let foes: Vec<(Color, u8)> = board
        .occupants_at(cell)
        .into_iter()
        .filter(|(color, _)| *color != mover)
        .collect();

    match foes.as_slice() {
        [victim] => Some(*victim),
        _ => None,
    }
}
