//! Board model: piece locations for all four colors plus the track geometry
//! queries the rules engine needs.
//!
//! The representation makes the core invariant structural: each color owns a
//! fixed array of 4 piece locations, so the per-color piece count can never
//! drift. Track cells and home-stretch steps are disjoint coordinate spaces;
//! pieces only meet on the shared track.

use log::debug;
use shared::{lap_progress, Color, FINISH_PROGRESS, LAP_CELLS, TRACK_LEN};
use std::collections::HashMap;

/// Pieces per color as a usize for indexing.
pub const PIECES: usize = shared::PIECES_PER_COLOR as usize;

/// Where a single piece is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceLocation {
    /// Not yet in play.
    Home,
    /// On the shared track, absolute cell 0..=51.
    Path(u8),
    /// In the color's private stretch, step 0..=4.
    HomeStretch(u8),
    /// Done; never moves again.
    Finished,
}

#[derive(Debug, Clone)]
pub struct Board {
    pieces: [[PieceLocation; PIECES]; 4],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            pieces: [[PieceLocation::Home; PIECES]; 4],
        }
    }

    pub fn piece_location(&self, color: Color, piece: u8) -> PieceLocation {
        self.pieces[color.index()][piece as usize]
    }

    /// Send a piece back to Home (setup or capture).
    pub fn send_home(&mut self, color: Color, piece: u8) {
        debug!("{} piece {} sent home", color, piece);
        self.pieces[color.index()][piece as usize] = PieceLocation::Home;
    }

    /// Move a piece out of Home onto its color's start cell. The caller has
    /// already checked the dice requirement.
    pub fn enter_path(&mut self, color: Color, piece: u8) {
        debug_assert_eq!(self.piece_location(color, piece), PieceLocation::Home);
        let start = color.start_cell();
        debug!("{} piece {} enters play at cell {}", color, piece, start);
        self.pieces[color.index()][piece as usize] = PieceLocation::Path(start);
    }

    /// Where a piece would land after `steps`, without mutating. `None` means
    /// the piece cannot advance: it is at Home or Finished, or the move would
    /// overshoot past the final home-stretch cell.
    pub fn target_location(&self, color: Color, piece: u8, steps: u8) -> Option<PieceLocation> {
        let progress = match self.piece_location(color, piece) {
            PieceLocation::Path(cell) => lap_progress(color, cell),
            PieceLocation::HomeStretch(step) => LAP_CELLS + step,
            PieceLocation::Home | PieceLocation::Finished => return None,
        };

        let target = progress + steps;
        if target < LAP_CELLS {
            Some(PieceLocation::Path(
                (color.start_cell() + target) % TRACK_LEN,
            ))
        } else if target < FINISH_PROGRESS {
            Some(PieceLocation::HomeStretch(target - LAP_CELLS))
        } else if target == FINISH_PROGRESS {
            Some(PieceLocation::Finished)
        } else {
            None
        }
    }

    /// Advance a piece by `steps`, returning its new location. Returns `None`
    /// and leaves the board untouched when the move is not possible.
    pub fn advance(&mut self, color: Color, piece: u8, steps: u8) -> Option<PieceLocation> {
        let target = self.target_location(color, piece, steps)?;
        debug!("{} piece {} advances {} to {:?}", color, piece, steps, target);
        self.pieces[color.index()][piece as usize] = target;
        Some(target)
    }

    /// All pieces standing on the given track cell, across every color.
    pub fn occupants_at(&self, cell: u8) -> Vec<(Color, u8)> {
        let mut occupants = Vec::new();
        for color in Color::ALL {
            for piece in 0..PIECES as u8 {
                if self.piece_location(color, piece) == PieceLocation::Path(cell) {
                    occupants.push((color, piece));
                }
            }
        }
        occupants
    }

    /// Return every piece of a color to Home (used when a player leaves
    /// mid-game).
    pub fn clear_color(&mut self, color: Color) {
        self.pieces[color.index()] = [PieceLocation::Home; PIECES];
    }

    pub fn home_pieces(&self, color: Color) -> Vec<u8> {
        self.bucket(color, |loc| matches!(loc, PieceLocation::Home))
    }

    pub fn finished_pieces(&self, color: Color) -> Vec<u8> {
        self.bucket(color, |loc| matches!(loc, PieceLocation::Finished))
    }

    pub fn path_pieces(&self, color: Color) -> HashMap<u8, u8> {
        let mut cells = HashMap::new();
        for piece in 0..PIECES as u8 {
            if let PieceLocation::Path(cell) = self.piece_location(color, piece) {
                cells.insert(piece, cell);
            }
        }
        cells
    }

    pub fn stretch_pieces(&self, color: Color) -> HashMap<u8, u8> {
        let mut steps = HashMap::new();
        for piece in 0..PIECES as u8 {
            if let PieceLocation::HomeStretch(step) = self.piece_location(color, piece) {
                steps.insert(piece, step);
            }
        }
        steps
    }

    pub fn finished_count(&self, color: Color) -> usize {
        self.finished_pieces(color).len()
    }

    pub fn all_finished(&self, color: Color) -> bool {
        self.finished_count(color) == PIECES
    }

    fn bucket(&self, color: Color, pred: impl Fn(PieceLocation) -> bool) -> Vec<u8> {
        (0..PIECES as u8)
            .filter(|&piece| pred(self.piece_location(color, piece)))
            .collect()
    }
}
