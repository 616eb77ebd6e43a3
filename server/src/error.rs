//! Domain error taxonomy for room and game operations.
//!
//! Every rejected intent maps to one of these variants. They are surfaced to
//! the originating connection only, as an `Error { message }` packet, and never
//! partially mutate room state.

use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    RoomNotFound,
    RoomFull,
    ColorTaken,
    NotYourTurn,
    IllegalMove(&'static str),
    GameNotStarted,
    GameOver,
    NotHost,
    NotEnoughPlayers,
    AlreadyStarted,
    AlreadyRolled,
    RollFirst,
    MustUseSix,
    UnknownPlayer,
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::RoomNotFound => write!(f, "Game not found"),
            GameError::RoomFull => write!(f, "Cannot join game - room is full"),
            GameError::ColorTaken => write!(f, "Cannot join game - color already taken"),
            GameError::NotYourTurn => write!(f, "Not your turn!"),
            GameError::IllegalMove(reason) => write!(f, "Invalid move: {}", reason),
            GameError::GameNotStarted => write!(f, "The game has not started yet"),
            GameError::GameOver => write!(f, "The game is already over"),
            GameError::NotHost => write!(f, "Only the host can start the game"),
            GameError::NotEnoughPlayers => write!(f, "Need at least 2 players to start"),
            GameError::AlreadyStarted => write!(f, "The game has already started"),
            GameError::AlreadyRolled => {
                write!(
                    f,
                    "You have already rolled the dice! Make a move or pass your turn."
                )
            }
            GameError::RollFirst => write!(f, "Roll the dice first!"),
            GameError::MustUseSix => write!(f, "You rolled a 6! You must move a piece."),
            GameError::UnknownPlayer => write!(f, "Player not found in game"),
        }
    }
}

impl Error for GameError {}
