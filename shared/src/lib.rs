use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Number of cells on the shared circular track.
pub const TRACK_LEN: u8 = 52;
/// Track cells a piece walks before turning into its home stretch.
pub const LAP_CELLS: u8 = TRACK_LEN - 1;
/// Length of each color's private home stretch.
pub const HOME_STRETCH_LEN: u8 = 5;
/// Relative progress value at which a piece is finished.
pub const FINISH_PROGRESS: u8 = LAP_CELLS + HOME_STRETCH_LEN;
/// Pieces per color, always.
pub const PIECES_PER_COLOR: u8 = 4;
/// Track cells where capture cannot occur: the 4 start cells plus the 4 star cells.
pub const SAFE_CELLS: [u8; 8] = [0, 8, 13, 21, 26, 34, 39, 47];
/// Maximum players in a room.
pub const MAX_PLAYERS: usize = 4;
/// Minimum players required to start a game.
pub const MIN_PLAYERS: usize = 2;

/// The four Ludo colors. Join order decides turn order; color decides geometry.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Red, Color::Blue, Color::Green, Color::Yellow];

    /// Stable index used for array-backed per-color storage.
    pub fn index(self) -> usize {
        match self {
            Color::Red => 0,
            Color::Blue => 1,
            Color::Green => 2,
            Color::Yellow => 3,
        }
    }

    /// The track cell where this color's pieces enter play.
    pub fn start_cell(self) -> u8 {
        match self {
            Color::Red => 0,
            Color::Blue => 13,
            Color::Green => 26,
            Color::Yellow => 39,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Yellow => "yellow",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True if `cell` is a safe track cell (start or star cell).
pub fn is_safe_cell(cell: u8) -> bool {
    SAFE_CELLS.contains(&cell)
}

/// How far around the lap a piece on track cell `cell` has traveled for `color`.
///
/// 0 is the color's start cell; pieces on the track are always in `0..LAP_CELLS`.
pub fn lap_progress(color: Color, cell: u8) -> u8 {
    (cell + TRACK_LEN - color.start_cell()) % TRACK_LEN
}

/// Location category a client claims a piece is moving from. The server
/// verifies against the authoritative board and never trusts this hint.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum FromLocation {
    Home,
    Path,
    Stretch,
}

/// One player's public identity inside a snapshot.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PlayerView {
    pub id: u32,
    pub name: String,
    pub color: Color,
    pub connected: bool,
}

/// One color's piece buckets inside a snapshot. Piece indices are 0..=3.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct ColorBoardView {
    /// Pieces not yet in play.
    pub home: Vec<u8>,
    /// Piece index -> absolute track cell.
    pub path: HashMap<u8, u8>,
    /// Piece index -> home-stretch step.
    pub stretch: HashMap<u8, u8>,
    /// Pieces that reached the finish.
    pub finished: Vec<u8>,
}

/// Immutable state snapshot pushed to every room member after each mutation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GameSnapshot {
    pub game_id: String,
    /// Players in join order; `current_player` indexes into this list.
    pub players: Vec<PlayerView>,
    pub current_player: usize,
    /// 0 while the current player has not rolled this turn.
    pub dice_value: u8,
    pub game_started: bool,
    pub board: HashMap<Color, ColorBoardView>,
    pub winner: Option<Color>,
}

/// Every message exchanged between client and server, one datagram each.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    // Client -> server intents
    CreateGame {
        player_name: String,
        color: Color,
    },
    JoinGame {
        game_id: String,
        player_name: String,
        color: Color,
    },
    RejoinGame {
        game_id: String,
        player_id: u32,
    },
    StartGame,
    RollDice,
    MovePiece {
        color: Color,
        piece: u8,
        from: FromLocation,
    },
    PassTurn,
    Chat {
        message: String,
    },
    Ping,
    Leave,

    // Server -> client events
    GameCreated {
        game_id: String,
        player_id: u32,
        state: GameSnapshot,
    },
    GameJoined {
        game_id: String,
        player_id: u32,
        state: GameSnapshot,
    },
    GameRejoined {
        game_id: String,
        state: GameSnapshot,
    },
    PlayerJoined {
        player_name: String,
        color: Color,
        state: GameSnapshot,
    },
    PlayerLeft {
        player_name: String,
        state: GameSnapshot,
    },
    GameStarted {
        state: GameSnapshot,
    },
    DiceRolled {
        dice_value: u8,
        player_id: u32,
        state: GameSnapshot,
    },
    PieceMoved {
        color: Color,
        piece: u8,
        capture: bool,
        state: GameSnapshot,
    },
    TurnChanged {
        state: GameSnapshot,
        message: Option<String>,
    },
    ChatMessage {
        player_name: String,
        message: String,
    },
    Pong,
    Error {
        message: String,
    },
}
