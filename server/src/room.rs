//! Game room: players, board, turn state and chat for one game id, plus the
//! actor task that serializes every mutation for that room.
//!
//! All state changes for a room happen inside its `run_room` task, fed by an
//! mpsc mailbox. Broadcasts are emitted from the same task immediately after
//! the mutation, so every member observes updates in the same total order.
//! Rooms never share mutable state, so a fault in one room cannot reach
//! another.

use crate::board::Board;
use crate::dice::DiceRoller;
use crate::error::GameError;
use crate::network::{GameMessage, ServerMessage};
use crate::rules;
use crate::turn::{GamePhase, RollOutcome, TurnState};
use log::{debug, info, warn};
use shared::{
    Color, ColorBoardView, FromLocation, GameSnapshot, Packet, PlayerView, MAX_PLAYERS,
    MIN_PLAYERS,
};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::interval;

/// Chat messages kept per room.
const CHAT_LOG_LIMIT: usize = 100;

/// A member of the room. `addr` is `None` while the player is disconnected;
/// their identity survives for `rejoin_game`.
#[derive(Debug, Clone)]
pub struct RoomPlayer {
    pub id: u32,
    pub name: String,
    pub color: Color,
    pub addr: Option<SocketAddr>,
}

/// One packet addressed to one connection. Room operations return these; the
/// actor forwards them to the network sender in order.
#[derive(Debug)]
pub struct Outbound {
    pub addr: SocketAddr,
    pub packet: Packet,
}

/// Mutating intents delivered through the room's mailbox. `addr` is the
/// origin connection, used to answer errors to the caller only.
#[derive(Debug)]
pub enum RoomCommand {
    Join {
        addr: SocketAddr,
        player_name: String,
        color: Color,
        /// True for the create_game flow: answers `GameCreated` instead of
        /// `GameJoined`.
        created: bool,
    },
    Rejoin {
        addr: SocketAddr,
        player_id: u32,
    },
    Leave {
        player_id: u32,
    },
    Disconnected {
        addr: SocketAddr,
        player_id: u32,
    },
    Start {
        addr: SocketAddr,
        player_id: u32,
    },
    Roll {
        addr: SocketAddr,
        player_id: u32,
    },
    Move {
        addr: SocketAddr,
        player_id: u32,
        color: Color,
        piece: u8,
        from: FromLocation,
    },
    Pass {
        addr: SocketAddr,
        player_id: u32,
    },
    Chat {
        addr: SocketAddr,
        player_id: u32,
        message: String,
    },
}

pub struct GameRoom {
    id: String,
    players: Vec<RoomPlayer>,
    board: Board,
    turn: TurnState,
    chat: VecDeque<(String, String)>,
    dice: Box<dyn DiceRoller>,
    next_player_id: u32,
    last_activity: Instant,
}

impl GameRoom {
    pub fn new(id: String, dice: Box<dyn DiceRoller>) -> Self {
        Self {
            id,
            players: Vec::new(),
            board: Board::new(),
            turn: TurnState::new(),
            chat: VecDeque::new(),
            dice,
            next_player_id: 1,
            last_activity: Instant::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn connected_count(&self) -> usize {
        self.players.iter().filter(|p| p.addr.is_some()).count()
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    /// Admit a new player. Fails once the game has started; reconnection goes
    /// through `rejoin` instead.
    pub fn join(
        &mut self,
        addr: SocketAddr,
        name: String,
        color: Color,
        created: bool,
    ) -> Result<(u32, Vec<Outbound>), GameError> {
        if self.turn.phase() != GamePhase::WaitingForPlayers {
            return Err(GameError::AlreadyStarted);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(GameError::RoomFull);
        }
        if self.players.iter().any(|p| p.color == color) {
            return Err(GameError::ColorTaken);
        }

        let player_id = self.next_player_id;
        self.next_player_id += 1;
        info!(
            "Room {}: {} joined as {} (player {})",
            self.id, name, color, player_id
        );
        self.players.push(RoomPlayer {
            id: player_id,
            name: name.clone(),
            color,
            addr: Some(addr),
        });

        let state = self.snapshot();
        let direct = if created {
            Packet::GameCreated {
                game_id: self.id.clone(),
                player_id,
                state: state.clone(),
            }
        } else {
            Packet::GameJoined {
                game_id: self.id.clone(),
                player_id,
                state: state.clone(),
            }
        };

        let mut events = vec![Outbound {
            addr,
            packet: direct,
        }];
        self.broadcast_except(
            &mut events,
            addr,
            Packet::PlayerJoined {
                player_name: name,
                color,
                state,
            },
        );
        Ok((player_id, events))
    }

    /// Re-attach a reconnected session to an existing player identity. Game
    /// state is untouched.
    pub fn rejoin(
        &mut self,
        addr: SocketAddr,
        player_id: u32,
    ) -> Result<(u32, Vec<Outbound>), GameError> {
        let idx = self
            .player_index(player_id)
            .ok_or(GameError::UnknownPlayer)?;
        self.players[idx].addr = Some(addr);
        info!(
            "Room {}: player {} reconnected from {}",
            self.id, player_id, addr
        );

        let events = vec![Outbound {
            addr,
            packet: Packet::GameRejoined {
                game_id: self.id.clone(),
                state: self.snapshot(),
            },
        }];
        Ok((player_id, events))
    }

    /// Remove a player entirely. Mid-game their pieces leave the board and
    /// turn order re-cycles over the survivors; a lone survivor wins.
    pub fn leave(&mut self, player_id: u32) -> Result<Vec<Outbound>, GameError> {
        let idx = self
            .player_index(player_id)
            .ok_or(GameError::UnknownPlayer)?;
        let player = self.players.remove(idx);
        info!("Room {}: {} left", self.id, player.name);

        let in_progress = self.turn.phase() == GamePhase::InProgress;
        self.board.clear_color(player.color);
        self.turn.player_removed(idx, self.players.len());

        if in_progress && self.players.len() == 1 {
            let survivor = self.players[0].color;
            info!("Room {}: {} wins by default", self.id, survivor);
            self.turn.declare_winner(survivor);
        }

        let mut events = Vec::new();
        self.broadcast(
            &mut events,
            Packet::PlayerLeft {
                player_name: player.name,
                state: self.snapshot(),
            },
        );
        Ok(events)
    }

    /// A connection went away. Before the game starts the player is dropped;
    /// mid-game their identity is kept for rejoin. Timeouts for a connection
    /// that was already replaced by a rejoin are ignored.
    pub fn disconnected(
        &mut self,
        player_id: u32,
        from_addr: SocketAddr,
    ) -> Result<Vec<Outbound>, GameError> {
        let idx = self
            .player_index(player_id)
            .ok_or(GameError::UnknownPlayer)?;
        if self.players[idx].addr != Some(from_addr) {
            return Ok(Vec::new());
        }
        match self.turn.phase() {
            GamePhase::WaitingForPlayers | GamePhase::Finished => self.leave(player_id),
            GamePhase::InProgress => {
                self.players[idx].addr = None;
                let name = self.players[idx].name.clone();
                info!("Room {}: {} disconnected", self.id, name);

                let mut events = Vec::new();
                self.broadcast(
                    &mut events,
                    Packet::PlayerLeft {
                        player_name: name,
                        state: self.snapshot(),
                    },
                );
                Ok(events)
            }
        }
    }

    /// Host-only transition out of the lobby.
    pub fn start(&mut self, player_id: u32) -> Result<Vec<Outbound>, GameError> {
        if self.turn.phase() != GamePhase::WaitingForPlayers {
            return Err(GameError::AlreadyStarted);
        }
        match self.players.first() {
            Some(host) if host.id == player_id => {}
            Some(_) => return Err(GameError::NotHost),
            None => return Err(GameError::UnknownPlayer),
        }
        if self.players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers);
        }

        self.turn.start();
        info!(
            "Room {}: game started with {} players",
            self.id,
            self.players.len()
        );

        let mut events = Vec::new();
        self.broadcast(
            &mut events,
            Packet::GameStarted {
                state: self.snapshot(),
            },
        );
        Ok(events)
    }

    pub fn roll_dice(&mut self, player_id: u32) -> Result<Vec<Outbound>, GameError> {
        let player = self.ensure_current(player_id)?;
        let color = player.color;
        if self.turn.has_rolled() {
            return Err(GameError::AlreadyRolled);
        }

        let value = self.dice.roll();
        let n = self.players.len();
        info!("Room {}: {} rolled {}", self.id, color, value);

        let mut events = Vec::new();
        match self.turn.record_roll(value, n) {
            RollOutcome::ForfeitThirdSix => {
                self.broadcast(
                    &mut events,
                    Packet::DiceRolled {
                        dice_value: value,
                        player_id,
                        state: self.snapshot(),
                    },
                );
                self.broadcast(
                    &mut events,
                    Packet::TurnChanged {
                        state: self.snapshot(),
                        message: Some(format!(
                            "Three sixes in a row! Turn passed to {}",
                            self.current_color()
                        )),
                    },
                );
            }
            RollOutcome::AwaitMove => {
                // The roll is acknowledged first so everyone sees the value,
                // then the turn auto-passes if nothing can move.
                self.broadcast(
                    &mut events,
                    Packet::DiceRolled {
                        dice_value: value,
                        player_id,
                        state: self.snapshot(),
                    },
                );
                if rules::legal_moves(&self.board, color, value).is_empty() {
                    self.turn.pass(n);
                    self.broadcast(
                        &mut events,
                        Packet::TurnChanged {
                            state: self.snapshot(),
                            message: Some(format!(
                                "No moves for {} - turn passed to {}",
                                color,
                                self.current_color()
                            )),
                        },
                    );
                }
            }
        }
        Ok(events)
    }

    pub fn move_piece(
        &mut self,
        player_id: u32,
        color: Color,
        piece: u8,
        from: FromLocation,
    ) -> Result<Vec<Outbound>, GameError> {
        let player = self.ensure_current(player_id)?;
        if player.color != color {
            return Err(GameError::IllegalMove("that is not your color"));
        }
        if !self.turn.has_rolled() {
            return Err(GameError::RollFirst);
        }

        // The client's location hint is never trusted; legality comes from
        // the authoritative board alone.
        let actual = self.board.piece_location(color, piece.min(3));
        let hinted_matches = matches!(
            (from, actual),
            (FromLocation::Home, crate::board::PieceLocation::Home)
                | (FromLocation::Path, crate::board::PieceLocation::Path(_))
                | (FromLocation::Stretch, crate::board::PieceLocation::HomeStretch(_))
        );
        if !hinted_matches {
            warn!(
                "Room {}: stale location hint {:?} for {} piece {}",
                self.id, from, color, piece
            );
        }

        let dice = self.turn.dice_value();
        let outcome = rules::apply_move(&mut self.board, color, piece, dice)?;
        if outcome.is_capture() {
            info!(
                "Room {}: {} captured {:?}",
                self.id, color, outcome.captured
            );
        }

        let mut events = Vec::new();
        self.broadcast(
            &mut events,
            Packet::PieceMoved {
                color,
                piece,
                capture: outcome.is_capture(),
                state: self.snapshot(),
            },
        );

        if self.board.all_finished(color) {
            self.turn.declare_winner(color);
            info!("Room {}: {} wins", self.id, color);
            self.broadcast(
                &mut events,
                Packet::TurnChanged {
                    state: self.snapshot(),
                    message: Some(format!("{} wins!", color)),
                },
            );
        } else {
            let n = self.players.len();
            let bonus = self.turn.finish_move(n);
            let message = if bonus {
                "Roll again! You got a 6.".to_string()
            } else {
                format!("Turn passed to {}", self.current_color())
            };
            self.broadcast(
                &mut events,
                Packet::TurnChanged {
                    state: self.snapshot(),
                    message: Some(message),
                },
            );
        }
        Ok(events)
    }

    /// Voluntary pass: only after rolling, and never on a 6.
    pub fn pass_turn(&mut self, player_id: u32) -> Result<Vec<Outbound>, GameError> {
        self.ensure_current(player_id)?;
        if !self.turn.has_rolled() {
            return Err(GameError::RollFirst);
        }
        if self.turn.dice_value() == 6 {
            return Err(GameError::MustUseSix);
        }

        let n = self.players.len();
        self.turn.pass(n);

        let mut events = Vec::new();
        self.broadcast(
            &mut events,
            Packet::TurnChanged {
                state: self.snapshot(),
                message: Some(format!("Turn passed to {}", self.current_color())),
            },
        );
        Ok(events)
    }

    pub fn post_chat(
        &mut self,
        player_id: u32,
        message: String,
    ) -> Result<Vec<Outbound>, GameError> {
        let idx = self
            .player_index(player_id)
            .ok_or(GameError::UnknownPlayer)?;
        let name = self.players[idx].name.clone();

        self.chat.push_back((name.clone(), message.clone()));
        while self.chat.len() > CHAT_LOG_LIMIT {
            self.chat.pop_front();
        }

        let mut events = Vec::new();
        self.broadcast(
            &mut events,
            Packet::ChatMessage {
                player_name: name,
                message,
            },
        );
        Ok(events)
    }

    pub fn chat_len(&self) -> usize {
        self.chat.len()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut board = HashMap::new();
        for color in Color::ALL {
            board.insert(
                color,
                ColorBoardView {
                    home: self.board.home_pieces(color),
                    path: self.board.path_pieces(color),
                    stretch: self.board.stretch_pieces(color),
                    finished: self.board.finished_pieces(color),
                },
            );
        }
        GameSnapshot {
            game_id: self.id.clone(),
            players: self
                .players
                .iter()
                .map(|p| PlayerView {
                    id: p.id,
                    name: p.name.clone(),
                    color: p.color,
                    connected: p.addr.is_some(),
                })
                .collect(),
            current_player: self.turn.current_index(),
            dice_value: self.turn.dice_value(),
            game_started: self.turn.phase() != GamePhase::WaitingForPlayers,
            board,
            winner: self.turn.winner(),
        }
    }

    fn current_color(&self) -> Color {
        self.players[self.turn.current_index()].color
    }

    fn player_index(&self, player_id: u32) -> Option<usize> {
        self.players.iter().position(|p| p.id == player_id)
    }

    /// Phase and turn-ownership checks shared by every in-game intent.
    fn ensure_current(&self, player_id: u32) -> Result<&RoomPlayer, GameError> {
        match self.turn.phase() {
            GamePhase::WaitingForPlayers => return Err(GameError::GameNotStarted),
            GamePhase::Finished => return Err(GameError::GameOver),
            GamePhase::InProgress => {}
        }
        if self.players.is_empty() {
            return Err(GameError::UnknownPlayer);
        }
        let current = &self.players[self.turn.current_index()];
        if current.id != player_id {
            // Reject strangers and waiting players alike.
            if self.player_index(player_id).is_none() {
                return Err(GameError::UnknownPlayer);
            }
            return Err(GameError::NotYourTurn);
        }
        Ok(current)
    }

    fn broadcast(&self, events: &mut Vec<Outbound>, packet: Packet) {
        for player in &self.players {
            if let Some(addr) = player.addr {
                events.push(Outbound {
                    addr,
                    packet: packet.clone(),
                });
            }
        }
    }

    fn broadcast_except(&self, events: &mut Vec<Outbound>, skip: SocketAddr, packet: Packet) {
        for player in &self.players {
            match player.addr {
                Some(addr) if addr != skip => events.push(Outbound {
                    addr,
                    packet: packet.clone(),
                }),
                _ => {}
            }
        }
    }
}

/// The room's actor: drains the mailbox, applies each command, and forwards
/// the resulting packets. Exits when the room has been empty past
/// `idle_timeout` (reporting `RoomClosed`) or when the mailbox closes.
pub async fn run_room(
    mut room: GameRoom,
    mut commands: mpsc::UnboundedReceiver<RoomCommand>,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    out_tx: mpsc::UnboundedSender<GameMessage>,
    idle_timeout: Duration,
) {
    let room_id = room.id().to_string();
    let mut idle_check = interval(Duration::from_secs(5));

    loop {
        tokio::select! {
            cmd = commands.recv() => {
                match cmd {
                    Some(cmd) => handle_command(&mut room, cmd, &room_id, &server_tx, &out_tx),
                    None => break,
                }
            }
            _ = idle_check.tick() => {
                if room.connected_count() == 0 && room.idle_for() >= idle_timeout {
                    info!("Room {} idle with no connections, closing", room_id);
                    let _ = server_tx.send(ServerMessage::RoomClosed {
                        room_id: room_id.clone(),
                    });
                    break;
                }
            }
        }
    }
}

fn handle_command(
    room: &mut GameRoom,
    cmd: RoomCommand,
    room_id: &str,
    server_tx: &mpsc::UnboundedSender<ServerMessage>,
    out_tx: &mpsc::UnboundedSender<GameMessage>,
) {
    room.touch();

    let result = match cmd {
        RoomCommand::Join {
            addr,
            player_name,
            color,
            created,
        } => match room.join(addr, player_name, color, created) {
            Ok((player_id, events)) => {
                let _ = server_tx.send(ServerMessage::SessionBound {
                    addr,
                    room_id: room_id.to_string(),
                    player_id,
                });
                Ok(events)
            }
            Err(e) => Err((Some(addr), e)),
        },
        RoomCommand::Rejoin { addr, player_id } => match room.rejoin(addr, player_id) {
            Ok((player_id, events)) => {
                let _ = server_tx.send(ServerMessage::SessionBound {
                    addr,
                    room_id: room_id.to_string(),
                    player_id,
                });
                Ok(events)
            }
            Err(e) => Err((Some(addr), e)),
        },
        RoomCommand::Leave { player_id } => {
            room.leave(player_id).map_err(|e| (None, e))
        }
        RoomCommand::Disconnected { addr, player_id } => {
            room.disconnected(player_id, addr).map_err(|e| (None, e))
        }
        RoomCommand::Start { addr, player_id } => {
            room.start(player_id).map_err(|e| (Some(addr), e))
        }
        RoomCommand::Roll { addr, player_id } => {
            room.roll_dice(player_id).map_err(|e| (Some(addr), e))
        }
        RoomCommand::Move {
            addr,
            player_id,
            color,
            piece,
            from,
        } => room
            .move_piece(player_id, color, piece, from)
            .map_err(|e| (Some(addr), e)),
        RoomCommand::Pass { addr, player_id } => {
            room.pass_turn(player_id).map_err(|e| (Some(addr), e))
        }
        RoomCommand::Chat {
            addr,
            player_id,
            message,
        } => room
            .post_chat(player_id, message)
            .map_err(|e| (Some(addr), e)),
    };

    match result {
        Ok(events) => {
            for Outbound { addr, packet } in events {
                let _ = out_tx.send(GameMessage::SendPacket { packet, addr });
            }
        }
        Err((Some(addr), e)) => {
            debug!("Room {}: rejected intent from {}: {}", room_id, addr, e);
            let _ = out_tx.send(GameMessage::SendPacket {
                packet: Packet::Error {
                    message: e.to_string(),
                },
                addr,
            });
        }
        Err((None, e)) => {
            debug!("Room {}: dropped lifecycle event: {}", room_id, e);
        }
    }
}
