//! Server network layer: UDP socket tasks, packet dispatch and room lifecycle.
//!
//! One receiver task decodes datagrams and feeds the main loop; one sender
//! task drains the outbound queue. The main loop owns the session table and
//! the room registry, and routes every game intent into the addressed room's
//! mailbox. Room actors push their broadcasts onto the same outbound queue,
//! so what goes on the wire is exactly the per-room mutation order.

use crate::dice::EntropyDice;
use crate::error::GameError;
use crate::registry::{RoomHandle, RoomRegistry};
use crate::room::{run_room, GameRoom, RoomCommand};
use crate::session::SessionManager;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::Packet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Messages sent from network tasks and room actors to the main server loop.
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    /// A room admitted (or re-admitted) a player; record the mapping.
    SessionBound {
        addr: SocketAddr,
        room_id: String,
        player_id: u32,
    },
    /// A room actor finished; forget it and its sessions.
    RoomClosed {
        room_id: String,
    },
    #[allow(dead_code)]
    Shutdown,
}

/// Messages queued for the network sender task.
#[derive(Debug)]
pub enum GameMessage {
    SendPacket { packet: Packet, addr: SocketAddr },
}

/// Server tuning knobs surfaced on the command line.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Live-room ceiling; creates beyond it are refused.
    pub max_rooms: usize,
    /// How long a silent connection stays bound (clients ping while idle).
    pub session_timeout: Duration,
    /// How long a room with no connections lingers before teardown.
    pub room_idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_rooms: 1024,
            session_timeout: Duration::from_secs(30),
            room_idle_timeout: Duration::from_secs(300),
        }
    }
}

/// Main server coordinating networking, sessions and room actors.
pub struct Server {
    socket: Arc<UdpSocket>,
    sessions: SessionManager,
    registry: RoomRegistry,
    config: ServerConfig,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        config: ServerConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", addr);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            sessions: SessionManager::new(config.session_timeout),
            registry: RoomRegistry::new(config.max_rooms),
            config,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    /// The bound address; useful when binding to port 0 in tests.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Spawns task that continuously listens for incoming packets
    async fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 4096];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes the outgoing packet queue
    async fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    fn reply_error(&self, addr: SocketAddr, message: impl Into<String>) {
        self.send_packet(
            Packet::Error {
                message: message.into(),
            },
            addr,
        );
    }

    /// Routes one decoded packet. Intents for a room go into that room's
    /// mailbox; everything is answered from here otherwise.
    fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::CreateGame { player_name, color } => {
                if !self.registry.has_capacity() {
                    self.reply_error(addr, "Server full");
                    return;
                }

                let id = self.registry.generate_id();
                let room = GameRoom::new(id.clone(), Box::new(EntropyDice::new()));
                let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
                tokio::spawn(run_room(
                    room,
                    cmd_rx,
                    self.server_tx.clone(),
                    self.game_tx.clone(),
                    self.config.room_idle_timeout,
                ));

                let handle = RoomHandle { commands: cmd_tx };
                let _ = handle.commands.send(RoomCommand::Join {
                    addr,
                    player_name,
                    color,
                    created: true,
                });
                self.registry.insert(id, handle);
            }

            Packet::JoinGame {
                game_id,
                player_name,
                color,
            } => {
                let id = RoomRegistry::normalize_id(&game_id);
                match self.registry.get(&id) {
                    Some(handle) => {
                        let _ = handle.commands.send(RoomCommand::Join {
                            addr,
                            player_name,
                            color,
                            created: false,
                        });
                    }
                    None => self.reply_error(addr, GameError::RoomNotFound.to_string()),
                }
            }

            Packet::RejoinGame { game_id, player_id } => {
                let id = RoomRegistry::normalize_id(&game_id);
                match self.registry.get(&id) {
                    Some(handle) => {
                        let _ = handle.commands.send(RoomCommand::Rejoin { addr, player_id });
                    }
                    None => self.reply_error(addr, GameError::RoomNotFound.to_string()),
                }
            }

            Packet::StartGame => self.forward(addr, |player_id| RoomCommand::Start {
                addr,
                player_id,
            }),

            Packet::RollDice => self.forward(addr, |player_id| RoomCommand::Roll {
                addr,
                player_id,
            }),

            Packet::MovePiece { color, piece, from } => {
                self.forward(addr, |player_id| RoomCommand::Move {
                    addr,
                    player_id,
                    color,
                    piece,
                    from,
                })
            }

            Packet::PassTurn => self.forward(addr, |player_id| RoomCommand::Pass {
                addr,
                player_id,
            }),

            Packet::Chat { message } => self.forward(addr, |player_id| RoomCommand::Chat {
                addr,
                player_id,
                message,
            }),

            Packet::Ping => {
                self.sessions.touch(addr);
                self.send_packet(Packet::Pong, addr);
            }

            Packet::Leave => {
                if let Some(session) = self.sessions.remove(addr) {
                    if let Some(handle) = self.registry.get(&session.room_id) {
                        let _ = handle.commands.send(RoomCommand::Leave {
                            player_id: session.player_id,
                        });
                    }
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    /// Resolve the sender's session and hand the intent to its room.
    fn forward(&mut self, addr: SocketAddr, make: impl FnOnce(u32) -> RoomCommand) {
        self.sessions.touch(addr);
        match self.sessions.lookup(addr) {
            Some((room_id, player_id)) => match self.registry.get(&room_id) {
                Some(handle) => {
                    let _ = handle.commands.send(make(player_id));
                }
                None => self.reply_error(addr, GameError::RoomNotFound.to_string()),
            },
            None => self.reply_error(addr, "Player not in any game"),
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver().await;
        self.spawn_network_sender().await;

        let mut sweep = interval(Duration::from_secs(1));
        let mut sweeps: u64 = 0;

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr);
                        },
                        Some(ServerMessage::SessionBound { addr, room_id, player_id }) => {
                            self.sessions.bind(addr, room_id, player_id);
                        },
                        Some(ServerMessage::RoomClosed { room_id }) => {
                            self.registry.remove(&room_id);
                            for addr in self.sessions.remove_room(&room_id) {
                                debug!("Dropped session {} with room {}", addr, room_id);
                            }
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = sweep.tick() => {
                    for session in self.sessions.check_timeouts() {
                        if let Some(handle) = self.registry.get(&session.room_id) {
                            let _ = handle.commands.send(RoomCommand::Disconnected {
                                addr: session.addr,
                                player_id: session.player_id,
                            });
                        }
                    }

                    // Periodic health stats
                    sweeps += 1;
                    if sweeps % 60 == 0 && !self.registry.is_empty() {
                        debug!(
                            "{} rooms live, {} sessions bound",
                            self.registry.len(),
                            self.sessions.len()
                        );
                    }
                },
            }
        }

        Ok(())
    }
}
