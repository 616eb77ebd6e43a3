//! Headless demo client: drives two players through a short game against a
//! running server, printing every event it receives. Useful for exercising
//! the protocol end to end without a UI.

use bincode::{deserialize, serialize};
use shared::{Color, FromLocation, GameSnapshot, Packet};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

async fn send(socket: &UdpSocket, server: SocketAddr, packet: &Packet) {
    let data = serialize(packet).expect("serialize");
    socket.send_to(&data, server).await.expect("send");
}

async fn recv(socket: &UdpSocket) -> Option<Packet> {
    let mut buf = [0u8; 4096];
    match timeout(Duration::from_secs(2), socket.recv_from(&mut buf)).await {
        Ok(Ok((len, _))) => deserialize::<Packet>(&buf[0..len]).ok(),
        _ => None,
    }
}

/// Discard whatever broadcasts have piled up on a socket.
async fn drain(socket: &UdpSocket) {
    let mut buf = [0u8; 4096];
    while timeout(Duration::from_millis(50), socket.recv_from(&mut buf))
        .await
        .map(|r| r.is_ok())
        .unwrap_or(false)
    {}
}

/// Pick a piece the snapshot says can be played with this roll.
fn choose_move(state: &GameSnapshot, color: Color, dice: u8) -> Option<(u8, FromLocation)> {
    let view = &state.board[&color];
    if dice == 6 {
        if let Some(&piece) = view.home.first() {
            return Some((piece, FromLocation::Home));
        }
    }
    if let Some(&piece) = view.path.keys().next() {
        return Some((piece, FromLocation::Path));
    }
    if let Some(&piece) = view.stretch.keys().next() {
        return Some((piece, FromLocation::Stretch));
    }
    None
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let server_addr = "127.0.0.1:8080".parse::<SocketAddr>()?;

    let host = UdpSocket::bind("0.0.0.0:0").await?;
    let guest = UdpSocket::bind("0.0.0.0:0").await?;
    println!("Host socket {}", host.local_addr()?);
    println!("Guest socket {}", guest.local_addr()?);

    // Host creates the room.
    send(
        &host,
        server_addr,
        &Packet::CreateGame {
            player_name: "demo-host".to_string(),
            color: Color::Red,
        },
    )
    .await;

    let game_id = match recv(&host).await {
        Some(Packet::GameCreated {
            game_id, player_id, ..
        }) => {
            println!("Room created: {} (player {})", game_id, player_id);
            game_id
        }
        other => {
            println!("Expected GameCreated but got: {:?}", other);
            return Ok(());
        }
    };

    // Guest joins it.
    send(
        &guest,
        server_addr,
        &Packet::JoinGame {
            game_id,
            player_name: "demo-guest".to_string(),
            color: Color::Blue,
        },
    )
    .await;

    match recv(&guest).await {
        Some(Packet::GameJoined { player_id, .. }) => {
            println!("Guest joined as player {}", player_id)
        }
        other => {
            println!("Expected GameJoined but got: {:?}", other);
            return Ok(());
        }
    }
    drain(&host).await;

    send(&host, server_addr, &Packet::StartGame).await;

    let mut state = match recv(&host).await {
        Some(Packet::GameStarted { state }) => state,
        other => {
            println!("Expected GameStarted but got: {:?}", other);
            return Ok(());
        }
    };
    println!("Game started in room {}", state.game_id);

    // Alternate turns, moving whatever the server allows. All broadcasts are
    // tracked on the host socket; the guest socket is drained each round.
    for round in 0..30 {
        let mover = state.current_player;
        let (socket, name) = if mover == 0 {
            (&host, "host")
        } else {
            (&guest, "guest")
        };
        let color = state.players[mover].color;

        send(socket, server_addr, &Packet::RollDice).await;

        loop {
            let Some(packet) = recv(&host).await else {
                // The server is waiting on a move we failed to produce; give
                // the turn up so the demo keeps flowing.
                send(socket, server_addr, &Packet::PassTurn).await;
                break;
            };
            match packet {
                Packet::DiceRolled {
                    dice_value,
                    state: fresh,
                    ..
                } => {
                    println!("[{}] {} rolled {}", round, name, dice_value);
                    state = fresh;
                    if let Some((piece, from)) = choose_move(&state, color, dice_value) {
                        send(
                            socket,
                            server_addr,
                            &Packet::MovePiece { color, piece, from },
                        )
                        .await;
                    }
                }
                Packet::PieceMoved {
                    color,
                    piece,
                    capture,
                    state: fresh,
                } => {
                    println!(
                        "[{}] {} moved piece {}{}",
                        round,
                        color,
                        piece,
                        if capture { " (capture!)" } else { "" }
                    );
                    state = fresh;
                }
                Packet::TurnChanged {
                    state: fresh,
                    message,
                } => {
                    if let Some(message) = message {
                        println!("[{}] {}", round, message);
                    }
                    state = fresh;
                    break;
                }
                Packet::Error { message } => {
                    println!("[{}] server: {}", round, message);
                }
                other => println!("[{}] {:?}", round, other),
            }

            if state.winner.is_some() {
                break;
            }
        }

        drain(&guest).await;

        if let Some(winner) = state.winner {
            println!("Winner: {}", winner);
            break;
        }
    }

    send(&host, server_addr, &Packet::Leave).await;
    send(&guest, server_addr, &Packet::Leave).await;
    println!("Demo finished");

    Ok(())
}
