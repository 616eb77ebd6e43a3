//! # Ludo Game Server Library
//!
//! This library provides the authoritative server implementation for the
//! multiplayer Ludo board game. It owns the canonical game state, validates
//! every client intent, and broadcasts snapshots to keep all connected
//! clients synchronized.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Rules
//! All game decisions are made here: dice fairness, move legality, captures,
//! safe cells, turn order, and win detection. Clients render snapshots and
//! send intents; they predict nothing and are never trusted.
//!
//! ### Room Management
//! Games run in rooms addressed by short invite codes. Each room is an
//! independent actor task that serializes its own mutations, so concurrent
//! intents for the same room execute one at a time in arrival order while
//! unrelated rooms proceed in parallel.
//!
//! ### Session Tracking
//! Connections are mapped to their (room, player) identity. A dropped
//! connection is a lifecycle event, not an error: mid-game identities survive
//! for reconnection, and timed-out sessions are swept without blocking the
//! room.
//!
//! ## Module Organization
//!
//! - [`board`] - piece locations and track geometry for all four colors
//! - [`rules`] - move legality and effects, including capture resolution
//! - [`turn`] - the turn state machine (bonus rolls, three-six forfeit, win)
//! - [`dice`] - fair dice rolls behind a test-friendly trait
//! - [`room`] - the per-game aggregate and its actor task
//! - [`registry`] - the arena of live rooms keyed by invite code
//! - [`session`] - connection-to-player bindings and timeout sweeping
//! - [`network`] - UDP socket tasks, packet dispatch and the main loop
//! - [`error`] - the domain error taxonomy surfaced to clients
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new("127.0.0.1:8080", ServerConfig::default()).await?;
//!
//!     // Runs the receiver/sender tasks and the dispatch loop:
//!     // - decodes client intents and routes them to room actors
//!     // - rooms validate, mutate, and broadcast fresh snapshots
//!     // - idle rooms and silent sessions are swept automatically
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod board;
pub mod dice;
pub mod error;
pub mod network;
pub mod registry;
pub mod room;
pub mod rules;
pub mod session;
pub mod turn;
