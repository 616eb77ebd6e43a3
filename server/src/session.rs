//! Session layer: maps connections to their (room, player) identity.
//!
//! Sessions hold only back-references; game state is owned by the rooms. A
//! session that stops sending packets (clients ping while idle) is swept out
//! after the configured timeout, which the server turns into a room-level
//! disconnect event.

use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// One connection's binding to a room member.
#[derive(Debug, Clone)]
pub struct Session {
    pub addr: SocketAddr,
    pub room_id: String,
    pub player_id: u32,
    pub last_seen: Instant,
}

impl Session {
    fn new(addr: SocketAddr, room_id: String, player_id: u32) -> Self {
        Self {
            addr,
            room_id,
            player_id,
            last_seen: Instant::now(),
        }
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

pub struct SessionManager {
    sessions: HashMap<SocketAddr, Session>,
    timeout: Duration,
}

impl SessionManager {
    pub fn new(timeout: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            timeout,
        }
    }

    /// Bind a connection to a room member, replacing any previous binding for
    /// that address (rejoin from a recycled port).
    pub fn bind(&mut self, addr: SocketAddr, room_id: String, player_id: u32) {
        info!(
            "Session {} bound to room {} player {}",
            addr, room_id, player_id
        );
        self.sessions
            .insert(addr, Session::new(addr, room_id, player_id));
    }

    /// The (room, player) identity behind an address, if bound.
    pub fn lookup(&self, addr: SocketAddr) -> Option<(String, u32)> {
        self.sessions
            .get(&addr)
            .map(|s| (s.room_id.clone(), s.player_id))
    }

    /// Refresh liveness for an address. Returns false for unknown sessions.
    pub fn touch(&mut self, addr: SocketAddr) -> bool {
        if let Some(session) = self.sessions.get_mut(&addr) {
            session.last_seen = Instant::now();
            true
        } else {
            false
        }
    }

    pub fn remove(&mut self, addr: SocketAddr) -> Option<Session> {
        let session = self.sessions.remove(&addr);
        if let Some(ref s) = session {
            info!("Session {} unbound from room {}", addr, s.room_id);
        }
        session
    }

    /// Drop every session bound to a destroyed room.
    pub fn remove_room(&mut self, room_id: &str) -> Vec<SocketAddr> {
        let addrs: Vec<SocketAddr> = self
            .sessions
            .values()
            .filter(|s| s.room_id == room_id)
            .map(|s| s.addr)
            .collect();
        for addr in &addrs {
            self.sessions.remove(addr);
        }
        addrs
    }

    /// Remove and return every session past the liveness timeout.
    pub fn check_timeouts(&mut self) -> Vec<Session> {
        let timeout = self.timeout;
        let timed_out: Vec<SocketAddr> = self
            .sessions
            .values()
            .filter(|s| s.is_timed_out(timeout))
            .map(|s| s.addr)
            .collect();

        timed_out
            .iter()
            .filter_map(|addr| {
                let session = self.sessions.remove(addr);
                if let Some(ref s) = session {
                    info!("Session {} timed out (room {})", addr, s.room_id);
                }
                session
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    #[test]
    fn test_bind_and_lookup() {
        let mut sessions = SessionManager::new(Duration::from_secs(30));
        sessions.bind(test_addr(), "abc12345".to_string(), 1);

        assert_eq!(
            sessions.lookup(test_addr()),
            Some(("abc12345".to_string(), 1))
        );
        assert_eq!(sessions.lookup(test_addr2()), None);
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn test_rebind_replaces_identity() {
        let mut sessions = SessionManager::new(Duration::from_secs(30));
        sessions.bind(test_addr(), "abc12345".to_string(), 1);
        sessions.bind(test_addr(), "zzz99999".to_string(), 7);

        assert_eq!(
            sessions.lookup(test_addr()),
            Some(("zzz99999".to_string(), 7))
        );
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn test_touch_known_and_unknown() {
        let mut sessions = SessionManager::new(Duration::from_secs(30));
        sessions.bind(test_addr(), "abc12345".to_string(), 1);

        assert!(sessions.touch(test_addr()));
        assert!(!sessions.touch(test_addr2()));
    }

    #[test]
    fn test_remove() {
        let mut sessions = SessionManager::new(Duration::from_secs(30));
        sessions.bind(test_addr(), "abc12345".to_string(), 1);

        let removed = sessions.remove(test_addr()).unwrap();
        assert_eq!(removed.player_id, 1);
        assert!(sessions.is_empty());
        assert!(sessions.remove(test_addr()).is_none());
    }

    #[test]
    fn test_remove_room_drops_all_members() {
        let mut sessions = SessionManager::new(Duration::from_secs(30));
        sessions.bind(test_addr(), "abc12345".to_string(), 1);
        sessions.bind(test_addr2(), "abc12345".to_string(), 2);
        let other: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        sessions.bind(other, "zzz99999".to_string(), 1);

        let dropped = sessions.remove_room("abc12345");
        assert_eq!(dropped.len(), 2);
        assert_eq!(sessions.len(), 1);
        assert!(sessions.lookup(other).is_some());
    }

    #[test]
    fn test_check_timeouts() {
        let mut sessions = SessionManager::new(Duration::from_secs(1));
        sessions.bind(test_addr(), "abc12345".to_string(), 1);
        sessions.bind(test_addr2(), "abc12345".to_string(), 2);

        // Age one session past the timeout by hand.
        sessions
            .sessions
            .get_mut(&test_addr())
            .unwrap()
            .last_seen = Instant::now() - Duration::from_secs(2);

        let timed_out = sessions.check_timeouts();
        assert_eq!(timed_out.len(), 1);
        assert_eq!(timed_out[0].player_id, 1);
        assert_eq!(sessions.len(), 1);
    }
}
