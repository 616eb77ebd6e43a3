//! Room registry: the arena of live rooms keyed by their short id.
//!
//! The registry only owns mailbox handles; all game state lives inside each
//! room's actor task. Ids are short, URL-safe and collision-checked so they
//! can be shared as invite codes.

use crate::room::RoomCommand;
use log::info;
use rand::Rng;
use std::collections::HashMap;
use tokio::sync::mpsc;

pub const ROOM_ID_LEN: usize = 8;
pub const ROOM_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Mailbox into one room's actor task.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    pub commands: mpsc::UnboundedSender<RoomCommand>,
}

pub struct RoomRegistry {
    rooms: HashMap<String, RoomHandle>,
    max_rooms: usize,
}

impl RoomRegistry {
    pub fn new(max_rooms: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            max_rooms,
        }
    }

    /// Room ids are matched case-insensitively; invite codes get retyped by
    /// hand.
    pub fn normalize_id(id: &str) -> String {
        id.trim().to_ascii_lowercase()
    }

    /// A fresh id not currently in use.
    pub fn generate_id(&self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let id: String = (0..ROOM_ID_LEN)
                .map(|_| ROOM_ID_ALPHABET[rng.gen_range(0..ROOM_ID_ALPHABET.len())] as char)
                .collect();
            if !self.rooms.contains_key(&id) {
                return id;
            }
        }
    }

    pub fn has_capacity(&self) -> bool {
        self.rooms.len() < self.max_rooms
    }

    pub fn insert(&mut self, id: String, handle: RoomHandle) {
        info!("Room {} registered ({} live)", id, self.rooms.len() + 1);
        self.rooms.insert(id, handle);
    }

    pub fn get(&self, id: &str) -> Option<&RoomHandle> {
        self.rooms.get(id)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        if self.rooms.remove(id).is_some() {
            info!("Room {} destroyed ({} live)", id, self.rooms.len());
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> RoomHandle {
        let (tx, _rx) = mpsc::unbounded_channel();
        RoomHandle { commands: tx }
    }

    #[test]
    fn test_generated_ids_are_well_formed() {
        let registry = RoomRegistry::new(16);
        for _ in 0..100 {
            let id = registry.generate_id();
            assert_eq!(id.len(), ROOM_ID_LEN);
            assert!(id.bytes().all(|b| ROOM_ID_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_generated_id_avoids_live_rooms() {
        let mut registry = RoomRegistry::new(16);
        let id = registry.generate_id();
        registry.insert(id.clone(), handle());

        for _ in 0..100 {
            assert_ne!(registry.generate_id(), id);
        }
    }

    #[test]
    fn test_normalize_id() {
        assert_eq!(RoomRegistry::normalize_id("AbC123"), "abc123");
        assert_eq!(RoomRegistry::normalize_id("  abc123  "), "abc123");
    }

    #[test]
    fn test_insert_get_remove() {
        let mut registry = RoomRegistry::new(16);
        registry.insert("abc12345".to_string(), handle());

        assert!(registry.get("abc12345").is_some());
        assert!(registry.get("zzz99999").is_none());
        assert_eq!(registry.len(), 1);

        assert!(registry.remove("abc12345"));
        assert!(!registry.remove("abc12345"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_capacity() {
        let mut registry = RoomRegistry::new(2);
        assert!(registry.has_capacity());
        registry.insert("a".to_string(), handle());
        registry.insert("b".to_string(), handle());
        assert!(!registry.has_capacity());
    }
}
