//! Station Map
//!
//! Registry of the rooms agents can occupy and move between. Movement
//! targets must name a registered room; every room is reachable in one
//! move (the station is one pressurized complex), adjacency records
//! the physical layout.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A room at the station.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Canonical room name, also the id used in world state.
    pub name: String,
    /// Adjacent room names.
    pub adjacent: Vec<String>,
}

impl Room {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            adjacent: Vec::new(),
        }
    }

    pub fn with_adjacent(mut self, adjacent: Vec<String>) -> Self {
        self.adjacent = adjacent;
        self
    }
}

/// Registry of all rooms at the station.
#[derive(Debug, Clone, Default)]
pub struct StationMap {
    rooms: HashMap<String, Room>,
    /// Registration order, used for stable iteration.
    order: Vec<String>,
}

impl StationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a room. Later registrations replace earlier ones.
    pub fn register(&mut self, room: Room) {
        if !self.rooms.contains_key(&room.name) {
            self.order.push(room.name.clone());
        }
        self.rooms.insert(room.name.clone(), room);
    }

    pub fn get(&self, name: &str) -> Option<&Room> {
        self.rooms.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rooms.contains_key(name)
    }

    /// Room names in registration order.
    pub fn room_names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Resolves a loosely spelled target to a canonical room name.
    ///
    /// Exact match wins; otherwise a unique case-insensitive substring
    /// match is accepted (reasoning backends are sloppy about casing).
    pub fn resolve(&self, target: &str) -> Option<&str> {
        let target = target.trim();
        if let Some(room) = self.rooms.get(target) {
            return Some(&room.name);
        }
        let lowered = target.to_lowercase();
        let mut matches = self
            .order
            .iter()
            .filter(|name| name.to_lowercase().contains(&lowered));
        let first = matches.next()?;
        if matches.next().is_some() {
            return None; // ambiguous
        }
        Some(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::create_station_map;

    #[test]
    fn test_station_has_twelve_rooms() {
        let map = create_station_map();
        assert_eq!(map.len(), 12);
        assert!(map.contains("Mission Control"));
        assert!(map.contains("Agri Lab"));
        assert!(map.contains("Robotics Workshop"));
    }

    #[test]
    fn test_resolve_exact_and_fuzzy() {
        let map = create_station_map();
        assert_eq!(map.resolve("Mess Hall"), Some("Mess Hall"));
        assert_eq!(map.resolve("mess hall"), Some("Mess Hall"));
        assert_eq!(map.resolve("  agri "), Some("Agri Lab"));
        assert_eq!(map.resolve("Cafeteria"), None);
    }

    #[test]
    fn test_resolve_ambiguous_is_none() {
        let mut map = StationMap::new();
        map.register(Room::new("Lab A"));
        map.register(Room::new("Lab B"));
        assert_eq!(map.resolve("lab"), None);
        assert_eq!(map.resolve("Lab A"), Some("Lab A"));
    }
}
