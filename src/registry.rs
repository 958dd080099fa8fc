//! Process-wide room registry.
//!
//! Owns every live room behind a coarse mutex held only for map reads and
//! writes. Codes are allocated by rejection sampling: draw a random
//! 6-character code, retry on the (rare) collision.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::protocol::{room_codes, GameError, RoomStatus, RoomSummary};
use crate::room::Room;

pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, Arc<Room>>>,
    max_rooms: usize,
}

impl RoomRegistry {
    pub fn new(max_rooms: usize) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            max_rooms,
        }
    }

    /// Allocate a fresh code and insert the room `build` produces for it.
    pub fn create(&self, build: impl FnOnce(String) -> Room) -> Result<Arc<Room>, GameError> {
        let mut rooms = self.lock();
        if rooms.len() >= self.max_rooms {
            return Err(GameError::CapacityExceeded);
        }

        let code = loop {
            let candidate = room_codes::generate_room_code();
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let room = Arc::new(build(code.clone()));
        rooms.insert(code.clone(), Arc::clone(&room));
        tracing::info!(room_code = %code, live_rooms = rooms.len(), "room created");
        Ok(room)
    }

    /// Look up a room; codes are case-insensitive on the way in.
    pub fn get(&self, code: &str) -> Option<Arc<Room>> {
        let normalized = code.trim().to_ascii_uppercase();
        self.lock().get(&normalized).cloned()
    }

    /// Remove a room, cancel its timers and outstanding generations, and
    /// close its bus. Idempotent.
    pub fn delete(&self, code: &str) {
        let normalized = code.trim().to_ascii_uppercase();
        let removed = self.lock().remove(&normalized);
        if let Some(room) = removed {
            room.cancel.cancel();
            room.bus.close();
            tracing::info!(room_code = %normalized, "room deleted");
        }
    }

    /// Waiting rooms, oldest first, one page at a time.
    ///
    /// Pages are 1-indexed; `total_pages` is at least 1 so clients can
    /// always render a pager.
    pub fn list_waiting(&self, page: usize, per_page: usize) -> (Vec<RoomSummary>, usize) {
        let per_page = per_page.max(1);
        let rooms = self.lock();

        let mut waiting: Vec<RoomSummary> = rooms
            .values()
            .filter_map(|room| {
                let state = room.lock_state();
                (state.status == RoomStatus::Waiting).then(|| RoomSummary {
                    code: room.code.clone(),
                    status: state.status,
                    humans_joined: state.seated_human_count() as u8,
                    max_humans: state.max_humans,
                    total_players: state.total_players,
                    created_at: room.created_at,
                })
            })
            .collect();
        drop(rooms);

        waiting.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.code.cmp(&b.code)));

        let total_pages = waiting.len().div_ceil(per_page).max(1);
        let start = page.saturating_sub(1).saturating_mul(per_page);
        let page_items = waiting.into_iter().skip(start).take(per_page).collect();
        (page_items, total_pages)
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Room>>> {
        self.rooms
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::llm::ScriptedClient;
    use crate::protocol::room_codes::is_valid_room_code;

    fn build_room(code: String) -> Room {
        Room::new(
            code,
            1,
            5,
            &GameConfig::default(),
            Arc::new(ScriptedClient::new()),
        )
    }

    #[test]
    fn create_allocates_unique_codes() {
        let registry = RoomRegistry::new(64);
        let mut codes = std::collections::HashSet::new();
        for _ in 0..32 {
            let room = registry.create(build_room).unwrap();
            assert!(is_valid_room_code(&room.code));
            assert!(codes.insert(room.code.clone()), "duplicate {}", room.code);
        }
    }

    #[test]
    fn capacity_cap_is_enforced() {
        let registry = RoomRegistry::new(2);
        registry.create(build_room).unwrap();
        registry.create(build_room).unwrap();
        assert_eq!(
            registry.create(build_room).unwrap_err(),
            GameError::CapacityExceeded
        );
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = RoomRegistry::new(8);
        let room = registry.create(build_room).unwrap();
        assert!(registry.get(&room.code.to_lowercase()).is_some());
        assert!(registry.get(" nosuch ").is_none());
    }

    #[test]
    fn delete_is_idempotent_and_cancels() {
        let registry = RoomRegistry::new(8);
        let room = registry.create(build_room).unwrap();
        let code = room.code.clone();

        registry.delete(&code);
        assert!(registry.get(&code).is_none());
        assert!(room.cancel.is_cancelled());
        registry.delete(&code);
    }

    #[test]
    fn listing_pages_waiting_rooms_oldest_first() {
        let registry = RoomRegistry::new(16);
        for _ in 0..5 {
            registry.create(build_room).unwrap();
        }

        let (first_page, total_pages) = registry.list_waiting(1, 2);
        assert_eq!(first_page.len(), 2);
        assert_eq!(total_pages, 3);
        assert!(first_page[0].created_at <= first_page[1].created_at);

        let (last_page, _) = registry.list_waiting(3, 2);
        assert_eq!(last_page.len(), 1);

        let (beyond, _) = registry.list_waiting(9, 2);
        assert!(beyond.is_empty());
    }

    #[test]
    fn empty_listing_reports_one_page() {
        let registry = RoomRegistry::new(8);
        let (rooms, total_pages) = registry.list_waiting(1, 10);
        assert!(rooms.is_empty());
        assert_eq!(total_pages, 1);
    }
}
