use shared::types::RoomId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Per-room readers-writer locks.
///
/// A writer holds the lock across validate → mutate → travel recompute →
/// persist → publish, so readers never observe a half-recomputed date and
/// concurrent mutations on one room serialize. Locks for different rooms are
/// independent; there are no cross-room transactions.
pub struct RoomLocks {
    locks: Mutex<HashMap<RoomId, Arc<RwLock<()>>>>,
}

impl RoomLocks {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn for_room(&self, room_id: RoomId) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(room_id)
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }
}

impl Default for RoomLocks {
    fn default() -> Self {
        Self::new()
    }
}
