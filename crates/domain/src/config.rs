use serde::{Deserialize, Serialize};

/// What to do when a participant has no stored coordinates and travel mode
/// is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingCoords {
    /// Treat the leg as zero minutes and keep going.
    #[default]
    Skip,
    /// Fail the operation before any mutation.
    Reject,
}

/// Tunables for scheduling, exchange and travel computation.
#[derive(Debug, Clone)]
pub struct CoordinationConfig {
    /// Default class slot length when the room settings carry none.
    pub class_duration_minutes: i32,
    /// Step used when searching for a free window (auto-placement).
    pub search_step_minutes: i32,
    /// How many alternative windows the scheduler tries per member before
    /// giving up under travel constraints.
    pub max_placement_retries: usize,
    /// Timeout for a single map-provider call.
    pub travel_timeout_secs: u64,
    /// Concurrent map-provider calls allowed per room.
    pub travel_concurrency: usize,
    pub missing_coords: MissingCoords,
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            class_duration_minutes: 60,
            search_step_minutes: 30,
            max_placement_retries: 20,
            travel_timeout_secs: 3,
            travel_concurrency: 4,
            missing_coords: MissingCoords::Skip,
        }
    }
}

impl CoordinationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class_duration(mut self, minutes: i32) -> Self {
        self.class_duration_minutes = minutes;
        self
    }

    pub fn with_search_step(mut self, minutes: i32) -> Self {
        self.search_step_minutes = minutes;
        self
    }

    pub fn with_missing_coords(mut self, policy: MissingCoords) -> Self {
        self.missing_coords = policy;
        self
    }

    pub fn with_travel_timeout(mut self, secs: u64) -> Self {
        self.travel_timeout_secs = secs;
        self
    }

    pub fn with_travel_concurrency(mut self, permits: usize) -> Self {
        self.travel_concurrency = permits;
        self
    }
}
