//! Travel-time resolution: map-provider lookups with per-room memoization,
//! bounded concurrency, and a silent Haversine fallback.

use domain::{CoordinationConfig, MissingCoords, Room, TravelLeg, TravelMatrix, UserProfile};
use integrations::MapsClient;
use shared::types::{
    round_up_to_step, Coordinates, RoomId, TravelMode, UserId, SLOT_GRANULARITY_MINUTES,
};
use shared::DomainError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};

use crate::metrics::record_travel_lookup;

type CacheKey = (i64, i64, i64, i64, TravelMode);

/// Per-room lookup state: the memo cache and the provider-call limiter.
struct RoomTravelState {
    cache: Mutex<HashMap<CacheKey, TravelLeg>>,
    limiter: Semaphore,
}

/// Resolves travel legs for rooms. One instance per process; the map client
/// and its connection pool are shared, caches and limiters are per room.
pub struct TravelService {
    maps: Option<Arc<MapsClient>>,
    config: Arc<CoordinationConfig>,
    rooms: Mutex<HashMap<RoomId, Arc<RoomTravelState>>>,
}

impl TravelService {
    pub fn new(maps: Option<Arc<MapsClient>>, config: Arc<CoordinationConfig>) -> Self {
        Self {
            maps,
            config,
            rooms: Mutex::new(HashMap::new()),
        }
    }

    async fn room_state(&self, room_id: RoomId) -> Arc<RoomTravelState> {
        let mut rooms = self.rooms.lock().await;
        rooms
            .entry(room_id)
            .or_insert_with(|| {
                Arc::new(RoomTravelState {
                    cache: Mutex::new(HashMap::new()),
                    limiter: Semaphore::new(self.config.travel_concurrency.max(1)),
                })
            })
            .clone()
    }

    /// One leg between two points. Identical points are always zero; provider
    /// failures fall back to the Haversine estimate and the operation
    /// continues.
    pub async fn leg(
        &self,
        room_id: RoomId,
        from: &Coordinates,
        to: &Coordinates,
        mode: TravelMode,
    ) -> TravelLeg {
        if from == to || mode == TravelMode::None {
            return TravelLeg::minutes(0);
        }

        let (flat, flng) = from.rounded4();
        let (tlat, tlng) = to.rounded4();
        let key: CacheKey = (flat, flng, tlat, tlng, mode);

        let state = self.room_state(room_id).await;
        if let Some(cached) = state.cache.lock().await.get(&key) {
            record_travel_lookup("cache");
            return cached.clone();
        }

        let leg = match &self.maps {
            Some(client) => {
                let _permit = state.limiter.acquire().await;
                match client.get_route(from, to, mode).await {
                    Ok(route) => {
                        record_travel_lookup("api");
                        TravelLeg {
                            minutes: round_up_to_step(
                                route.duration_minutes.max(0),
                                SLOT_GRANULARITY_MINUTES,
                            ),
                            distance_text: route.distance_text,
                        }
                    }
                    Err(err) => {
                        tracing::warn!(%err, %mode, "map provider failed, using haversine fallback");
                        record_travel_lookup("fallback");
                        TravelLeg::minutes(from.estimate_travel_minutes(to, mode))
                    }
                }
            }
            None => {
                record_travel_lookup("fallback");
                TravelLeg::minutes(from.estimate_travel_minutes(to, mode))
            }
        };

        state.cache.lock().await.insert(key, leg.clone());
        leg
    }

    /// Resolve the full pairwise matrix for a room's roster. With travel mode
    /// off this is empty; participants without coordinates are skipped or
    /// rejected per the configured policy.
    pub async fn matrix_for_room(
        &self,
        room: &Room,
        profiles: &HashMap<UserId, UserProfile>,
    ) -> Result<TravelMatrix, DomainError> {
        let mode = room.effective_travel_mode();
        let mut matrix = TravelMatrix::new();
        if mode == TravelMode::None {
            return Ok(matrix);
        }

        let mut participants: Vec<UserId> = vec![room.owner_id];
        participants.extend(room.members.iter().map(|m| m.user_id));

        let mut located: Vec<(UserId, Coordinates)> = Vec::new();
        for user_id in participants {
            match profiles.get(&user_id).and_then(|p| p.coordinates) {
                Some(coords) => located.push((user_id, coords)),
                None => match self.config.missing_coords {
                    MissingCoords::Skip => {
                        tracing::warn!(%user_id, "no coordinates, travel legs skipped");
                    }
                    MissingCoords::Reject => {
                        return Err(DomainError::MissingCoordinates(
                            room.label_of(user_id),
                        ));
                    }
                },
            }
        }

        for (from_id, from_coords) in &located {
            for (to_id, to_coords) in &located {
                if from_id == to_id {
                    continue;
                }
                let leg = self.leg(room.id, from_coords, to_coords, mode).await;
                matrix.insert(*from_id, *to_id, leg);
            }
        }

        Ok(matrix)
    }
}
