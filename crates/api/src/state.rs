use domain::CoordinationConfig;
use integrations::{IntentParserClient, MapsClient};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::events::EventBus;
use crate::locks::RoomLocks;
use crate::travel::TravelService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub jwt_secret: String,
    pub parser: Option<Arc<IntentParserClient>>,
    pub travel: Arc<TravelService>,
    pub locks: Arc<RoomLocks>,
    pub events: EventBus,
    pub config: Arc<CoordinationConfig>,
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        jwt_secret: String,
        maps_key: Option<String>,
        parser_url: Option<String>,
        metrics_handle: PrometheusHandle,
    ) -> Self {
        let config = Arc::new(CoordinationConfig::default());
        let timeout = Duration::from_secs(config.travel_timeout_secs);

        let maps = maps_key.map(|key| Arc::new(MapsClient::new(key, timeout)));
        let parser =
            parser_url.map(|url| Arc::new(IntentParserClient::new(url, Duration::from_secs(10))));
        let travel = Arc::new(TravelService::new(maps, config.clone()));

        Self {
            pool,
            jwt_secret,
            parser,
            travel,
            locks: Arc::new(RoomLocks::new()),
            events: EventBus::new(256),
            config,
            metrics_handle,
        }
    }
}
