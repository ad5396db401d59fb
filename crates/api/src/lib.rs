pub mod auth;
pub mod error;
pub mod events;
pub mod locks;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod travel;

pub use error::ApiError;
pub use events::{CoordinationEvent, EventBus};
pub use metrics::init_metrics;
pub use state::AppState;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the application router
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let coordination = Router::new()
        // Room lifecycle
        .route("/rooms", post(routes::rooms::create_room))
        .route("/rooms/:id", get(routes::rooms::get_room))
        // Scheduling engine
        .route(
            "/rooms/:id/run-schedule",
            post(routes::schedule::run_schedule),
        )
        .route(
            "/rooms/:id/confirm-schedule",
            post(routes::schedule::confirm_schedule),
        )
        // Exchange planner
        .route(
            "/rooms/:id/parse-exchange-request",
            post(routes::exchange::parse_exchange_request),
        )
        .route(
            "/rooms/:id/smart-exchange",
            post(routes::exchange::smart_exchange),
        )
        // Request state machine
        .route("/requests/:id/approve", post(routes::requests::approve))
        .route("/requests/:id/reject", post(routes::requests::reject))
        .route("/requests/:id", delete(routes::requests::cancel));

    Router::new()
        // Health check
        .route("/health", get(routes::health::health_check))
        // Prometheus metrics
        .route("/metrics", get(routes::prometheus::metrics))
        .nest("/api/coordination", coordination)
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
