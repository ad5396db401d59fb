mod client;

pub use client::{MapsClient, MapsError, RouteResult};
