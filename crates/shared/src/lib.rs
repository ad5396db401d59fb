pub mod errors;
pub mod types;

pub use errors::{AppError, DomainError, TravelConflict};
pub use types::*;
