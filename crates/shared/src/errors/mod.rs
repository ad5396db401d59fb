pub mod app_error;
pub mod domain_error;

pub use app_error::{AppError, AppResult};
pub use domain_error::{DomainError, TravelConflict};
