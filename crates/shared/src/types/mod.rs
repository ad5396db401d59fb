pub mod coordinates;
pub mod ids;
pub mod time;
pub mod travel_mode;

pub use coordinates::*;
pub use ids::*;
pub use time::*;
pub use travel_mode::*;
