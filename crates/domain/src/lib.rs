pub mod activity;
pub mod blocked;
pub mod config;
pub mod exchange;
pub mod preference;
pub mod profile;
pub mod room;
pub mod scheduler;
pub mod slots;
pub mod travel;

pub use activity::*;
pub use blocked::*;
pub use config::*;
pub use exchange::*;
pub use preference::*;
pub use profile::*;
pub use room::*;
pub use scheduler::*;
pub use slots::*;
pub use travel::*;
