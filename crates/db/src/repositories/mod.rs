pub mod activity_log_repo;
pub mod profile_repo;
pub mod room_repo;

pub use activity_log_repo::ActivityLogRepository;
pub use profile_repo::ProfileRepository;
pub use room_repo::RoomRepository;
