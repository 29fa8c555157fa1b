pub mod notification_repo;
pub mod repair_request_repo;
pub mod user_repo;

pub use notification_repo::NotificationRepo;
pub use repair_request_repo::RepairRequestRepo;
pub use user_repo::UserRepo;
