pub mod notification;
pub mod repair_request;
pub mod user;
