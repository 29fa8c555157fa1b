//! HTTP request handlers, grouped by resource.

pub mod impact;
pub mod notification;
pub mod repair;
