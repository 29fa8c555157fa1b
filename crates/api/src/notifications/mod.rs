mod router;

pub use router::{start_notification_router, NotificationRouter};
