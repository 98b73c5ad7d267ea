pub mod attendee;
pub mod connection;
pub mod notification;
pub mod transaction;

pub use attendee::AttendeeRepository;
pub use connection::{connect_options, ScopedConnection};
pub use notification::NotificationRepository;
pub use transaction::TransactionGuard;
