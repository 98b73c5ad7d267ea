//! Data models for the notification and attendee tables

mod attendee;
mod notification;

pub use attendee::*;
pub use notification::*;
