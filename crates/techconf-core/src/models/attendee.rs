use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Registered conference participant. Owned by the web application; the
/// function only counts these rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Attendee {
    pub id: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub conference_id: Option<i32>,
    pub submitted_date: Option<NaiveDateTime>,
}
