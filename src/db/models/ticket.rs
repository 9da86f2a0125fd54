//! Ticket models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const STATUS_WAITING: &str = "waiting";
pub const STATUS_CALLED: &str = "called";

/// A queue position drawn by a patient. Status moves `waiting -> called`
/// exactly once and tickets are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub id: i64,
    pub code: String,
    pub status: String,
    pub user_id: String,
    pub created_at: String,
}

impl Ticket {
    pub fn is_waiting(&self) -> bool {
        self.status == STATUS_WAITING
    }
}

/// The row shape pushed to dashboards and over the realtime channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TicketView {
    pub token: String,
    pub status: String,
    pub user: String,
}
