use chrono::{DateTime, Utc};

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_ACCEPTED: &str = "accepted";
pub const STATUS_DECLINED: &str = "declined";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Relationship {
    pub id: i64,
    pub initiator_id: i64,
    pub initiator_name: String,
    pub initiator_avatar: String,
    pub acceptor_id: i64,
    pub acceptor_name: String,
    pub acceptor_avatar: String,
    pub status: String,
    pub initiator_checked_at: DateTime<Utc>,
    pub acceptor_checked_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

pub struct CreateRelationshipArgs {
    pub initiator_id: i64,
    pub initiator_name: String,
    pub initiator_avatar: String,
    pub acceptor_id: i64,
    pub acceptor_name: String,
    pub acceptor_avatar: String,
}

/// Result of inserting a request, which may collide with the pair key.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(Relationship),
    AlreadyExists,
}

/// Orders a pair the same way the store's unique key does.
pub const fn pair_key(a: i64, b: i64) -> (i64, i64) {
    if a <= b { (a, b) } else { (b, a) }
}
