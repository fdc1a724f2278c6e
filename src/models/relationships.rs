use crate::common::error::AppError;
use crate::entities::relationships::{
    Relationship as RelationshipEntity, STATUS_ACCEPTED, STATUS_DECLINED, STATUS_PENDING,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipStatus {
    Pending,
    Accepted,
    Declined,
}

impl RelationshipStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RelationshipStatus::Pending => STATUS_PENDING,
            RelationshipStatus::Accepted => STATUS_ACCEPTED,
            RelationshipStatus::Declined => STATUS_DECLINED,
        }
    }

    /// The nullable-boolean wire encoding: pending is `None`.
    pub const fn is_accepted(&self) -> Option<bool> {
        match self {
            RelationshipStatus::Pending => None,
            RelationshipStatus::Accepted => Some(true),
            RelationshipStatus::Declined => Some(false),
        }
    }
}

impl TryFrom<&str> for RelationshipStatus {
    type Error = AppError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            STATUS_PENDING => Ok(RelationshipStatus::Pending),
            STATUS_ACCEPTED => Ok(RelationshipStatus::Accepted),
            STATUS_DECLINED => Ok(RelationshipStatus::Declined),
            _ => Err(AppError::InternalServerError("invalid relationship status")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Relationship {
    pub relationship_id: i64,
    // The user that sent the request
    pub initiator: i64,
    pub initiator_name: String,
    pub initiator_avatar: String,
    // The user that received the request
    pub acceptor: i64,
    pub acceptor_name: String,
    pub acceptor_avatar: String,
    pub status: RelationshipStatus,
    pub initiator_checked_at: DateTime<Utc>,
    pub acceptor_checked_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Relationship {
    /// The last time `viewer` looked at the other side's activity.
    pub fn cursor_for(&self, viewer: i64) -> DateTime<Utc> {
        if viewer == self.initiator {
            self.initiator_checked_at
        } else {
            self.acceptor_checked_at
        }
    }
}

impl TryFrom<RelationshipEntity> for Relationship {
    type Error = AppError;
    fn try_from(value: RelationshipEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            status: RelationshipStatus::try_from(value.status.as_str())?,
            relationship_id: value.id,
            initiator: value.initiator_id,
            initiator_name: value.initiator_name,
            initiator_avatar: value.initiator_avatar,
            acceptor: value.acceptor_id,
            acceptor_name: value.acceptor_name,
            acceptor_avatar: value.acceptor_avatar,
            initiator_checked_at: value.initiator_checked_at,
            acceptor_checked_at: value.acceptor_checked_at,
            created_at: value.created_at,
        })
    }
}

/// A viewer's relationships split the way the friends page shows them.
/// Declined relationships are left out entirely.
#[derive(Debug, Default)]
pub struct FriendsOverview {
    pub friends: Vec<Relationship>,
    pub incoming: Vec<Relationship>,
    pub outgoing: Vec<Relationship>,
}

impl FriendsOverview {
    pub fn partition(viewer: i64, relationships: Vec<Relationship>) -> Self {
        let mut overview = Self::default();
        for relationship in relationships {
            match relationship.status {
                RelationshipStatus::Accepted => overview.friends.push(relationship),
                RelationshipStatus::Pending if relationship.acceptor == viewer => {
                    overview.incoming.push(relationship)
                }
                RelationshipStatus::Pending if relationship.initiator == viewer => {
                    overview.outgoing.push(relationship)
                }
                RelationshipStatus::Pending | RelationshipStatus::Declined => {}
            }
        }
        overview
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipResponse {
    pub id: i64,
    pub initiator: i64,
    pub initiator_name: String,
    pub initiator_avatar: String,
    pub acceptor: i64,
    pub acceptor_name: String,
    pub acceptor_avatar: String,
    pub is_accepted: Option<bool>,
    pub initiator_check_date: DateTime<Utc>,
    pub acceptor_check_date: DateTime<Utc>,
    pub date: DateTime<Utc>,
}

impl From<Relationship> for RelationshipResponse {
    fn from(value: Relationship) -> Self {
        Self {
            id: value.relationship_id,
            initiator: value.initiator,
            initiator_name: value.initiator_name,
            initiator_avatar: value.initiator_avatar,
            acceptor: value.acceptor,
            acceptor_name: value.acceptor_name,
            acceptor_avatar: value.acceptor_avatar,
            is_accepted: value.status.is_accepted(),
            initiator_check_date: value.initiator_checked_at,
            acceptor_check_date: value.acceptor_checked_at,
            date: value.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FriendsOverviewResponse {
    pub friends: Vec<RelationshipResponse>,
    pub incoming: Vec<RelationshipResponse>,
    pub outgoing: Vec<RelationshipResponse>,
}

impl From<FriendsOverview> for FriendsOverviewResponse {
    fn from(value: FriendsOverview) -> Self {
        let convert = |relationships: Vec<Relationship>| -> Vec<RelationshipResponse> {
            relationships
                .into_iter()
                .map(RelationshipResponse::from)
                .collect()
        };
        Self {
            friends: convert(value.friends),
            incoming: convert(value.incoming),
            outgoing: convert(value.outgoing),
        }
    }
}
