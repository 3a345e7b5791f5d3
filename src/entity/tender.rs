use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenderStatus {
    #[default]
    Created,
    Published,
    Closed,
}

impl TenderStatus {
    /// Whether the state machine permits moving from `self` to `to`.
    /// The only legal path is CREATED -> PUBLISHED -> CLOSED.
    pub fn can_transition(self, to: TenderStatus) -> bool {
        matches!(
            (self, to),
            (TenderStatus::Created, TenderStatus::Published)
                | (TenderStatus::Published, TenderStatus::Closed)
        )
    }

    /// Terminal statuses admit no further edits or transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, TenderStatus::Closed)
    }
}

impl std::fmt::Display for TenderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TenderStatus::Created => write!(f, "CREATED"),
            TenderStatus::Published => write!(f, "PUBLISHED"),
            TenderStatus::Closed => write!(f, "CLOSED"),
        }
    }
}

impl std::str::FromStr for TenderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CREATED" => Ok(TenderStatus::Created),
            "PUBLISHED" => Ok(TenderStatus::Published),
            "CLOSED" => Ok(TenderStatus::Closed),
            _ => Err(format!("Invalid tender status: {}", s)),
        }
    }
}

/// A request for bids owned by an organization. Only PUBLISHED tenders are
/// visible to non-owners; `version` increases on every content edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tender {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TenderStatus,
    pub organization_id: Uuid,
    pub version: u32,
    pub service_type: String,
    pub creator_username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tender {
    pub fn new(
        title: String,
        description: String,
        organization_id: Uuid,
        service_type: String,
        creator_username: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            status: TenderStatus::default(),
            organization_id,
            version: 1,
            service_type,
            creator_username,
            created_at: now,
            updated_at: now,
        }
    }
}
