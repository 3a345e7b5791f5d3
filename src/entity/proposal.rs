use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    #[default]
    Created,
    Published,
    Canceled,
    Agreed,
    Declined,
}

impl ProposalStatus {
    /// Legal moves: CREATED -> PUBLISHED, then PUBLISHED -> CANCELED,
    /// PUBLISHED -> AGREED or PUBLISHED -> DECLINED.
    pub fn can_transition(self, to: ProposalStatus) -> bool {
        matches!(
            (self, to),
            (ProposalStatus::Created, ProposalStatus::Published)
                | (ProposalStatus::Published, ProposalStatus::Canceled)
                | (ProposalStatus::Published, ProposalStatus::Agreed)
                | (ProposalStatus::Published, ProposalStatus::Declined)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProposalStatus::Canceled | ProposalStatus::Agreed | ProposalStatus::Declined
        )
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProposalStatus::Created => write!(f, "CREATED"),
            ProposalStatus::Published => write!(f, "PUBLISHED"),
            ProposalStatus::Canceled => write!(f, "CANCELED"),
            ProposalStatus::Agreed => write!(f, "AGREED"),
            ProposalStatus::Declined => write!(f, "DECLINED"),
        }
    }
}

impl std::str::FromStr for ProposalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CREATED" => Ok(ProposalStatus::Created),
            "PUBLISHED" => Ok(ProposalStatus::Published),
            "CANCELED" => Ok(ProposalStatus::Canceled),
            "AGREED" => Ok(ProposalStatus::Agreed),
            "DECLINED" => Ok(ProposalStatus::Declined),
            _ => Err(format!("Invalid proposal status: {}", s)),
        }
    }
}

/// A bid submitted against a tender by an employee on behalf of an
/// organization. `tender_id`, `organization_id` and `author_id` are fixed at
/// creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub tender_id: Uuid,
    pub organization_id: Uuid,
    pub author_id: Uuid,
    pub status: ProposalStatus,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Proposal {
    pub fn new(
        title: String,
        description: String,
        tender_id: Uuid,
        organization_id: Uuid,
        author_id: Uuid,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            tender_id,
            organization_id,
            author_id,
            status: ProposalStatus::default(),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }
}
