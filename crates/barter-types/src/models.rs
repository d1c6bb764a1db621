use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

// -- Choices --

/// Ad category. Stored and serialized as its one-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "E", alias = "electronics")]
    Electronics,
    #[serde(rename = "C", alias = "clothing")]
    Clothing,
    #[serde(rename = "F", alias = "furniture")]
    Furniture,
    #[serde(rename = "B", alias = "books")]
    Books,
    #[serde(rename = "O", alias = "other")]
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Electronics,
        Category::Clothing,
        Category::Furniture,
        Category::Books,
        Category::Other,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::Electronics => "E",
            Self::Clothing => "C",
            Self::Furniture => "F",
            Self::Books => "B",
            Self::Other => "O",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Electronics => "Electronics",
            Self::Clothing => "Clothing",
            Self::Furniture => "Furniture",
            Self::Books => "Books",
            Self::Other => "Other",
        }
    }

    /// Accepts the storage code or the lowercase name.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.code() == value || c.label().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "N", alias = "new")]
    New,
    #[serde(rename = "U", alias = "used")]
    Used,
}

impl Condition {
    pub const ALL: [Condition; 2] = [Condition::New, Condition::Used];

    pub fn code(self) -> &'static str {
        match self {
            Self::New => "N",
            Self::Used => "U",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Used => "Used",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.code() == value || c.label().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle of an exchange proposal. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalStatus {
    #[serde(rename = "P", alias = "pending")]
    Pending,
    #[serde(rename = "A", alias = "accepted")]
    Accepted,
    #[serde(rename = "R", alias = "rejected")]
    Rejected,
}

impl ProposalStatus {
    pub const ALL: [ProposalStatus; 3] = [
        ProposalStatus::Pending,
        ProposalStatus::Accepted,
        ProposalStatus::Rejected,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::Pending => "P",
            Self::Accepted => "A",
            Self::Rejected => "R",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.code() == value || s.label().eq_ignore_ascii_case(value))
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// -- Entities --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ad {
    pub id: i64,
    pub owner_id: Uuid,
    pub owner_username: String,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub category: Category,
    pub condition: Condition,
    pub created_at: DateTime<Utc>,
}

impl Ad {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }
}

/// The slice of an ad carried inside a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdRef {
    pub id: i64,
    pub title: String,
    pub owner_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeProposal {
    pub id: i64,
    pub user_id: Uuid,
    pub ad_sender: AdRef,
    pub ad_receiver: AdRef,
    pub comment: Option<String>,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExchangeProposal {
    /// Only the owner of the target ad may accept or reject.
    pub fn is_receiver(&self, user_id: Uuid) -> bool {
        self.ad_receiver.owner_id == user_id
    }

    pub fn is_sender(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

impl fmt::Display for ExchangeProposal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Proposal from {} to {}",
            self.ad_sender.title, self.ad_receiver.title
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choices_parse_code_and_name() {
        assert_eq!(Category::parse("B"), Some(Category::Books));
        assert_eq!(Category::parse("books"), Some(Category::Books));
        assert_eq!(Category::parse("X"), None);
        assert_eq!(Condition::parse("U"), Some(Condition::Used));
        assert_eq!(ProposalStatus::parse("accepted"), Some(ProposalStatus::Accepted));
    }

    #[test]
    fn choices_serialize_as_codes() {
        assert_eq!(serde_json::to_string(&Category::Furniture).unwrap(), "\"F\"");
        assert_eq!(serde_json::to_string(&ProposalStatus::Rejected).unwrap(), "\"R\"");
        let parsed: Condition = serde_json::from_str("\"new\"").unwrap();
        assert_eq!(parsed, Condition::New);
    }

    #[test]
    fn only_pending_is_open() {
        assert!(!ProposalStatus::Pending.is_terminal());
        assert!(ProposalStatus::Accepted.is_terminal());
        assert!(ProposalStatus::Rejected.is_terminal());
    }
}
