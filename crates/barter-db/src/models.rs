//! Database row types. These map directly to SQLite rows and are converted
//! into `barter-types` models before leaving the crate.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::Row;
use uuid::Uuid;

use barter_types::models::{Ad, AdRef, Category, Condition, ExchangeProposal, ProposalStatus, User};

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

impl UserRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            password: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    pub fn into_model(self) -> Result<User> {
        Ok(User {
            id: parse_uuid(&self.id)?,
            created_at: parse_timestamp(&self.created_at)?,
            username: self.username,
        })
    }
}

pub struct AdRow {
    pub id: i64,
    pub user_id: String,
    pub username: String,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub category: String,
    pub condition: String,
    pub created_at: String,
}

impl AdRow {
    pub(crate) const SELECT: &'static str = "SELECT a.id, a.user_id, u.username, a.title, a.description, \
         a.image_url, a.category, a.condition, a.created_at
         FROM ads a
         JOIN users u ON u.id = a.user_id";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            username: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            image_url: row.get(5)?,
            category: row.get(6)?,
            condition: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    pub fn into_model(self) -> Result<Ad> {
        Ok(Ad {
            id: self.id,
            owner_id: parse_uuid(&self.user_id)?,
            owner_username: self.username,
            title: self.title,
            description: self.description,
            image_url: self.image_url,
            category: Category::parse(&self.category)
                .ok_or_else(|| anyhow!("Corrupt category '{}' on ad {}", self.category, self.id))?,
            condition: Condition::parse(&self.condition)
                .ok_or_else(|| anyhow!("Corrupt condition '{}' on ad {}", self.condition, self.id))?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

pub struct ProposalRow {
    pub id: i64,
    pub user_id: String,
    pub ad_sender_id: i64,
    pub ad_sender_title: String,
    pub ad_sender_owner: String,
    pub ad_receiver_id: i64,
    pub ad_receiver_title: String,
    pub ad_receiver_owner: String,
    pub comment: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ProposalRow {
    pub(crate) const SELECT: &'static str = "SELECT p.id, p.user_id, \
         p.ad_sender_id, s.title, s.user_id, \
         p.ad_receiver_id, r.title, r.user_id, \
         p.comment, p.status, p.created_at, p.updated_at
         FROM exchange_proposals p
         JOIN ads s ON s.id = p.ad_sender_id
         JOIN ads r ON r.id = p.ad_receiver_id";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            ad_sender_id: row.get(2)?,
            ad_sender_title: row.get(3)?,
            ad_sender_owner: row.get(4)?,
            ad_receiver_id: row.get(5)?,
            ad_receiver_title: row.get(6)?,
            ad_receiver_owner: row.get(7)?,
            comment: row.get(8)?,
            status: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    pub fn into_model(self) -> Result<ExchangeProposal> {
        Ok(ExchangeProposal {
            id: self.id,
            user_id: parse_uuid(&self.user_id)?,
            ad_sender: AdRef {
                id: self.ad_sender_id,
                title: self.ad_sender_title,
                owner_id: parse_uuid(&self.ad_sender_owner)?,
            },
            ad_receiver: AdRef {
                id: self.ad_receiver_id,
                title: self.ad_receiver_title,
                owner_id: parse_uuid(&self.ad_receiver_owner)?,
            },
            comment: self.comment,
            status: ProposalStatus::parse(&self.status)
                .ok_or_else(|| anyhow!("Corrupt status '{}' on proposal {}", self.status, self.id))?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    raw.parse().with_context(|| format!("Corrupt uuid '{}'", raw))
}

/// Accepts RFC 3339 as written by the schema defaults, and SQLite's bare
/// `datetime('now')` format for rows written by hand.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .with_context(|| format!("Corrupt timestamp '{}'", raw))
}
