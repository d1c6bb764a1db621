use anyhow::Result;
use rusqlite::Connection;
use rusqlite::types::Value;
use uuid::Uuid;

use barter_types::api::ListingFilters;
use barter_types::forms::AdInput;
use barter_types::models::{Ad, ExchangeProposal, ProposalStatus, User};

use crate::{Database, UNICODE_LOWER};
use crate::models::{AdRow, ProposalRow, UserRow};
use crate::pagination::PageWindow;

const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

/// Outcome of a receiver's accept/reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Applied {
        /// Other pending proposals on the same ad closed by an acceptance.
        auto_rejected: u64,
    },
    /// The proposal had already left `Pending`.
    NotPending,
}

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, password, created_at FROM users WHERE username = ?1",
                [username],
                UserRow::from_row,
            )
            .optional()
        })
    }

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, password, created_at FROM users WHERE id = ?1",
                [id.to_string()],
                UserRow::from_row,
            )
            .optional()
        })?
        .map(UserRow::into_model)
        .transpose()
    }

    // -- Ads --

    pub fn insert_ad(&self, owner_id: Uuid, input: &AdInput) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO ads (user_id, title, description, image_url, category, condition)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    owner_id.to_string(),
                    input.title,
                    input.description,
                    input.image_url,
                    input.category.code(),
                    input.condition.code(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_ad(&self, id: i64) -> Result<Option<Ad>> {
        self.with_conn(|conn| query_ad(conn, id))
    }

    /// Returns false when the ad no longer exists.
    pub fn update_ad(&self, id: i64, input: &AdInput) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE ads SET title = ?2, description = ?3, image_url = ?4, category = ?5, condition = ?6
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    input.title,
                    input.description,
                    input.image_url,
                    input.category.code(),
                    input.condition.code(),
                ],
            )?;
            Ok(changed == 1)
        })
    }

    /// Deletes the ad and, through the foreign keys, every proposal that
    /// offers it or targets it.
    pub fn delete_ad(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM ads WHERE id = ?1", [id])?;
            Ok(changed == 1)
        })
    }

    /// Filtered, newest-first page of ads.
    pub fn list_ads(
        &self,
        filters: &ListingFilters,
        page: Option<&str>,
        per_page: u64,
    ) -> Result<(Vec<Ad>, PageWindow)> {
        let (where_sql, params) = listing_where(filters);

        let (rows, window) = self.with_conn(|conn| {
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM ads a {}", where_sql),
                rusqlite::params_from_iter(params.iter()),
                |r| r.get(0),
            )?;

            let window = PageWindow::resolve(page, total as u64, per_page);

            let sql = format!(
                "{} {} ORDER BY a.created_at DESC, a.id DESC LIMIT {} OFFSET {}",
                AdRow::SELECT,
                where_sql,
                window.per_page,
                window.offset()
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(params.iter()), AdRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((rows, window))
        })?;

        let ads = rows.into_iter().map(AdRow::into_model).collect::<Result<Vec<_>>>()?;
        Ok((ads, window))
    }

    pub fn ads_by_owner(&self, owner_id: Uuid) -> Result<Vec<Ad>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE a.user_id = ?1 ORDER BY a.created_at DESC, a.id DESC",
                AdRow::SELECT
            ))?;
            let rows = stmt
                .query_map([owner_id.to_string()], AdRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?
        .into_iter()
        .map(AdRow::into_model)
        .collect()
    }

    /// Proposals that would disappear with the ad, in either role.
    pub fn count_proposals_for_ad(&self, ad_id: i64) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM exchange_proposals WHERE ad_sender_id = ?1 OR ad_receiver_id = ?1",
                [ad_id],
                |r| r.get(0),
            )?;
            Ok(count as u64)
        })
    }

    // -- Proposals --

    /// Returns `None` when the same pair of ads already has a pending proposal.
    pub fn insert_proposal(
        &self,
        user_id: Uuid,
        ad_sender_id: i64,
        ad_receiver_id: i64,
        comment: Option<&str>,
    ) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO exchange_proposals (user_id, ad_sender_id, ad_receiver_id, comment)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![user_id.to_string(), ad_sender_id, ad_receiver_id, comment],
            );
            match inserted {
                Ok(_) => Ok(Some(conn.last_insert_rowid())),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_proposal(&self, id: i64) -> Result<Option<ExchangeProposal>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("{} WHERE p.id = ?1", ProposalRow::SELECT),
                [id],
                ProposalRow::from_row,
            )
            .optional()
        })?
        .map(ProposalRow::into_model)
        .transpose()
    }

    pub fn has_pending_proposal(&self, ad_sender_id: i64, ad_receiver_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS (
                     SELECT 1 FROM exchange_proposals
                     WHERE ad_sender_id = ?1 AND ad_receiver_id = ?2 AND status = 'P'
                 )",
                [ad_sender_id, ad_receiver_id],
                |r| r.get(0),
            )?;
            Ok(exists)
        })
    }

    /// Proposals the user made, newest first.
    pub fn proposals_sent_by(
        &self,
        user_id: Uuid,
        status: Option<ProposalStatus>,
    ) -> Result<Vec<ExchangeProposal>> {
        self.query_proposals("p.user_id = ?1", user_id.to_string(), status)
    }

    /// Proposals targeting any of the user's ads, newest first.
    pub fn proposals_received_by(
        &self,
        user_id: Uuid,
        status: Option<ProposalStatus>,
    ) -> Result<Vec<ExchangeProposal>> {
        self.query_proposals("r.user_id = ?1", user_id.to_string(), status)
    }

    pub fn proposals_for_ad(&self, ad_receiver_id: i64) -> Result<Vec<ExchangeProposal>> {
        self.query_proposals("p.ad_receiver_id = ?1", ad_receiver_id, None)
    }

    fn query_proposals(
        &self,
        predicate: &str,
        key: impl Into<Value>,
        status: Option<ProposalStatus>,
    ) -> Result<Vec<ExchangeProposal>> {
        let key = key.into();
        let status = status.map(|s| s.code());

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE {} AND (?2 IS NULL OR p.status = ?2)
                 ORDER BY p.created_at DESC, p.id DESC",
                ProposalRow::SELECT,
                predicate
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![key, status], ProposalRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?
        .into_iter()
        .map(ProposalRow::into_model)
        .collect()
    }

    /// Moves a pending proposal to `status`. Accepting also rejects every
    /// other pending proposal on the same receiver ad; both writes share one
    /// transaction.
    pub fn respond_to_proposal(&self, id: i64, status: ProposalStatus) -> Result<StatusChange> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let changed = tx.execute(
                &format!(
                    "UPDATE exchange_proposals SET status = ?2, updated_at = {NOW}
                     WHERE id = ?1 AND status = 'P'"
                ),
                rusqlite::params![id, status.code()],
            )?;
            if changed == 0 {
                return Ok(StatusChange::NotPending);
            }

            let auto_rejected = if status == ProposalStatus::Accepted {
                tx.execute(
                    &format!(
                        "UPDATE exchange_proposals SET status = 'R', updated_at = {NOW}
                         WHERE status = 'P'
                           AND id != ?1
                           AND ad_receiver_id = (SELECT ad_receiver_id FROM exchange_proposals WHERE id = ?1)"
                    ),
                    [id],
                )? as u64
            } else {
                0
            };

            tx.commit()?;
            Ok(StatusChange::Applied { auto_rejected })
        })
    }

    /// Deletes a proposal only while it is still pending.
    pub fn delete_proposal(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM exchange_proposals WHERE id = ?1 AND status = 'P'",
                [id],
            )?;
            Ok(changed == 1)
        })
    }
}

fn query_ad(conn: &Connection, id: i64) -> Result<Option<Ad>> {
    conn.query_row(&format!("{} WHERE a.id = ?1", AdRow::SELECT), [id], AdRow::from_row)
        .optional()?
        .map(AdRow::into_model)
        .transpose()
}

/// WHERE clause and positional parameters for the listing filters.
/// Filters combine with AND; the search text matches title OR description,
/// compared after Unicode lowercasing on both sides.
fn listing_where(filters: &ListingFilters) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut params = Vec::new();

    if let Some(search) = &filters.search {
        let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
        params.push(Value::Text(pattern));
        let n = params.len();
        clauses.push(format!(
            "({f}(a.title) LIKE ?{n} ESCAPE '\\' OR {f}(a.description) LIKE ?{n} ESCAPE '\\')",
            f = UNICODE_LOWER
        ));
    }
    if let Some(category) = filters.category {
        params.push(Value::Text(category.code().to_string()));
        clauses.push(format!("a.category = ?{}", params.len()));
    }
    if let Some(condition) = filters.condition {
        params.push(Value::Text(condition.code().to_string()));
        clauses.push(format!("a.condition = ?{}", params.len()));
    }

    if clauses.is_empty() {
        (String::new(), params)
    } else {
        (format!("WHERE {}", clauses.join(" AND ")), params)
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
