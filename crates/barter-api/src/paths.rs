//! Redirect targets.

pub const LISTING: &str = "/";
pub const PROPOSALS: &str = "/proposals";

pub fn ad(id: i64) -> String {
    format!("/ads/{}", id)
}

pub fn proposal(id: i64) -> String {
    format!("/proposals/{}", id)
}
