//! Ownership checks.

use axum::{
    Extension,
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use barter_types::api::Claims;
use barter_types::models::{Ad, ExchangeProposal};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{blocking, paths};

pub const AD_NOT_FOUND: &str = "Ad not found.";
pub const AD_NO_RIGHTS: &str =
    "You have no rights to edit this ad. Only the author can edit or delete their own ads.";
pub const PROPOSAL_NOT_FOUND: &str = "Proposal not found.";

/// Route middleware for ad edit/delete. Loads the ad named in the path and
/// lets the request through only for its owner; the handler receives the
/// loaded ad as `Extension<Ad>`.
///
/// Missing ad: redirect to the listing. Someone else's ad: redirect to the
/// ad's page. Both carry an error flash.
pub async fn require_ad_author(
    State(state): State<AppState>,
    Path(ad_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ad = load_ad(&state, ad_id).await?;

    if !ad.is_owned_by(claims.sub) {
        warn!(
            "User {} tried to modify ad {} owned by {}",
            claims.username, ad.id, ad.owner_username
        );
        return Err(ApiError::forbidden(paths::ad(ad_id), AD_NO_RIGHTS));
    }

    req.extensions_mut().insert(ad);
    Ok(next.run(req).await)
}

pub(crate) async fn load_ad(state: &AppState, ad_id: i64) -> Result<Ad, ApiError> {
    blocking(state, move |db| db.get_ad(ad_id))
        .await?
        .ok_or_else(|| ApiError::not_found(paths::LISTING, AD_NOT_FOUND))
}

pub(crate) async fn load_proposal(
    state: &AppState,
    proposal_id: i64,
) -> Result<ExchangeProposal, ApiError> {
    blocking(state, move |db| db.get_proposal(proposal_id))
        .await?
        .ok_or_else(|| ApiError::not_found(paths::PROPOSALS, PROPOSAL_NOT_FOUND))
}
