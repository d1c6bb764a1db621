use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use axum_extra::extract::WithRejection;
use tracing::{info, warn};

use barter_db::queries::StatusChange;
use barter_types::api::{
    Claims, ProposalDetailPage, ProposalListPage, ProposalListQuery, ProposalView,
    StatusUpdateRequest,
};
use barter_types::forms::{FieldErrors, NON_FIELD_ERRORS, ProposalForm};
use barter_types::models::{ExchangeProposal, ProposalStatus};

use crate::auth::AppState;
use crate::error::{ApiError, FlashRedirect};
use crate::guard::{load_ad, load_proposal};
use crate::{blocking, paths};

const ALREADY_PROCESSED: &str = "This proposal has already been processed.";
const DUPLICATE_PENDING: &str =
    "You already have a pending proposal offering this ad for this one.";

/// POST /ads/{id}/proposals: Offer one of the caller's ads for ad `{id}`.
pub async fn create_proposal(
    State(state): State<AppState>,
    Path(receiver_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(form), _): WithRejection<Json<ProposalForm>, ApiError>,
) -> Result<FlashRedirect, ApiError> {
    let receiver = load_ad(&state, receiver_id).await?;
    let input = form.validate()?;

    if receiver.is_owned_by(claims.sub) {
        return Err(ApiError::field(
            NON_FIELD_ERRORS,
            "You cannot propose an exchange for your own ad.",
        ));
    }

    let sender_id = input.ad_sender;
    let (sender, duplicate) = blocking(&state, move |db| {
        Ok((
            db.get_ad(sender_id)?,
            db.has_pending_proposal(sender_id, receiver_id)?,
        ))
    })
    .await?;

    let mut errors = FieldErrors::new();
    match &sender {
        None => errors.add(
            "ad_sender",
            "Select a valid choice. That ad is not available.",
        ),
        Some(sender) if !sender.is_owned_by(claims.sub) => {
            errors.add("ad_sender", "You can only offer your own ads.")
        }
        Some(_) if duplicate => errors.add(NON_FIELD_ERRORS, DUPLICATE_PENDING),
        Some(_) => {}
    }
    if !errors.is_empty() {
        return Err(errors.into());
    }

    let user_id = claims.sub;
    let comment = input.comment;
    let proposal_id = blocking(&state, move |db| {
        db.insert_proposal(user_id, sender_id, receiver_id, comment.as_deref())
    })
    .await?
    .ok_or_else(|| ApiError::field(NON_FIELD_ERRORS, DUPLICATE_PENDING))?;

    info!(
        "Proposal {} created by {}: ad {} for ad {}",
        proposal_id, claims.username, sender_id, receiver_id
    );
    Ok(FlashRedirect::success(paths::ad(receiver_id), "Exchange proposal sent."))
}

/// GET /proposals: Proposals the caller sent and received.
pub async fn list_proposals(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ProposalListQuery>,
) -> Result<Json<ProposalListPage>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(ProposalStatus::parse);

    let user_id = claims.sub;
    let (sent, received) = blocking(&state, move |db| {
        Ok((
            db.proposals_sent_by(user_id, status)?,
            db.proposals_received_by(user_id, status)?,
        ))
    })
    .await?;

    Ok(Json(ProposalListPage {
        sent: sent.into_iter().map(ProposalView::from).collect(),
        received: received.into_iter().map(ProposalView::from).collect(),
        status,
    }))
}

/// GET /proposals/{id}: Visible to its author and the target ad's owner.
pub async fn proposal_detail(
    State(state): State<AppState>,
    Path(proposal_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ProposalDetailPage>, ApiError> {
    let proposal = load_proposal(&state, proposal_id).await?;

    let is_sender = proposal.is_sender(claims.sub);
    let is_receiver = proposal.is_receiver(claims.sub);
    if !is_sender && !is_receiver {
        warn!("User {} tried to view proposal {}", claims.username, proposal.id);
        return Err(ApiError::forbidden(
            paths::PROPOSALS,
            "You have no rights to view this proposal.",
        ));
    }

    let pending = !proposal.status.is_terminal();
    Ok(Json(ProposalDetailPage {
        can_respond: is_receiver && pending,
        can_delete: is_sender && pending,
        proposal: proposal.into(),
    }))
}

/// POST /proposals/{id}/status: The target ad's owner accepts or rejects.
pub async fn update_status(
    State(state): State<AppState>,
    Path(proposal_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<StatusUpdateRequest>, ApiError>,
) -> Result<FlashRedirect, ApiError> {
    let proposal = load_proposal(&state, proposal_id).await?;

    if !proposal.is_receiver(claims.sub) {
        warn!(
            "User {} tried to respond to proposal {} on an ad they do not own",
            claims.username, proposal.id
        );
        return Err(ApiError::forbidden(
            paths::proposal(proposal_id),
            "You have no rights to respond to this proposal. Only the owner of the requested ad can accept or reject it.",
        ));
    }

    let status = match ProposalStatus::parse(req.status.trim()) {
        Some(status @ (ProposalStatus::Accepted | ProposalStatus::Rejected)) => status,
        _ => {
            return Err(ApiError::field(
                "status",
                "Select a valid choice. A proposal can only be accepted or rejected.",
            ));
        }
    };

    let change = blocking(&state, move |db| db.respond_to_proposal(proposal_id, status)).await?;

    match change {
        StatusChange::NotPending => Err(ApiError::conflict(
            paths::proposal(proposal_id),
            ALREADY_PROCESSED,
        )),
        StatusChange::Applied { auto_rejected } => {
            info!(
                "{} {} by {} ({} competing proposals rejected)",
                proposal,
                status.label().to_lowercase(),
                claims.username,
                auto_rejected
            );
            let message = match (status, auto_rejected) {
                (ProposalStatus::Accepted, 0) => "Proposal accepted.".to_string(),
                (ProposalStatus::Accepted, n) => {
                    format!("Proposal accepted. {} other pending proposals were rejected.", n)
                }
                _ => "Proposal rejected.".to_string(),
            };
            Ok(FlashRedirect::success(paths::PROPOSALS, message))
        }
    }
}

/// GET /proposals/{id}/delete: Confirmation; author only.
pub async fn delete_confirm(
    State(state): State<AppState>,
    Path(proposal_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ProposalView>, ApiError> {
    let proposal = load_deletable(&state, proposal_id, &claims).await?;
    Ok(Json(proposal.into()))
}

/// POST /proposals/{id}/delete: Author only, while still pending.
pub async fn delete_proposal(
    State(state): State<AppState>,
    Path(proposal_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<FlashRedirect, ApiError> {
    load_deletable(&state, proposal_id, &claims).await?;

    // The receiver may have answered since the check above.
    let deleted = blocking(&state, move |db| db.delete_proposal(proposal_id)).await?;
    if !deleted {
        return Err(ApiError::conflict(paths::proposal(proposal_id), ALREADY_PROCESSED));
    }

    info!("Proposal {} deleted by {}", proposal_id, claims.username);
    Ok(FlashRedirect::success(paths::PROPOSALS, "Proposal deleted."))
}

async fn load_deletable(
    state: &AppState,
    proposal_id: i64,
    claims: &Claims,
) -> Result<ExchangeProposal, ApiError> {
    let proposal = load_proposal(state, proposal_id).await?;

    if !proposal.is_sender(claims.sub) {
        warn!("User {} tried to delete proposal {}", claims.username, proposal.id);
        return Err(ApiError::forbidden(
            paths::proposal(proposal_id),
            "You have no rights to delete this proposal. Only its author can delete it.",
        ));
    }
    if proposal.status.is_terminal() {
        return Err(ApiError::conflict(paths::proposal(proposal_id), ALREADY_PROCESSED));
    }

    Ok(proposal)
}
