use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use axum_extra::extract::WithRejection;
use tracing::info;

use barter_db::PAGE_SIZE;
use barter_types::api::{
    AdDeletePage, AdDetailPage, AdFormPage, AdListPage, AdView, Claims, ListingQuery, ProposalView,
};
use barter_types::forms::AdForm;
use barter_types::models::Ad;

use crate::auth::AppState;
use crate::error::{ApiError, FlashRedirect};
use crate::guard::{AD_NOT_FOUND, load_ad};
use crate::{blocking, paths};

/// GET / and GET /ads: Search, filter, paginate.
pub async fn list_ads(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<AdListPage>, ApiError> {
    let filters = query.filters();
    let page = query.page;

    let applied = filters.clone();
    let (ads, window) =
        blocking(&state, move |db| db.list_ads(&applied, page.as_deref(), PAGE_SIZE)).await?;

    Ok(Json(AdListPage {
        ads: ads.into_iter().map(AdView::from).collect(),
        page: window.number,
        num_pages: window.num_pages,
        per_page: window.per_page,
        total: window.total,
        has_next: window.has_next(),
        has_previous: window.has_previous(),
        filters,
    }))
}

/// GET /ads/{id}
pub async fn ad_detail(
    State(state): State<AppState>,
    Path(ad_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<AdDetailPage>, ApiError> {
    let ad = load_ad(&state, ad_id).await?;
    let is_author = ad.is_owned_by(claims.sub);
    let viewer = claims.sub;

    let (received, own_ads) = blocking(&state, move |db| {
        if is_author {
            Ok((db.proposals_for_ad(ad_id)?, Vec::new()))
        } else {
            Ok((Vec::new(), db.ads_by_owner(viewer)?))
        }
    })
    .await?;

    Ok(Json(AdDetailPage {
        ad: ad.into(),
        is_author,
        received_proposals: received.into_iter().map(ProposalView::from).collect(),
        offerable_ads: own_ads.into_iter().map(AdView::from).collect(),
    }))
}

/// GET /ads/new: The choices a create form offers.
pub async fn new_ad_form() -> Json<AdFormPage> {
    Json(AdFormPage::new(None))
}

/// POST /ads
pub async fn create_ad(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(form), _): WithRejection<Json<AdForm>, ApiError>,
) -> Result<FlashRedirect, ApiError> {
    let input = form.validate()?;

    let owner = claims.sub;
    let ad_id = blocking(&state, move |db| db.insert_ad(owner, &input)).await?;

    info!("Ad {} created by {}", ad_id, claims.username);
    Ok(FlashRedirect::success(paths::ad(ad_id), "Ad created successfully!"))
}

/// GET /ads/{id}/edit: Current values; author only.
pub async fn edit_form(Extension(ad): Extension<Ad>) -> Json<AdFormPage> {
    Json(AdFormPage::new(Some(AdForm::from(&ad))))
}

/// POST /ads/{id}/edit: Author only.
pub async fn update_ad(
    State(state): State<AppState>,
    Extension(ad): Extension<Ad>,
    WithRejection(Json(form), _): WithRejection<Json<AdForm>, ApiError>,
) -> Result<FlashRedirect, ApiError> {
    let input = form.validate()?;

    let ad_id = ad.id;
    let updated = blocking(&state, move |db| db.update_ad(ad_id, &input)).await?;
    if !updated {
        return Err(ApiError::not_found(paths::LISTING, AD_NOT_FOUND));
    }

    info!("Ad {} updated by {}", ad_id, ad.owner_username);
    Ok(FlashRedirect::success(paths::ad(ad_id), "Ad updated successfully!"))
}

/// GET /ads/{id}/delete: Confirmation; author only.
pub async fn delete_confirm(
    State(state): State<AppState>,
    Extension(ad): Extension<Ad>,
) -> Result<Json<AdDeletePage>, ApiError> {
    let ad_id = ad.id;
    let proposals_to_remove = blocking(&state, move |db| db.count_proposals_for_ad(ad_id)).await?;

    Ok(Json(AdDeletePage {
        ad: ad.into(),
        proposals_to_remove,
    }))
}

/// POST /ads/{id}/delete: Author only. Proposals on the ad go with it.
pub async fn delete_ad(
    State(state): State<AppState>,
    Extension(ad): Extension<Ad>,
) -> Result<FlashRedirect, ApiError> {
    let ad_id = ad.id;
    let deleted = blocking(&state, move |db| db.delete_ad(ad_id)).await?;
    if !deleted {
        return Err(ApiError::not_found(paths::LISTING, AD_NOT_FOUND));
    }

    info!("Ad {} deleted by {}", ad_id, ad.owner_username);
    Ok(FlashRedirect::success(paths::LISTING, "Ad deleted."))
}
