use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::{self, AppState};
use crate::guard::require_ad_author;
use crate::middleware::require_auth;
use crate::{ads, proposals};

/// Every route of the marketplace. Transport layers (CORS, tracing) are
/// added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login));

    // Author-only ad routes; the guard runs after authentication.
    let author_routes = Router::new()
        .route("/ads/{id}/edit", get(ads::edit_form).post(ads::update_ad))
        .route("/ads/{id}/delete", get(ads::delete_confirm).post(ads::delete_ad))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_ad_author));

    let protected_routes = Router::new()
        .route("/", get(ads::list_ads))
        .route("/ads", get(ads::list_ads).post(ads::create_ad))
        .route("/ads/new", get(ads::new_ad_form))
        .route("/ads/{id}", get(ads::ad_detail))
        .route("/ads/{id}/proposals", post(proposals::create_proposal))
        .route("/proposals", get(proposals::list_proposals))
        .route("/proposals/{id}", get(proposals::proposal_detail))
        .route("/proposals/{id}/status", post(proposals::update_status))
        .route(
            "/proposals/{id}/delete",
            get(proposals::delete_confirm).post(proposals::delete_proposal),
        )
        .merge(author_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// GET /health: Liveness check (no auth).
pub async fn health() -> &'static str {
    "ok"
}
