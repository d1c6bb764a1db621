use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use barter_types::api::Claims;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;

/// Extract and validate the JWT from the Authorization header, then expose
/// its claims to handlers as `Extension<Claims>`. The token's user must
/// still exist.
pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) =
        bearer.ok_or(ApiError::Unauthorized("authentication required"))?;

    let token_data = decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized("invalid or expired token"))?;

    let user_id = token_data.claims.sub;
    if blocking(&state, move |db| db.get_user_by_id(user_id)).await?.is_none() {
        return Err(ApiError::Unauthorized("unknown user"));
    }

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}
