use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{info, warn};
use uuid::Uuid;

use barter_db::Database;
use barter_types::api::{AuthResponse, Claims, LoginRequest};
use barter_types::forms::SignUpForm;

use crate::blocking;
use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: impl Into<String>) -> AppState {
        Arc::new(Self {
            db,
            jwt_secret: jwt_secret.into(),
        })
    }
}

/// POST /signup
pub async fn signup(
    State(state): State<AppState>,
    WithRejection(Json(form), _): WithRejection<Json<SignUpForm>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    form.validate()?;

    let username = form.username.trim().to_string();
    let password = form.password;
    let user_id = Uuid::new_v4();

    let name = username.clone();
    let created = blocking(&state, move |db| {
        if db.get_user_by_username(&name)?.is_some() {
            return Ok(false);
        }

        // Hash password with Argon2id
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
            .to_string();

        db.create_user(&user_id.to_string(), &name, &password_hash)?;
        Ok(true)
    })
    .await?;

    if !created {
        return Err(ApiError::field(
            "username",
            "A user with that username already exists.",
        ));
    }

    let token = issue_token(&state.jwt_secret, user_id, &username)?;
    info!("User {} signed up", username);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user_id,
            username,
            token,
        }),
    ))
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<Json<AuthResponse>, ApiError> {
    let LoginRequest { username, password } = req;

    let user = blocking(&state, move |db| {
        let Some(user) = db.get_user_by_username(&username)? else {
            return Ok(None);
        };

        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|e| anyhow::anyhow!("stored hash for {} is unreadable: {}", user.username, e))?;
        let verified = Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok();

        Ok(verified.then_some(user))
    })
    .await?;

    let Some(user) = user else {
        warn!("Failed login attempt");
        return Err(ApiError::Unauthorized("invalid username or password"));
    };

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("corrupt user id '{}': {}", user.id, e))?;

    let token = issue_token(&state.jwt_secret, user_id, &user.username)?;

    Ok(Json(AuthResponse {
        user_id,
        username: user.username,
        token,
    }))
}

/// HS256 token valid for 30 days.
pub fn issue_token(secret: &str, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
