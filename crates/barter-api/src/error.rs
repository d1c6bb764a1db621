use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use barter_types::api::{Flash, FlashLevel};
use barter_types::forms::{FieldErrors, NON_FIELD_ERRORS};

/// A `303 See Other` carrying a flash message for the next page.
#[derive(Debug, Clone)]
pub struct FlashRedirect(Flash);

impl FlashRedirect {
    pub fn new(level: FlashLevel, location: impl Into<String>, message: impl Into<String>) -> Self {
        Self(Flash {
            level,
            message: message.into(),
            location: location.into(),
        })
    }

    pub fn success(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Success, location, message)
    }

    pub fn error(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Error, location, message)
    }
}

impl IntoResponse for FlashRedirect {
    fn into_response(self) -> Response {
        (
            StatusCode::SEE_OTHER,
            [(header::LOCATION, self.0.location.clone())],
            Json(self.0),
        )
            .into_response()
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    NotFound { message: String, redirect: String },

    #[error("{message}")]
    Forbidden { message: String, redirect: String },

    /// The target exists and the user may act on it, but its state no
    /// longer allows the action.
    #[error("{message}")]
    Conflict { message: String, redirect: String },

    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn not_found(redirect: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            redirect: redirect.into(),
        }
    }

    pub fn forbidden(redirect: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
            redirect: redirect.into(),
        }
    }

    pub fn conflict(redirect: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            redirect: redirect.into(),
        }
    }

    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(FieldErrors::single(field, message))
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

/// A body that is not JSON, or whose fields have the wrong type, is reported
/// like any other validation failure. Type errors are keyed by the field.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if let JsonRejection::JsonDataError(err) = &rejection {
            let text = err.body_text();
            let detail = text.split_once(": ").map_or(text.as_str(), |(_, d)| d);
            if let Some((field, _)) = detail.split_once(": ") {
                if is_field_path(field) {
                    return Self::field(field, "Enter a valid value.");
                }
            }
        }
        Self::field(NON_FIELD_ERRORS, rejection.body_text())
    }
}

fn is_field_path(path: &str) -> bool {
    !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound { message, redirect }
            | ApiError::Forbidden { message, redirect }
            | ApiError::Conflict { message, redirect } => {
                FlashRedirect::error(redirect, message).into_response()
            }
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "errors": errors })),
            )
                .into_response(),
            ApiError::Unauthorized(reason) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": reason }))).into_response()
            }
            ApiError::Internal(err) => {
                error!("Internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
