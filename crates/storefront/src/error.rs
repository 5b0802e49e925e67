//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Error bodies are JSON: `{"error": "<code>", "message": "<text>"}`, or
//! `{"error": "validation", "fields": {...}}` for form validation failures.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use ballonwerk_core::Locale;

use crate::db::RepositoryError;
use crate::i18n::Message;
use crate::models::ValidationErrors;
use crate::services::auth::AuthError;
use crate::services::catalog::CatalogError;
use crate::services::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Upload could not be stored.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Payment provider call failed.
    #[error("Payment provider error: {0}")]
    Upstream(String),

    /// A business rule rejected the request; `message` is already localised.
    #[error("{code}: {message}")]
    User {
        status: StatusCode,
        code: &'static str,
        message: &'static str,
    },

    /// Form fields failed validation.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but lacks rights.
    #[error("Forbidden")]
    Forbidden,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with the current state of the resource.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// A localised business-rule rejection.
    #[must_use]
    pub const fn user(status: StatusCode, code: &'static str, message: Message, locale: Locale) -> Self {
        Self::User {
            status,
            code,
            message: message.text(locale),
        }
    }

    const fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_)
            | Self::Internal(_)
            | Self::Upstream(_)
            | Self::Session(_)
            | Self::Catalog(CatalogError::Repository(_))
            | Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash)
            | Self::Storage(StorageError::Io(_)) => true,
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) | Self::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Catalog(err) => match err {
                CatalogError::NotFound => StatusCode::NOT_FOUND,
                CatalogError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CatalogError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Storage(err) => match err {
                StorageError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                StorageError::UnsupportedType(_) | StorageError::ContentMismatch => {
                    StatusCode::UNSUPPORTED_MEDIA_TYPE
                }
                StorageError::Empty | StorageError::InvalidKey => StatusCode::BAD_REQUEST,
                StorageError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::User { status, .. } => *status,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Machine-readable code and client-safe message.
    fn code_and_message(&self) -> (&'static str, String) {
        match self {
            Self::Database(RepositoryError::NotFound) => ("not_found", "Not found".to_string()),
            Self::Database(_) | Self::Internal(_) | Self::Session(_) => {
                ("internal", "Internal server error".to_string())
            }
            Self::Upstream(_) => ("upstream", "External service error".to_string()),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => {
                    ("invalid_credentials", "Invalid credentials".to_string())
                }
                AuthError::UserNotFound => ("not_found", "User not found".to_string()),
                AuthError::UserAlreadyExists => (
                    "user_exists",
                    "An account with this email already exists".to_string(),
                ),
                AuthError::WeakPassword(msg) => ("weak_password", msg.clone()),
                AuthError::InvalidEmail(_) => ("invalid_email", "Invalid email address".to_string()),
                AuthError::Validation(errors) => ("validation", errors.to_string()),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    ("internal", "Authentication error".to_string())
                }
            },
            Self::Catalog(err) => match err {
                CatalogError::NotFound => ("not_found", "Product not found".to_string()),
                CatalogError::Validation(errors) => ("validation", errors.to_string()),
                CatalogError::Repository(_) => ("internal", "Internal server error".to_string()),
            },
            Self::Storage(err) => match err {
                StorageError::Io(_) => ("internal", "Upload failed".to_string()),
                other => ("invalid_upload", other.to_string()),
            },
            Self::User { code, message, .. } => (code, (*message).to_string()),
            Self::Validation(errors) => ("validation", errors.to_string()),
            Self::NotFound(what) => ("not_found", format!("Not found: {what}")),
            Self::Unauthorized(msg) => ("unauthorized", msg.clone()),
            Self::Forbidden => ("forbidden", "Forbidden".to_string()),
            Self::BadRequest(msg) => ("bad_request", msg.clone()),
            Self::Conflict(msg) => ("conflict", msg.clone()),
            Self::RateLimited => ("rate_limited", "Too many requests".to_string()),
        }
    }

    /// Per-field messages for validation failures.
    fn fields(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors)
            | Self::Auth(AuthError::Validation(errors))
            | Self::Catalog(CatalogError::Validation(errors)) => Some(errors),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        // Don't expose internal error details to clients
        let (code, message) = self.code_and_message();

        let body = match self.fields() {
            Some(fields) => json!({ "error": code, "message": message, "fields": fields }),
            None => json!({ "error": code, "message": message }),
        };

        (status, Json(body)).into_response()
    }
}

/// Service errors that carry user-facing, localised messages.
///
/// Server-side failures inside them still become non-leaking 500s.
pub trait LocalizedError {
    /// Convert into an [`AppError`] with messages in `locale`.
    fn localize(self, locale: Locale) -> AppError;
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(get_status(AppError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Validation(ValidationErrors::new())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::Storage(StorageError::TooLarge { max: 1 })),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_user_error_is_localised() {
        let err = AppError::user(
            StatusCode::CONFLICT,
            "out_of_stock",
            Message::OutOfStock,
            Locale::En,
        );
        assert_eq!(get_status(err), StatusCode::CONFLICT);

        let err = AppError::user(
            StatusCode::CONFLICT,
            "out_of_stock",
            Message::OutOfStock,
            Locale::De,
        );
        let (code, message) = err.code_and_message();
        assert_eq!(code, "out_of_stock");
        assert_eq!(message, Message::OutOfStock.text(Locale::De));
    }

    #[tokio::test]
    async fn test_validation_body_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("phone", "invalid");
        let response = AppError::Validation(errors).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "validation");
        assert_eq!(body["fields"]["phone"], "invalid");
    }
}
