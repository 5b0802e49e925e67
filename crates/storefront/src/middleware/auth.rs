//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a signed-in user, and an admin, in route
//! handlers. Every rejection is a JSON error body.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::{AppError, set_sentry_user};
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Sign in required".to_string()))?;

        set_sentry_user(&user.id, Some(user.email.as_str()));
        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is signed in.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(
///     OptionalAuth(user): OptionalAuth,
/// ) -> impl IntoResponse {
///     match user {
///         Some(u) => format!("Hello, {}!", u.email),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await?))
    }
}

/// Extractor that requires a signed-in admin.
///
/// The admin flag is read from the database on every request, so revoking it
/// takes effect without waiting for the session to expire.
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;

        if !state.auth().is_admin(user.id).await? {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Admin access denied");
            return Err(AppError::Forbidden);
        }

        Ok(Self(user))
    }
}

/// Read the signed-in user from the request's session.
async fn current_user(parts: &Parts) -> Result<Option<CurrentUser>, AppError> {
    // Set by SessionManagerLayer
    let Some(session) = parts.extensions.get::<Session>() else {
        return Ok(None);
    };

    Ok(session.get(session_keys::CURRENT_USER).await?)
}

/// Helper to set the current user in the session.
///
/// The session ID is cycled first so a pre-login session ID cannot be reused
/// to ride the signed-in session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    session
        .remove::<String>(session_keys::PENDING_PAYMENT)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;
    use tower_sessions::MemoryStore;

    use ballonwerk_core::{Email, UserId};

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn parts_with(session: Option<Session>) -> Parts {
        let (mut parts, ()) = Request::get("/api/account").body(()).unwrap().into_parts();
        if let Some(session) = session {
            parts.extensions.insert(session);
        }
        parts
    }

    #[tokio::test]
    async fn test_require_auth_rejects_guests() {
        let mut parts = parts_with(Some(session()));
        let rejection = RequireAuth::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(rejection.into_response().status(), StatusCode::UNAUTHORIZED);

        let mut parts = parts_with(None);
        let OptionalAuth(user) = OptionalAuth::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_signed_in_user_is_extracted_until_logout() {
        let session = session();
        let user = CurrentUser {
            id: UserId::new(7),
            email: Email::parse("anna@example.com").unwrap(),
        };
        set_current_user(&session, &user).await.unwrap();

        let mut parts = parts_with(Some(session.clone()));
        let RequireAuth(found) = RequireAuth::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(found.id, user.id);

        clear_current_user(&session).await.unwrap();
        let mut parts = parts_with(Some(session));
        let OptionalAuth(found) = OptionalAuth::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
