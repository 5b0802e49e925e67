//! Authentication route handlers.
//!
//! Email and password sign-up and sign-in. On sign-in the session's guest
//! cart is merged into the account cart.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{auth_rate_limiter, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::models::user::User;
use crate::routes::account::AccountResponse;
use crate::state::AppState;

/// Build the auth router.
///
/// Registration and login are rate limited per client IP.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .layer(auth_rate_limiter())
        .route("/api/auth/logout", post(logout))
}

// =============================================================================
// Request Types
// =============================================================================

/// Registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Create an account and sign in.
#[instrument(skip(state, session, body))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountResponse>)> {
    let user = state
        .auth()
        .register_with_password(&body.email, &body.password, body.name.as_deref())
        .await?;
    tracing::info!(user_id = %user.id, "User registered");

    sign_in(&state, &session, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(AccountResponse::new(user, state.media())),
    ))
}

/// Sign in with email and password.
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AccountResponse>> {
    let user = match state
        .auth()
        .login_with_password(&body.email, &body.password)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            return Err(e.into());
        }
    };

    sign_in(&state, &session, &user).await?;
    Ok(Json(AccountResponse::new(user, state.media())))
}

/// Sign out. The session (and any cart still in it) is discarded.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    session.flush().await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// Put the user in the session and fold the guest cart into their account.
///
/// A failed merge leaves the guest cart in the session and does not fail
/// the sign-in; the client may retry with `POST /api/cart/merge`.
async fn sign_in(state: &AppState, session: &Session, user: &User) -> Result<()> {
    set_current_user(
        session,
        &CurrentUser {
            id: user.id,
            email: user.email.clone(),
        },
    )
    .await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    // Sign-in succeeds even when the merge fails; the guest cart stays in the session.
    match state.cart().merge_guest(user.id, session).await {
        Ok(summary) if summary.merged + summary.dropped > 0 => {
            tracing::info!(
                user_id = %user.id,
                merged = summary.merged,
                dropped = summary.dropped,
                "Guest cart merged"
            );
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(user_id = %user.id, error = %e, "Guest cart not merged at sign-in");
        }
    }

    Ok(())
}
