//! User management commands.
//!
//! The first admin has to be granted here; after that admins can manage
//! each other from the dashboard.

use thiserror::Error;

use ballonwerk_core::Email;
use ballonwerk_storefront::db::{RepositoryError, UserRepository};

use super::{CommandError, connect};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("No user with email: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Set or clear the admin flag of the user with `email`.
///
/// # Errors
///
/// Returns an error if the email is invalid, no such user exists or the
/// database call fails.
pub async fn set_admin(email: &str, is_admin: bool) -> Result<(), UserError> {
    let email = Email::parse(email).map_err(|_| UserError::InvalidEmail(email.to_owned()))?;

    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    let user = users
        .get_by_email(&email)
        .await?
        .ok_or_else(|| UserError::NotFound(email.to_string()))?;
    let user = users.set_admin(user.id, is_admin).await?;

    tracing::info!(
        "Admin access {} for {} (ID: {})",
        if user.is_admin { "granted" } else { "revoked" },
        user.email,
        user.id
    );
    Ok(())
}
