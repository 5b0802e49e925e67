//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use ballonwerk_core::{Email, UserId};

use super::RepositoryError;
use crate::models::product::{Page, PageRequest};
use crate::models::user::{ProfileUpdate, User};

const USER_COLUMNS: &str = "u.id, u.email, u.name, u.phone, u.street, u.city, u.postal_code, \
     u.avatar_key, u.is_admin, u.created_at, u.updated_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    name: Option<String>,
    phone: Option<String>,
    street: Option<String>,
    city: Option<String>,
    postal_code: Option<String>,
    avatar_key: Option<String>,
    is_admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(r.id),
            email,
            name: r.name,
            phone: r.phone,
            street: r.street,
            city: r.city,
            postal_code: r.postal_code,
            avatar_key: r.avatar_key,
            is_admin: r.is_admin,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithPasswordRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: Option<String>,
}

/// Empty strings clear a profile field; absent fields keep the stored value.
fn profile_value(value: Option<&String>) -> (bool, Option<&str>) {
    match value.map(|v| v.trim()) {
        None => (false, None),
        Some("") => (true, None),
        Some(v) => (true, Some(v)),
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM storefront.user u WHERE u.email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM storefront.user u WHERE u.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        email: &Email,
        name: Option<&str>,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: UserRow = sqlx::query_as(&format!(
            r"
            INSERT INTO storefront.user AS u (email, name)
            VALUES ($1, $2)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(email.as_str())
        .bind(name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| super::conflict_on_unique(e, "email"))?;

        let user: User = row.try_into()?;

        sqlx::query(
            r"
            INSERT INTO storefront.user_password (user_id, password_hash)
            VALUES ($1, $2)
            ",
        )
        .bind(user.id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(user)
    }

    /// Get a user and their password hash by email.
    ///
    /// Returns `None` if the user doesn't exist or has no password set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row: Option<UserWithPasswordRow> = sqlx::query_as(&format!(
            r"
            SELECT {USER_COLUMNS}, p.password_hash
            FROM storefront.user u
            LEFT JOIN storefront.user_password p ON u.id = p.user_id
            WHERE u.email = $1
            "
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };
        let Some(password_hash) = r.password_hash else {
            return Ok(None);
        };

        Ok(Some((r.user.try_into()?, password_hash)))
    }

    /// Apply a partial profile update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<User, RepositoryError> {
        let (set_name, name) = profile_value(update.name.as_ref());
        let (set_phone, phone) = profile_value(update.phone.as_ref());
        let (set_street, street) = profile_value(update.street.as_ref());
        let (set_city, city) = profile_value(update.city.as_ref());
        let (set_postal, postal_code) = profile_value(update.postal_code.as_ref());

        let row: Option<UserRow> = sqlx::query_as(&format!(
            r"
            UPDATE storefront.user AS u
            SET name = CASE WHEN $2 THEN $3 ELSE u.name END,
                phone = CASE WHEN $4 THEN $5 ELSE u.phone END,
                street = CASE WHEN $6 THEN $7 ELSE u.street END,
                city = CASE WHEN $8 THEN $9 ELSE u.city END,
                postal_code = CASE WHEN $10 THEN $11 ELSE u.postal_code END,
                updated_at = NOW()
            WHERE u.id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(set_name)
        .bind(name)
        .bind(set_phone)
        .bind(phone)
        .bind(set_street)
        .bind(street)
        .bind(set_city)
        .bind(city)
        .bind(set_postal)
        .bind(postal_code)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Store a new avatar key and return the previous one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_avatar(
        &self,
        id: UserId,
        avatar_key: &str,
    ) -> Result<Option<String>, RepositoryError> {
        let previous: Option<Option<String>> = sqlx::query_scalar(
            r"
            UPDATE storefront.user AS u
            SET avatar_key = $2, updated_at = NOW()
            FROM (SELECT id, avatar_key FROM storefront.user WHERE id = $1 FOR UPDATE) AS prev
            WHERE u.id = prev.id
            RETURNING prev.avatar_key
            ",
        )
        .bind(id)
        .bind(avatar_key)
        .fetch_optional(self.pool)
        .await?;

        previous.ok_or(RepositoryError::NotFound)
    }

    /// List users, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, page: PageRequest) -> Result<Page<User>, RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM storefront.user")
            .fetch_one(self.pool)
            .await?;

        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM storefront.user u \
             ORDER BY u.created_at DESC, u.id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<User>, _>>()?;
        Ok(Page::new(items, total, page))
    }

    /// Whether the user currently holds admin rights.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_admin(&self, id: UserId) -> Result<bool, RepositoryError> {
        let is_admin: Option<bool> =
            sqlx::query_scalar("SELECT is_admin FROM storefront.user WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(is_admin.unwrap_or(false))
    }

    /// Grant or revoke admin rights.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_admin(&self, id: UserId, is_admin: bool) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r"
            UPDATE storefront.user AS u
            SET is_admin = $2, updated_at = NOW()
            WHERE u.id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(is_admin)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_value_semantics() {
        assert_eq!(profile_value(None), (false, None));
        assert_eq!(profile_value(Some(&"  ".to_string())), (true, None));
        assert_eq!(profile_value(Some(&" Wien ".to_string())), (true, Some("Wien")));
    }
}
