//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ballonwerk_core::{Email, UserId};

use super::validation::ValidationErrors;

/// A storefront user (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    /// Object-store key of the uploaded avatar.
    pub avatar_key: Option<String>,
    /// Grants access to the admin dashboard.
    pub is_admin: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Partial profile update. Absent fields are left unchanged; empty strings clear.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

impl ProfileUpdate {
    /// Validate the supplied fields with the same rules as checkout.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(name) = non_empty(self.name.as_deref())
            && !(2..=100).contains(&name.chars().count())
        {
            errors.add("name", "must be 2 to 100 characters");
        }
        if let Some(phone) = non_empty(self.phone.as_deref())
            && !super::order::is_valid_phone(phone)
        {
            errors.add("phone", "must be 6 to 20 digits, spaces or + - ( )");
        }
        if let Some(code) = non_empty(self.postal_code.as_deref())
            && !super::order::is_valid_postal_code(code)
        {
            errors.add("postal_code", "must be 4 or 5 digits");
        }
        for (field, value) in [("street", &self.street), ("city", &self.city)] {
            if value.as_deref().is_some_and(|v| v.chars().count() > 200) {
                errors.add(field, "must be at most 200 characters");
            }
        }

        errors.into_result()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_update_validates_present_fields_only() {
        assert!(ProfileUpdate::default().validate().is_ok());

        let update = ProfileUpdate {
            phone: Some("12".to_string()),
            postal_code: Some("1010".to_string()),
            name: Some(String::new()),
            ..ProfileUpdate::default()
        };
        let errors = update.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.get("phone").is_some());
    }
}
