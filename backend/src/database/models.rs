//! Rust structs that represent database table mappings.
//!
//! These models define the structure of data as it is stored in and retrieved
//! from the database. Note that these may differ from API-specific models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Role attached to an authentication identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted credential record from `auth_users`.
///
/// Never serialized: the password hash must not reach a response payload.
#[derive(Debug, Clone, FromRow)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub token_version: i64,
}

#[derive(Debug, Clone)]
pub struct CreateAuthUser {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];
}

/// Managed user record from `users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i64,
    pub name: String,
    #[schema(example = "1990-04-12")]
    pub birthday: String,
    pub gender: Gender,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(
        min = 1,
        max = 120,
        message = "Name must be between 1-120 characters"
    ))]
    pub name: String,

    #[validate(custom(function = "validate_birthday"))]
    pub birthday: String,

    pub gender: Gender,

    #[validate(length(
        min = 1,
        max = 120,
        message = "Country must be between 1-120 characters"
    ))]
    pub country: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(length(
        min = 1,
        max = 120,
        message = "Name must be between 1-120 characters"
    ))]
    pub name: Option<String>,

    #[validate(custom(function = "validate_birthday"))]
    pub birthday: Option<String>,

    pub gender: Option<Gender>,

    #[validate(length(
        min = 1,
        max = 120,
        message = "Country must be between 1-120 characters"
    ))]
    pub country: Option<String>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.birthday.is_none()
            && self.gender.is_none()
            && self.country.is_none()
    }
}

/// Birthdays are stored as `YYYY-MM-DD` calendar dates.
fn validate_birthday(value: &str) -> Result<(), ValidationError> {
    let well_formed = value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok();

    if well_formed {
        Ok(())
    } else {
        let mut error = ValidationError::new("birthday");
        error.message = Some("Birthday must be a date in YYYY-MM-DD format".into());
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_user() -> CreateUser {
        CreateUser {
            name: "Maya Kim".to_string(),
            birthday: "1990-04-12".to_string(),
            gender: Gender::Female,
            country: "Canada".to_string(),
        }
    }

    #[test]
    fn test_create_user_validation() {
        assert!(valid_user().validate().is_ok());

        let mut user = valid_user();
        user.name = String::new();
        assert!(user.validate().is_err());

        let mut user = valid_user();
        user.country = "x".repeat(121);
        assert!(user.validate().is_err());

        let mut user = valid_user();
        user.birthday = "12/04/1990".to_string();
        assert!(user.validate().is_err());

        let mut user = valid_user();
        user.birthday = "1990-13-40".to_string();
        assert!(user.validate().is_err());
    }

    #[test]
    fn test_update_user_validation_skips_missing_fields() {
        assert!(UpdateUser::default().validate().is_ok());
        assert!(UpdateUser::default().is_empty());

        let update = UpdateUser {
            birthday: Some("1990-4-1".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_role_and_gender_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::from_str::<Gender>("\"other\"").unwrap(),
            Gender::Other
        );
        assert!(serde_json::from_str::<Gender>("\"unknown\"").is_err());
    }
}
