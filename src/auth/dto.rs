use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::repo_types::User,
    error::AppError,
    validation::{is_valid_email, FieldCheck},
};

pub const USERNAME_MIN: usize = 2;
pub const USERNAME_MAX: usize = 30;
pub const PASSWORD_MIN: usize = 2;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterRequest {
    /// Trims and lowercases the email, trims the username, then checks every field.
    pub fn validate(mut self) -> Result<Self, AppError> {
        self.email = self.email.trim().to_lowercase();
        self.username = self.username.trim().to_string();

        let mut check = FieldCheck::new();
        check.ensure(is_valid_email(&self.email), "email", "Invalid email format");
        check.length(
            &self.username,
            "username",
            USERNAME_MIN,
            USERNAME_MAX,
            "Username must be at least 2 characters",
            "Username must be less than 30 characters",
        );
        check.ensure(
            self.password.chars().count() >= PASSWORD_MIN,
            "password",
            "Password must be at least 2 characters",
        );
        check.finish()?;
        Ok(self)
    }
}

impl LoginRequest {
    pub fn validate(mut self) -> Result<Self, AppError> {
        self.email = self.email.trim().to_lowercase();

        let mut check = FieldCheck::new();
        check.ensure(is_valid_email(&self.email), "email", "Invalid email format");
        check.ensure(!self.password.is_empty(), "password", "Password is required");
        check.finish()?;
        Ok(self)
    }
}

/// Returned by register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            username: u.username,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_errors(err: AppError) -> crate::envelope::FieldErrors {
        match err {
            AppError::Validation { errors, .. } => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn register_normalizes_email_and_username() {
        let req = RegisterRequest {
            email: "  Ada@Example.COM ".into(),
            username: " ada ".into(),
            password: "secret1".into(),
        }
        .validate()
        .expect("valid");
        assert_eq!(req.email, "ada@example.com");
        assert_eq!(req.username, "ada");
    }

    #[test]
    fn register_reports_every_bad_field() {
        let errors = field_errors(
            RegisterRequest {
                email: "nope".into(),
                username: "a".into(),
                password: "1".into(),
            }
            .validate()
            .unwrap_err(),
        );
        assert_eq!(errors.len(), 3);
        assert_eq!(errors["email"], vec!["Invalid email format".to_string()]);
        assert_eq!(
            errors["username"],
            vec!["Username must be at least 2 characters".to_string()]
        );
        assert_eq!(
            errors["password"],
            vec!["Password must be at least 2 characters".to_string()]
        );
    }

    #[test]
    fn two_character_credentials_are_enough() {
        let req = RegisterRequest {
            email: "ab@example.com".into(),
            username: "ab".into(),
            password: "pw".into(),
        }
        .validate()
        .unwrap();
        assert_eq!(req.username, "ab");
    }

    #[test]
    fn login_requires_password() {
        let errors = field_errors(
            LoginRequest {
                email: "ada@example.com".into(),
                password: String::new(),
            }
            .validate()
            .unwrap_err(),
        );
        assert_eq!(errors["password"], vec!["Password is required".to_string()]);
    }

    #[test]
    fn public_user_hides_hash() {
        let now = time::OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: "ada@example.com".into(),
            username: "ada".into(),
            password_hash: "$argon2id$secret".into(),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(json.contains("ada@example.com"));
        assert!(!json.contains("argon2"));
    }
}
