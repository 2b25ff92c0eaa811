use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let len = self.username.chars().count();
        if !(4..=15).contains(&len) {
            return Err(ApiError::InvalidInput(
                "Username must be 4-15 characters".into(),
            ));
        }
        if !is_valid_email(&self.email) {
            return Err(ApiError::InvalidInput("Invalid email".into()));
        }
        Ok(())
    }
}

/// Request body for login; either username or email identifies the account.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

/// Public part of the user returned after registration.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub username: String,
    pub email: String,
}

/// Response returned after login.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Response returned after token refresh.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokensCountResponse {
    pub tokens_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: "12345".into(),
        }
    }

    #[test]
    fn accepts_valid_registration() {
        assert!(register("John", "user@example.ru").validate().is_ok());
    }

    #[test]
    fn rejects_short_and_long_usernames() {
        assert!(register("abc", "user@example.ru").validate().is_err());
        assert!(register("a-very-long-username", "user@example.ru")
            .validate()
            .is_err());
    }

    #[test]
    fn rejects_malformed_email() {
        assert!(register("John", "not-an-email").validate().is_err());
        assert!(register("John", "user@host").validate().is_err());
    }

    #[test]
    fn email_regex_accepts_common_addresses() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last@sub.example.ru"));
        assert!(!is_valid_email("two@@example.com"));
    }
}
