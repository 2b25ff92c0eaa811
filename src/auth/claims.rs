use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Type of JWT: access or refresh.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "type")]
    pub kind: TokenKind, // token type
    pub sub: String, // user ID, string-encoded
    pub iat: usize,  // issued at (unix timestamp)
    pub exp: usize,  // expires at (unix timestamp)
}

impl Claims {
    /// Tokens are bearer-typed: a refresh token must never pass where an
    /// access token is expected, and vice versa.
    pub fn require_kind(&self, expected: TokenKind) -> Result<(), ApiError> {
        if self.kind != expected {
            return Err(ApiError::InvalidTokenType);
        }
        Ok(())
    }

    pub fn user_id(&self) -> Result<i64, ApiError> {
        self.sub.parse::<i64>().map_err(|_| ApiError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(kind: TokenKind, sub: &str) -> Claims {
        Claims {
            kind,
            sub: sub.into(),
            iat: 0,
            exp: 0,
        }
    }

    #[test]
    fn require_kind_accepts_matching_type() {
        assert!(claims(TokenKind::Access, "1")
            .require_kind(TokenKind::Access)
            .is_ok());
    }

    #[test]
    fn require_kind_rejects_mismatched_type() {
        let err = claims(TokenKind::Refresh, "1")
            .require_kind(TokenKind::Access)
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidTokenType));
    }

    #[test]
    fn user_id_parses_numeric_subject() {
        assert_eq!(claims(TokenKind::Access, "42").user_id().unwrap(), 42);
    }

    #[test]
    fn user_id_rejects_non_numeric_subject() {
        let err = claims(TokenKind::Access, "not-a-number")
            .user_id()
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidToken));
    }

    #[test]
    fn kind_serializes_with_wire_name_type() {
        let json = serde_json::to_value(claims(TokenKind::Access, "1")).unwrap();
        assert_eq!(json["type"], "access");
        let json = serde_json::to_value(claims(TokenKind::Refresh, "1")).unwrap();
        assert_eq!(json["type"], "refresh");
    }
}
