use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    auth::{
        claims::{Claims, TokenKind},
        jwt::JwtKeys,
    },
    error::ApiError,
};

/// Extracts and verifies the bearer token without checking its type.
/// A missing or non-bearer Authorization header is `NotAuthenticated`,
/// distinct from a present-but-malformed token.
pub struct BearerClaims(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for BearerClaims
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::NotAuthenticated)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::NotAuthenticated)?;

        let claims = keys.verify(token)?;
        Ok(BearerClaims(claims))
    }
}

/// The shared gate for access-protected endpoints: bearer token of type
/// `access` with a numeric subject.
pub struct AuthUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let BearerClaims(claims) = BearerClaims::from_request_parts(parts, state).await?;
        claims.require_kind(TokenKind::Access)?;
        Ok(AuthUser(claims.user_id()?))
    }
}
