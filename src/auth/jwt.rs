use std::time::Duration;

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{
    auth::claims::{Claims, TokenKind},
    config::JwtConfig,
    error::ApiError,
};

/// Holds the RS256 signing and verification keys with token TTLs.
/// Loaded once at startup; read-only afterwards.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl JwtKeys {
    pub fn from_config(config: &JwtConfig) -> anyhow::Result<Self> {
        let private_pem = std::fs::read(&config.private_key_path)?;
        let public_pem = std::fs::read(&config.public_key_path)?;
        Self::from_pems(
            &private_pem,
            &public_pem,
            config.access_ttl_minutes,
            config.refresh_ttl_minutes,
        )
    }

    pub fn from_pems(
        private_pem: &[u8],
        public_pem: &[u8],
        access_ttl_minutes: i64,
        refresh_ttl_minutes: i64,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            encoding: EncodingKey::from_rsa_pem(private_pem)?,
            decoding: DecodingKey::from_rsa_pem(public_pem)?,
            access_ttl: Duration::from_secs((access_ttl_minutes as u64) * 60),
            refresh_ttl: Duration::from_secs((refresh_ttl_minutes as u64) * 60),
        })
    }

    fn sign_with_kind(
        &self,
        user_id: i64,
        kind: TokenKind,
        ttl: TimeDuration,
    ) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + ttl;
        let claims = Claims {
            kind,
            sub: user_id.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding)?;
        debug!(user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, user_id: i64) -> anyhow::Result<String> {
        self.sign_with_kind(
            user_id,
            TokenKind::Access,
            TimeDuration::seconds(self.access_ttl.as_secs() as i64),
        )
    }

    pub fn sign_refresh(&self, user_id: i64) -> anyhow::Result<String> {
        self.sign_with_kind(
            user_id,
            TokenKind::Refresh,
            TimeDuration::seconds(self.refresh_ttl.as_secs() as i64),
        )
    }

    /// Verifies signature and expiry. Expiry gets its own error so clients
    /// can distinguish a stale token from a forged one.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let validation = Validation::new(Algorithm::RS256);
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => ApiError::TokenExpired,
                _ => ApiError::InvalidToken,
            }
        })?;
        debug!(sub = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }
}
