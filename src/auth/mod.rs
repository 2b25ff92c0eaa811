pub mod claims;
pub(crate) mod extractors;
pub mod jwt;
pub mod password;

pub use claims::{Claims, TokenKind};
pub use extractors::{AuthUser, BearerClaims};
pub use jwt::JwtKeys;
