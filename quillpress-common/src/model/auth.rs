use crate::{
    model::{
        Id,
        user::{EmailAddress, User, UserMarker},
    },
    util::PositiveDuration,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use thiserror::Error;
use time::UtcDateTime;

/// The signed claim set carried by every credential. `iat`/`exp` are unix
/// timestamps; verification rejects expired tokens.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Id<UserMarker>,
    pub email: EmailAddress,
    #[serde(default)]
    pub name: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
#[error("Signing auth token failed: {0}")]
pub struct TokenSignError(#[from] jsonwebtoken::errors::Error);

#[derive(Debug, Error)]
#[error("Verifying auth token failed: {0}")]
pub struct TokenVerifyError(#[from] jsonwebtoken::errors::Error);

/// Issues and verifies HMAC-SHA256 signed tokens. Stateless: a token is
/// valid on any instance sharing the secret.
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: PositiveDuration,
}

impl TokenSigner {
    #[must_use]
    pub fn new(secret: &[u8], ttl: PositiveDuration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn issue(&self, user: &User, issued_at: UtcDateTime) -> Result<String, TokenSignError> {
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            iat: issued_at.unix_timestamp(),
            exp: (issued_at + self.ttl.get()).unix_timestamp(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenVerifyError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }
}

impl Debug for TokenSigner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("encoding_key", &"[redacted]")
            .field("decoding_key", &"[redacted]")
            .field("ttl", &self.ttl)
            .finish()
    }
}
