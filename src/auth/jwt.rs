use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::config::JwtConfig;

use super::Claims;

/// Issues and validates signed session tokens.
///
/// Tokens are HS256-signed with the server-held secret and carry a fixed
/// validity window. There is no refresh or rotation; an expired token
/// requires a fresh login.
pub struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl_seconds: i64,
}

impl JwtKeys {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation: Validation::default(),
            token_ttl_seconds: config.token_ttl_seconds,
        }
    }

    pub fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl_seconds
    }

    /// Issue a session token for the given admin identity.
    pub fn issue(
        &self,
        user_id: i64,
        username: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            iat: now,
            exp: now + self.token_ttl_seconds,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// Validate a session token, returning the embedded identity.
    ///
    /// Any invalid, expired, or malformed token yields `None`; callers
    /// treat that as "unauthenticated" rather than an error.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .ok()
    }
}
