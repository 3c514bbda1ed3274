//! Token decoding and signature verification.
//!
//! Separated from [`crate::claims`] so the deterministic claim checks stay
//! pure: this module is the only place that touches `jsonwebtoken`.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use thiserror::Error;

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

#[derive(Debug, Error)]
pub enum TokenError {
    /// The token could not be decoded or its signature did not verify.
    #[error("token rejected: {0}")]
    Decode(#[from] jsonwebtoken::errors::Error),

    /// The token decoded but its claims failed validation.
    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Verifies a bearer token and returns its claims.
///
/// `now` is passed in explicitly so callers (and tests) control the clock.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError>;
}

/// HS256 validator over a shared secret.
pub struct Hs256JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry lives in the claims model (`expires_at`), not the numeric
        // `exp` claim, so the library-side time checks are disabled and
        // `validate_claims` does the work against the caller's clock.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        let decoded = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding_key, &self.validation)?;
        validate_claims(&decoded.claims, now)?;
        Ok(decoded.claims)
    }
}
