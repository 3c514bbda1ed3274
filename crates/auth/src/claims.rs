use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use donorhub_core::{OrgId, UserId};

use crate::Role;

/// JWT claims model (transport-agnostic).
///
/// This is the minimal set of claims DonorHub expects once a token has been
/// decoded and signature-verified by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject / user identifier.
    pub sub: UserId,

    /// Organization context for the token.
    pub org_id: OrgId,

    /// Roles granted within the organization context.
    pub roles: Vec<Role>,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

impl JwtClaims {
    /// Whether the token grants administrator rights in its organization.
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(Role::is_admin)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate JWT claims.
///
/// Note: this validates the *claims* only. Signature verification / decoding
/// lives in [`crate::validator`].
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims_at(issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            sub: UserId::new(),
            org_id: OrgId::new(),
            roles: vec![Role::new("member")],
            issued_at,
            expires_at,
        }
    }

    #[test]
    fn claims_inside_window_are_valid() {
        let now = Utc::now();
        let claims = claims_at(now - Duration::minutes(1), now + Duration::minutes(10));
        assert_eq!(validate_claims(&claims, now), Ok(()));
    }

    #[test]
    fn expired_claims_are_rejected() {
        let now = Utc::now();
        let claims = claims_at(now - Duration::minutes(20), now - Duration::minutes(10));
        assert_eq!(validate_claims(&claims, now), Err(TokenValidationError::Expired));
    }

    #[test]
    fn future_issued_at_is_rejected() {
        let now = Utc::now();
        let claims = claims_at(now + Duration::minutes(5), now + Duration::minutes(15));
        assert_eq!(validate_claims(&claims, now), Err(TokenValidationError::NotYetValid));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let now = Utc::now();
        let claims = claims_at(now + Duration::minutes(10), now);
        assert_eq!(
            validate_claims(&claims, now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn admin_role_is_detected_among_roles() {
        let now = Utc::now();
        let mut claims = claims_at(now, now + Duration::minutes(10));
        assert!(!claims.is_admin());
        claims.roles.push(Role::new("admin"));
        assert!(claims.is_admin());
    }
}
