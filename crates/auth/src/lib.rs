//! `donorhub-auth` — authentication boundary for the HTTP surface.
//!
//! This crate owns the JWT claims model, deterministic claim validation, and
//! the HS256 token validator. It is intentionally decoupled from storage.

pub mod claims;
pub mod roles;
pub mod validator;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use roles::Role;
pub use validator::{Hs256JwtValidator, JwtValidator, TokenError};
