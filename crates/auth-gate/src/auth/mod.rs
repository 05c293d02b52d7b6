//! Token authentication for the gate.
//!
//! # Components
//!
//! - `keys` - Verification keys, key sets, and the `KeyResolver` capability
//! - `jwks` - JWKS client for fetching and caching the authority's public keys
//! - `jwt` - Token validation against a `KeyResolver`
//! - `claims` - JWT claims structure for validated tokens

pub mod claims;
pub mod jwks;
pub mod jwt;
pub mod keys;

pub use claims::{Audience, Claims};
pub use jwks::{JwksClient, JwksOptions};
pub use jwt::{InvalidReason, TokenValidator, ValidationOutcome, ValidationSettings};
pub use keys::{KeyResolver, KeySet, SigningKey, StaticKeyResolver};
