//! Auth Gate Service Library
//!
//! A bearer-token authorization gate. For each request it decides, from the
//! `Authorization` header alone, whether the caller holds a JWT signed by a
//! key the configured authority (Keycloak) currently publishes.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> decision.rs -> auth/jwt.rs -> auth/jwks.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - Key resolution, key-set caching, and token validation
//! - `config` - Service configuration from environment
//! - `decision` - Request to authorization decision (status code and body)
//! - `errors` - Key fetch and resolution error types
//! - `handlers` - HTTP request handlers
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod decision;
pub mod errors;
pub mod handlers;
pub mod observability;
pub mod routes;
