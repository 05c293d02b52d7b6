//! # Gate Test Utilities
//!
//! Shared test utilities for the auth gate.
//!
//! This crate provides:
//! - Deterministic crypto fixtures (fixed Ed25519 seeds, an RSA PEM)
//! - Signed-token builder (TestTokenBuilder)
//! - Mock key-set endpoint (MockJwksServer)
//! - Tracing event capture (LogCapture)
//! - Server test harness (TestGateServer for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gate_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let keypair = TestKeypair::ed25519(1, "key-1");
//!     let jwks = MockJwksServer::with_keys(&[&keypair]).await;
//!
//!     let token = TestTokenBuilder::new()
//!         .for_user("alice")
//!         .issued_by("https://kc.example/realms/test")
//!         .sign_with(&keypair);
//! }
//! ```

pub mod crypto_fixtures;
pub mod jwks_server;
pub mod log_capture;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use jwks_server::*;
pub use log_capture::*;
pub use server_harness::*;
pub use token_builders::*;
