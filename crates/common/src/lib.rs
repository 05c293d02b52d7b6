//! Common utilities and types shared across auth-gate components.

#![warn(clippy::pedantic)]

/// Module for JWT utilities (header decoding, size and skew constants)
pub mod jwt;
