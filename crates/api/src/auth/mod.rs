//! Authentication and identity primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`verification`] -- signed, time-limited email verification tokens.
//! - [`session`] -- opaque session tokens, cookies, and identity resolution.
//! - [`accounts`] -- account lifecycle: registration, verification, login.

pub mod accounts;
pub mod password;
pub mod session;
pub mod verification;
