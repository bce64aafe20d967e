//! Request extractors and middleware.
//!
//! - [`auth::CurrentIdentity`] -- resolves the session cookie to an identity (never rejects).
//! - [`auth::AuthUser`] -- requires an authenticated user.
//! - [`rbac::RequireAdmin`] -- requires the `admin` role.
//! - [`rate_limit`] -- fixed-window limits for auth endpoints and all traffic.

pub mod auth;
pub mod rate_limit;
pub mod rbac;
