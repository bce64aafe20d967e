//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - Create / update DTOs consumed by the matching repository

pub mod ad;
pub mod image;
pub mod session;
pub mod user;
