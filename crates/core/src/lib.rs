//! Domain types shared by every layer of the classifieds service.
//!
//! Nothing in this crate performs I/O: the database, HTTP and mail layers
//! depend on it, never the other way round.

pub mod error;
pub mod fields;
pub mod pagination;
pub mod permissions;
pub mod roles;
pub mod search;
pub mod types;
