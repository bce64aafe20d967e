//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod ad_repo;
pub mod image_repo;
pub mod session_repo;
pub mod user_repo;

pub use ad_repo::AdRepo;
pub use image_repo::ImageRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
