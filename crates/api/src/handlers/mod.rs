pub mod admin;
pub mod ads;
pub mod auth;
pub mod images;
