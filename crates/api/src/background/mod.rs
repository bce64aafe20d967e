//! Jobs spawned by `main` alongside the server. They run until the shared
//! shutdown token is cancelled.

pub mod session_cleanup;
