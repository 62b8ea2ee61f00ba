// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Route Prefix: /auth, /status

pub mod auth;
pub mod health;

pub use auth::google_login;
pub use health::status;
