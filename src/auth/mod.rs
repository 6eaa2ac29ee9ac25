//! # Auth Module
//!
//! - Google OAuth login exchange (state/nonce, code exchange, ID token check)
//! - Account directory (first-login creation, profile refresh, initial role)
//! - Bearer credential issue/verify
//! - Access control guard for protected routes

pub mod credentials;
pub mod directory;
pub mod extractors;
pub mod handlers;
pub mod login_state;
pub mod models;
pub mod routes;

#[cfg(test)]
mod tests;

pub use extractors::{require_credential, AccessPolicy, AuthedUser};
pub use models::Role;
pub use routes::auth_routes;
