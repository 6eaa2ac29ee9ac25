// Common module - shared types and utilities across all modules

pub mod config;
pub mod error;
pub mod helpers;
pub mod id_generator;
pub mod json;
pub mod migrations;
pub mod slug;
pub mod state;
pub mod validation;

// Re-export commonly used types for convenience
pub use config::AppConfig;
pub use error::{is_unique_violation, ApiError};
pub use helpers::{safe_email_log, safe_token_log};
pub use id_generator::*;
pub use json::AppJson;
pub use slug::slugify;
pub use state::AppState;
pub use validation::{ValidationResult, Validator};
