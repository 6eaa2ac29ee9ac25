//! # Posts Module
//!
//! Blog post repository: public reads plus guarded create/update/delete
//! with slug uniqueness and author ownership rules.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod validators;


pub use routes::posts_routes;
