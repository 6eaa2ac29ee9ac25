//! # Categories Module
//!
//! Post categories: public listing and guarded creation.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod validators;

pub use routes::categories_routes;
