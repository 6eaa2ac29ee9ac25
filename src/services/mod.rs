// src/services/mod.rs
//
// Outbound integrations shared across domain modules

pub mod google;

pub use google::GoogleService;
