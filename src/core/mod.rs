//! Platform-agnostic configuration, data model and collaborator traits.

pub mod config;
pub mod models;
pub mod platform;
