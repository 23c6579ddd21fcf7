//! Blastr Common - shared configuration, errors, and types
//!
//! This crate provides the configuration surface, the error taxonomy,
//! and the small shared types used across the Blastr workspace.

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
