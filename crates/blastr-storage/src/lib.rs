//! Blastr Storage - PostgreSQL persistence for the campaign dispatcher
//!
//! This crate provides the database pool, the campaign/batch/send models,
//! and one repository per entity.

pub mod db;
pub mod models;
pub mod repository;

pub use db::{Database, DatabasePool};
pub use models::*;
pub use repository::*;
