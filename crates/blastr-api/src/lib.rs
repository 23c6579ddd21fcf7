//! Blastr API - REST API server
//!
//! This crate provides the REST API for the campaign dispatcher:
//! campaign lifecycle endpoints, credit operations, and health checks.

pub mod auth;
pub mod handlers;
pub mod openapi;
pub mod routes;

pub use openapi::create_openapi_routes;
pub use routes::create_router;
