//! services/api/src/lib.rs
//!
//! The library crate backing the `api` and `openapi` binaries. Adapters
//! implement the core's ports against the hosted backend; the web module
//! holds the Axum surface; the notify module runs the live notification
//! hub.

pub mod adapters;
pub mod config;
pub mod error;
pub mod notify;
pub mod web;
