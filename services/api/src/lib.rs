//! services/api/src/lib.rs
//!
//! The web service around the resume fit conversation: HTTP adapters for the
//! remote analysis service, configuration, and the Axum surface.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
