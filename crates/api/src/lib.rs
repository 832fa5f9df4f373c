//! HTTP API layer for fabula.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: stories, publishing lifecycle, ratings, bookmarks,
//!   reading progress, categories, tags, and admin tooling
//! - **Extractors**: authentication and client metadata
//! - **Middleware**: token authentication
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
