//! Core business logic for fabula.

pub mod services;

pub use services::*;
