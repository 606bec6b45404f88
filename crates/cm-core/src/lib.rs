//! # cm-core
//!
//! Core types, traits, and utilities for Construct RS.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Common error types
//! - The uniform `{ data, error }` API response shape
//! - Core traits (Identifiable, Timestamped, SoftDeletable, Entity)
//! - List query parameters
//! - Configuration types

pub mod error;
pub mod result;
pub mod traits;
pub mod params;
pub mod config;

pub use error::*;
pub use result::*;
pub use traits::*;
pub use params::*;
