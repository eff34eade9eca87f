//! tokoledger Core - Shared types library.
//!
//! This crate provides common types used across all tokoledger components:
//! - `server` - HTTP API for expenses, orders and their canonical entities
//! - `cli` - Command-line tools for migrations and abbreviation management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and calendar dates
//! - [`display_name`] - Name formatting, normalization and abbreviation handling

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod display_name;
pub mod types;

pub use display_name::{
    Abbreviations, abbreviation_candidates, format_display_name, normalize_name,
};
pub use types::*;
