//! Core types for tokoledger.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod date;
pub mod id;

pub use date::{
    DateParseError, deserialize_calendar_date, deserialize_optional_calendar_date,
    parse_calendar_date,
};
pub use id::*;
