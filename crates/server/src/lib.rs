//! tokoledger server library.
//!
//! Records purchases made at stores and orders placed by customers. Stores,
//! products, customers and catalog products are created on first mention
//! and reused afterwards, with display names formatted against a learned
//! set of abbreviations.
//!
//! The router, services and both storage backends live here so the binary
//! stays thin and integration tests can drive the full HTTP stack in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ServerConfig;
pub use error::AppError;
pub use routes::app;
pub use state::AppState;
