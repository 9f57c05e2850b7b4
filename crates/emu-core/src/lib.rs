//! EMU Core - Domain models, record parsing, and configuration
//!
//! This crate contains the domain types for Ecological Marine Unit data and
//! the port definition for the remote feature-query provider.

pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod ports;

pub use error::{EmuError, Result};
