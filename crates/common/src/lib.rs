//! Shared configuration and error handling for Archivist
//!
//! This crate provides common functionality used across the Archivist workspace:
//! - Configuration management following 12-factor principles
//! - The error type shared by persistence adapters and domain services

pub mod config;
pub mod error;

pub use config::Config;
pub use error::{Error, Result};
