//! Shared configuration, telemetry and money helpers for Tally.
//!
//! This crate provides common pieces used across all other crates:
//! - Fixed-point money helpers (two decimal places, never floats)
//! - Configuration management
//! - Tracing subscriber bootstrap for the binaries

pub mod config;
pub mod telemetry;
pub mod types;

pub use config::{AppConfig, ConfigValidationError};
