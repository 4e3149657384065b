//! Core types, configuration, and error handling for inflow.
//!
//! This crate provides the shared foundation used by the other inflow crates:
//! - [`InflowError`]: unified error type using `thiserror` and `miette`
//! - [`InflowConfig`]: configuration loaded from `.inflow.toml`
//! - Shared types: [`MethodKind`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{ChurnConfig, DataConfig, ForecastSettings, InflowConfig};
pub use error::InflowError;
pub use types::{MethodKind, OutputFormat};

/// A convenience `Result` type for inflow operations.
pub type Result<T> = std::result::Result<T, InflowError>;
