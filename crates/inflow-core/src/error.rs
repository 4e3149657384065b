use std::path::PathBuf;

use miette::Diagnostic;

/// Errors that can occur across inflow.
///
/// Library crates return this type directly; the binary converts it into a
/// `miette::Report` at the boundary.
///
/// # Examples
///
/// ```
/// use inflow_core::InflowError;
///
/// let err = InflowError::InsufficientHistory { required: 4, actual: 2 };
/// assert!(err.to_string().contains("at least 4"));
/// ```
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum InflowError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    #[diagnostic(code(inflow::io))]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(code(inflow::config), help("run `inflow init` for a commented template"))]
    Config(String),

    /// Git operation failure.
    #[error("git error: {0}")]
    #[diagnostic(code(inflow::git))]
    Git(String),

    /// Malformed input data.
    #[error("parse error: {0}")]
    #[diagnostic(code(inflow::parse))]
    Parse(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    #[diagnostic(code(inflow::serialization))]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(inflow::toml))]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    #[diagnostic(code(inflow::file_not_found))]
    FileNotFound(PathBuf),

    /// The history is shorter than the method's window.
    #[error("insufficient history: need at least {required} observations, got {actual}")]
    #[diagnostic(
        code(inflow::insufficient_history),
        help("lower the window size or supply more weeks of data")
    )]
    InsufficientHistory {
        /// Observations the method needs.
        required: usize,
        /// Observations available.
        actual: usize,
    },

    /// A forecast parameter is missing or out of range.
    #[error("invalid parameter `{name}`: {reason}")]
    #[diagnostic(code(inflow::invalid_parameter))]
    InvalidParameter {
        /// Parameter name as it appears in config and flags.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The series has no observations at all.
    #[error("empty series: no historical observations")]
    #[diagnostic(code(inflow::empty_series))]
    EmptySeries,
}

impl InflowError {
    /// Shorthand for [`InflowError::InvalidParameter`].
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        InflowError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
