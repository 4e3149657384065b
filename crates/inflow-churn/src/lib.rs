//! Git code-churn measurement.
//!
//! Mines per-commit line counts from a repository with git2 and aggregates
//! them into per-file and per-module churn (lines added + lines removed).

pub mod churn;
pub mod mining;

pub use churn::{aggregate, ChurnMetrics, ChurnReport};
pub use mining::{mine_numstat, MiningOptions, NumstatEntry};
