//! Error types shared by the planning crates.
//!
//! [`MatcapError`] is the error returned at API boundaries. Configuration
//! problems are described in detail by [`ConfigurationError`], which converts
//! into `MatcapError::Configuration`.
//!
//! An infeasible plan is not an error: the solver reports it on the returned
//! solution instead.
//!
//! # Example
//!
//! ```ignore
//! use matcap_core::{MatcapError, MatcapResult};
//!
//! fn plan(path: &str) -> MatcapResult<()> {
//!     let config = load_configuration(path)?;
//!     config.validate()?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Error type for all planning operations.
#[derive(Error, Debug)]
pub enum MatcapError {
    /// I/O errors (file access, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Malformed planning input; no solve is attempted
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// An analysis pass was invoked without a completed solve
    #[error("Analysis precondition failed: {0}")]
    AnalysisPrecondition(String),

    /// The caller raised the cancellation flag
    #[error("Solve cancelled after {completed_years} planning year(s)")]
    Cancelled { completed_years: usize },

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using MatcapError.
pub type MatcapResult<T> = Result<T, MatcapError>;

/// Structural problems found while validating a configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("component '{component}' references unknown material '{material}'")]
    UnknownMaterial { component: String, material: String },

    #[error("product '{product}' references unknown component '{component}'")]
    UnknownComponent { product: String, component: String },

    #[error("interconnector references unknown zone '{zone}'")]
    UnknownZone { zone: String },

    #[error("unknown material '{0}' in market override")]
    UnknownOverrideMaterial(String),

    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },

    #[error("{entity}: field '{field}' must be non-negative and finite (got {value})")]
    NegativeValue {
        entity: String,
        field: &'static str,
        value: f64,
    },

    #[error("{entity}: field '{field}' must lie in [0, 1] (got {value})")]
    FractionOutOfRange {
        entity: String,
        field: &'static str,
        value: f64,
    },

    #[error("planning horizon must contain at least one year")]
    EmptyHorizon,
}

impl From<anyhow::Error> for MatcapError {
    fn from(err: anyhow::Error) -> Self {
        MatcapError::Other(err.to_string())
    }
}

impl From<String> for MatcapError {
    fn from(s: String) -> Self {
        MatcapError::Other(s)
    }
}

impl From<&str> for MatcapError {
    fn from(s: &str) -> Self {
        MatcapError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for MatcapError {
    fn from(err: serde_json::Error) -> Self {
        MatcapError::Parse(err.to_string())
    }
}
