//! Common types shared across the Rollcall crates.
//!
//! This crate holds the workspace-wide error type and the observability
//! bootstrap. It stays small so that every crate can depend on it without
//! dragging in the browser or HTTP stacks.
//!
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`RollcallError`] and [`Result`]: shared error handling for the binary
//!   and glue code
//!
//! # Examples
//!
//! ```rust
//! use rollcall_common::RollcallError;
//!
//! let err = RollcallError::Config("notion token is empty".into());
//! assert_eq!(err.to_string(), "Configuration error: notion token is empty");
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

/// Error types used across the Rollcall system.
#[derive(thiserror::Error, Debug)]
pub enum RollcallError {
    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The browser driver (session, login, navigation) reported an error.
    #[error("Driver error: {0}")]
    Driver(#[from] anyhow::Error),

    /// The status store rejected a request or was unreachable.
    #[error("Store error: {0}")]
    Store(String),

    /// The chat view could not be prepared for extraction.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// A wait exceeded its deadline.
    #[error("Timeout occurred: {0}")]
    Timeout(String),
}

/// Convenient alias for results that use [`RollcallError`].
pub type Result<T> = std::result::Result<T, RollcallError>;

/// How a single run of the scan loop should treat the status store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RunMode {
    /// Classify and write statuses.
    #[default]
    Live,
    /// Classify and log, never write.
    DryRun,
}

impl RunMode {
    pub fn writes(self) -> bool {
        matches!(self, RunMode::Live)
    }
}
