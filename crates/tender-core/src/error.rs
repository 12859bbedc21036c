//! # Error Types
//!
//! Foundational error types. All errors use `thiserror` for derive-based
//! `Display` and `Error` implementations. Higher crates define their own
//! error enums (lifecycle transition errors, API errors) and convert at
//! their boundaries.

use thiserror::Error;

/// Errors arising from foundational type construction.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A timestamp string could not be parsed.
    #[error("invalid timestamp {raw:?}: {reason}")]
    InvalidTimestamp {
        /// The raw input.
        raw: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A role label did not name a known user type.
    #[error("unknown user type: {0:?}")]
    UnknownUserType(String),
}
