//! Breakpoint manager errors.

use smol_str::SmolStr;
use thiserror::Error;

/// Errors surfaced to the caller of the breakpoint manager.
///
/// Adapter rejections are not errors: they are reported to the user through
/// the prompt service and never abort a synchronization pass.
#[derive(Debug, Error)]
pub enum BreakpointError {
    /// `synchronize` was called without a live adapter connection.
    #[error("no active debug adapter connection")]
    NotConnected,

    /// A configured exception filter default is not a boolean, `Y`, `N` or `""`.
    #[error(
        "invalid value for exception breakpoint filter '{filter}': '{value}'. \
         Must be boolean, 'Y', 'N' or '' (default)"
    )]
    InvalidExceptionFilterDefault { filter: SmolStr, value: String },

    /// Configuration could not be read or parsed.
    #[error("invalid breakpoint configuration: {0}")]
    Config(String),

    /// Snapshot or request payload could not be (de)serialized.
    #[error("breakpoint serialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),
}
