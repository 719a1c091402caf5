use thiserror::Error;

/// Errors produced by the strict version parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// The input does not match `v<N>` with `N >= 1`.
    #[error("Malformed version string: {0:?}")]
    Malformed(String),

    /// The numeric part does not fit, or cannot be incremented.
    #[error("Version out of range: {0:?}")]
    Overflow(String),
}
