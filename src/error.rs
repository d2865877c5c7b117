// src/error.rs

/// Errors raised by the matching core itself.
///
/// A missing match is never an error; callers get a `MatchResult` with no id.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl MatchError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        MatchError::InvalidArgument(msg.into())
    }
}
