//! Error types for kubeadm with categorization:
//!
//! - **Validation errors**: bad flags, configuration or tokens (exit code 1)
//! - **System errors**: IO failures (exit code 2)
//! - **Not found**: missing files named explicitly by the user (exit code 3)

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("{0}")]
    Validation(String),

    #[error("invalid bootstrap token {token:?}: {reason}")]
    InvalidToken { token: String, reason: String },

    #[error("IO error: {0}")]
    Io(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl Error {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn parse_error(what: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Parse {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_token(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidToken {
            token: token.into(),
            reason: reason.into(),
        }
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Semantic process exit code for this error.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidConfig(_)
            | Self::Parse { .. }
            | Self::Validation(_)
            | Self::InvalidToken { .. } => 1,
            Self::Io(_) => 2,
            Self::NotFound(_) => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_category() {
        assert_eq!(Error::invalid_config("x").exit_code(), 1);
        assert_eq!(Error::validation("x").exit_code(), 1);
        assert_eq!(Error::invalid_token("abc", "too short").exit_code(), 1);
        assert_eq!(Error::io_error("x").exit_code(), 2);
        assert_eq!(Error::not_found("x").exit_code(), 3);
    }

    #[test]
    fn test_parse_error_message() {
        let err = Error::parse_error("settings file", "expected `=`");
        assert_eq!(err.to_string(), "failed to parse settings file: expected `=`");
    }
}
