//! Subcommand-required dispatch for group nodes
//!
//! A group node exists only to hold children. When resolution stops at a
//! group, the residual arguments are classified here and turned into an
//! error. The group never reports success.

use thiserror::Error;

/// Failure raised when a group node is the terminal resolution target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Group invoked with no residual arguments.
    #[error("missing subcommand; {name:?} is not meant to be run on its own")]
    MissingSubcommand { name: String },

    /// Group invoked with a residual argument that matches no child.
    #[error("invalid subcommand: {attempted:?}")]
    InvalidSubcommand { attempted: String },
}

impl DispatchError {
    /// Process exit code for a dispatch failure (user error).
    pub const fn exit_code(&self) -> i32 {
        1
    }
}

/// Classify the residual arguments left at a group node.
///
/// Only reached when resolution failed, so a non-empty residual means its
/// first token named no known child.
pub fn classify(name: &str, residual: &[String]) -> DispatchError {
    residual.first().map_or_else(
        || DispatchError::MissingSubcommand {
            name: name.to_string(),
        },
        |attempted| DispatchError::InvalidSubcommand {
            attempted: attempted.clone(),
        },
    )
}

/// Returns the effective action of the group node `name`.
///
/// The returned closure always fails: without children matched there is
/// nothing for a group to do.
pub fn require_subcommand(
    name: impl Into<String>,
) -> impl Fn(&[String]) -> Result<(), DispatchError> + Send + Sync + 'static {
    let name = name.into();
    move |residual| Err(classify(&name, residual))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_residual_is_missing_subcommand() {
        let action = require_subcommand("kubeadm");
        assert_eq!(
            action(&[]),
            Err(DispatchError::MissingSubcommand {
                name: "kubeadm".to_string()
            })
        );
    }

    #[test]
    fn test_missing_subcommand_message() {
        let err = classify("kubeadm", &[]);
        assert_eq!(
            err.to_string(),
            r#"missing subcommand; "kubeadm" is not meant to be run on its own"#
        );
    }

    #[test]
    fn test_invalid_subcommand_uses_first_residual() {
        let residual = vec!["bogus".to_string(), "extra".to_string()];
        let err = classify("alpha", &residual);
        assert_eq!(
            err,
            DispatchError::InvalidSubcommand {
                attempted: "bogus".to_string()
            }
        );
        assert_eq!(err.to_string(), r#"invalid subcommand: "bogus""#);
    }

    #[test]
    fn test_message_quotes_are_escaped() {
        let err = classify("kubeadm", &[r#"we"ird"#.to_string()]);
        assert_eq!(err.to_string(), r#"invalid subcommand: "we\"ird""#);
    }

    #[test]
    fn test_dispatch_never_succeeds() {
        let action = require_subcommand("alpha");
        for residual in [vec![], vec!["x".to_string()], vec![String::new()]] {
            assert!(action(&residual).is_err());
        }
    }

    #[test]
    fn test_exit_code_is_nonzero() {
        assert_ne!(classify("alpha", &[]).exit_code(), 0);
    }
}
