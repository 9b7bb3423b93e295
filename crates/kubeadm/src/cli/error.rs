//! Error formatting utilities for CLI output

use kubeadm_core::DispatchError;

/// Format an error for user display (no stack traces)
///
/// Includes the first source in the chain when it adds information.
#[must_use]
pub fn format_error(err: &anyhow::Error) -> String {
    let msg = err.to_string();
    match err.source() {
        Some(source) => {
            let source_msg = source.to_string();
            if source_msg.is_empty() || msg.contains(&source_msg) {
                msg
            } else {
                format!("{msg}\nCause: {source_msg}")
            }
        }
        None => msg,
    }
}

/// Extract appropriate exit code from an error
///
/// # Exit Codes
/// * 0 - Success (not returned here)
/// * 1 - User error (missing or invalid subcommand, bad flags or configuration)
/// * 2 - System error (IO failure, unexpected error); also clap usage errors
/// * 3 - Not found (a file named on the command line or in the environment)
#[must_use]
pub fn get_exit_code(err: &anyhow::Error) -> i32 {
    if let Some(dispatch_err) = err.downcast_ref::<DispatchError>() {
        return dispatch_err.exit_code();
    }

    if let Some(core_err) = err.downcast_ref::<kubeadm_core::Error>() {
        return core_err.exit_code();
    }

    if let Some(clap_err) = err.downcast_ref::<clap::Error>() {
        return clap_err.exit_code();
    }

    if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
        return if io_err.kind() == std::io::ErrorKind::NotFound {
            3
        } else {
            2
        };
    }

    2
}
