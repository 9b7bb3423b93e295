//! Invocation layer: argv in, resolved action out
//!
//! Applies the root's flag normalization, parses against the rendered
//! clap tree and dispatches. Every failure comes back as an error so the
//! binary can turn it into a non-zero exit.

use std::ffi::OsString;

use anyhow::Result;
use kubeadm_core::flags::normalize_args;

use super::node::CommandNode;

/// Resolve `args` (binary name first) against `root` and run the target.
///
/// # Errors
///
/// Returns the clap error for unparseable input (help and usage displays
/// included), a `DispatchError` when resolution stops at a group, or
/// whatever the resolved leaf returns.
pub fn run_cli<I, T>(root: &CommandNode, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args: Vec<OsString> = match root.get_normalizer() {
        Some(rule) => normalize_args(args, rule),
        None => args.into_iter().map(Into::into).collect(),
    };

    let matches = root.to_command().try_get_matches_from(args)?;
    root.run(&matches)
}
