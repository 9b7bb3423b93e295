//! `kubeadm completion`
//!
//! The script covers the whole tree, so the action renders the root it
//! was invoked from rather than a copy captured at build time.

use std::io::Write;

use anyhow::Result;
use clap::{builder::PossibleValuesParser, Arg, ArgMatches};
use clap_complete::Shell;
use kubeadm_core::Error;

use crate::cli::{CommandNode, Output};

const COMPLETION_LONG_ABOUT: &str = "\
Output shell completion code for the specified shell (bash, zsh or fish).
The shell code must be evaluated to provide interactive
completion of kubeadm commands. This can be done by sourcing it from
the .bash_profile.

Examples:

    # Load the kubeadm completion code for bash into the current shell
    source <(kubeadm completion bash)

    # Write fish completions to the user completion directory
    kubeadm completion fish > ~/.config/fish/completions/kubeadm.fish";

const SHELLS: [&str; 3] = ["bash", "zsh", "fish"];

pub fn new_cmd_completion(out: &Output) -> CommandNode {
    let out = out.clone();
    CommandNode::leaf(
        "completion",
        "Output shell completion code for the specified shell (bash, zsh or fish).",
        move |inv| run_completion(inv.matches, inv.root, &mut out.clone()),
    )
    .long_about(COMPLETION_LONG_ABOUT)
    .arg(
        Arg::new("shell")
            .value_name("SHELL")
            .required(true)
            .value_parser(PossibleValuesParser::new(SHELLS)),
    )
}

/// # Errors
///
/// Returns error if the shell is unsupported or the write fails.
pub fn run_completion(matches: &ArgMatches, root: &CommandNode, out: &mut impl Write) -> Result<()> {
    let name = matches
        .get_one::<String>("shell")
        .ok_or_else(|| Error::validation("shell not specified"))?;
    let shell: Shell = name
        .parse()
        .map_err(|_| Error::validation(format!("unsupported shell type {name:?}")))?;

    let mut cmd = root.to_command();
    let bin_name = root.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, bin_name, out);
    out.flush()?;
    Ok(())
}
