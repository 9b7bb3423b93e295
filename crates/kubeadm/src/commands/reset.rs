//! `kubeadm reset`

use std::{io::Write, path::PathBuf};

use anyhow::Result;
use clap::{value_parser, Arg, ArgMatches};
use kubeadm_core::{config::Settings, Error};

use super::skip_preflight_arg;
use crate::cli::{CommandNode, Output};

const RESET_ABOUT: &str =
    "Run this to revert any changes made to this host by 'kubeadm init' or 'kubeadm join'.";

pub fn new_cmd_reset(out: &Output, settings: &Settings) -> CommandNode {
    let out = out.clone();
    let run_settings = settings.clone();
    CommandNode::leaf("reset", RESET_ABOUT, move |inv| {
        run_reset(inv.matches, &run_settings, &mut out.clone())
    })
    .arg(
        Arg::new("cert-dir")
            .long("cert-dir")
            .value_name("DIR")
            .value_parser(value_parser!(PathBuf))
            .default_value(settings.cert_dir.display().to_string())
            .help("The path to the directory where the certificates are stored. If specified, clean this directory."),
    )
    .arg(skip_preflight_arg())
}

/// # Errors
///
/// Returns error if `--cert-dir` is relative or the stream cannot be written.
pub fn run_reset(matches: &ArgMatches, settings: &Settings, out: &mut impl Write) -> Result<()> {
    let cert_dir = matches
        .get_one::<PathBuf>("cert-dir")
        .cloned()
        .unwrap_or_else(|| settings.cert_dir.clone());
    if !cert_dir.is_absolute() {
        return Err(Error::validation(format!(
            "cert-dir must be an absolute path, got {}",
            cert_dir.display()
        ))
        .into());
    }
    tracing::debug!(cert_dir = %cert_dir.display(), "resolved reset options");

    if matches.get_flag("skip-preflight-checks") {
        writeln!(out, "[preflight] Skipping pre-flight checks")?;
    } else {
        writeln!(out, "[preflight] Would run pre-flight checks")?;
    }
    writeln!(out, "[reset] Would stop the kubelet service")?;
    writeln!(out, "[reset] Would unmount mounted directories in \"/var/lib/kubelet\"")?;
    writeln!(out, "[reset] Would remove Kubernetes-managed containers")?;
    writeln!(
        out,
        "[reset] Would delete contents of stateful directories: [/var/lib/kubelet /etc/cni/net.d /var/lib/dockershim /var/run/kubernetes /var/lib/etcd]"
    )?;
    writeln!(
        out,
        "[reset] Would delete contents of config directories: [{} {}]",
        settings.manifests_dir.display(),
        cert_dir.display()
    )?;
    let kubeconfigs: Vec<String> = ["admin", "kubelet", "controller-manager", "scheduler"]
        .into_iter()
        .map(|name| settings.kubeconfig_dir.join(format!("{name}.conf")).display().to_string())
        .collect();
    writeln!(out, "[reset] Would delete files: [{}]", kubeconfigs.join(" "))?;
    Ok(())
}
