//! `kubeadm init`
//!
//! Resolves the cluster configuration from flags or `--config`, then
//! prints what every phase would do and the matching `kubeadm join` line.

use std::{io::Write, net::IpAddr};

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches};
use kubeadm_core::{
    config::{MasterConfiguration, Settings},
    token::BootstrapToken,
};

use super::{cluster_args, config_arg, phases::PhaseKind, resolve_master_config, skip_preflight_arg};
use crate::cli::{CommandNode, Output};

const INIT_ABOUT: &str = "Run this in order to set up the Kubernetes master";

const INIT_LONG_ABOUT: &str = "\
Run this in order to set up the Kubernetes master.

The configuration comes either from the flags below or from a file passed
with --config; the two can not be mixed. When no --token is given a new
bootstrap token is generated.";

pub fn new_cmd_init(out: &Output, settings: &Settings) -> CommandNode {
    let out = out.clone();
    let run_settings = settings.clone();
    CommandNode::leaf("init", INIT_ABOUT, move |inv| {
        run_init(inv.matches, &run_settings, &mut out.clone())
    })
    .long_about(INIT_LONG_ABOUT)
    .arg(config_arg())
    .args(cluster_args(settings))
    .arg(skip_preflight_arg())
    .arg(
        Arg::new("dry-run")
            .long("dry-run")
            .action(ArgAction::SetTrue)
            .help("Also print the resolved configuration"),
    )
}

/// # Errors
///
/// Returns error for invalid flags, an unusable `--config` file, a
/// malformed `--token`, or a failed write.
pub fn run_init(matches: &ArgMatches, settings: &Settings, out: &mut impl Write) -> Result<()> {
    let mut config = resolve_master_config(matches, settings)?;
    let token = match &config.token {
        Some(token) => token.parse::<BootstrapToken>()?,
        None => BootstrapToken::generate(),
    };
    config.token = Some(token.to_string());

    let skip_preflight = matches.get_flag("skip-preflight-checks");
    let dry_run = matches.get_flag("dry-run");
    tracing::debug!(?config, skip_preflight, dry_run, "resolved init configuration");

    writeln!(
        out,
        "[kubeadm] WARNING: kubeadm is in beta, please do not use it for production clusters."
    )?;
    writeln!(out, "[init] Using Kubernetes version: {}", config.kubernetes_version)?;
    for phase in PhaseKind::ALL {
        if phase == PhaseKind::Preflight && skip_preflight {
            writeln!(out, "[preflight] Skipping pre-flight checks")?;
            continue;
        }
        for line in phase.plan(&config, settings) {
            writeln!(out, "{line}")?;
        }
    }

    if dry_run {
        writeln!(out, "[dryrun] Would use the following configuration:")?;
        write!(out, "{}", config.to_yaml()?)?;
    }

    writeln!(out)?;
    writeln!(out, "[init] No changes were made to this host.")?;
    writeln!(out)?;
    writeln!(out, "You can join any number of machines by running the following on each node")?;
    writeln!(out, "as root:")?;
    writeln!(out)?;
    writeln!(
        out,
        "  kubeadm join --token {token} {} --discovery-token-unsafe-skip-ca-verification",
        api_endpoint(&config)
    )?;
    Ok(())
}

/// `host:port` of the API server, bracketing IPv6 addresses.
fn api_endpoint(config: &MasterConfiguration) -> String {
    let port = config.api.bind_port;
    match config.api.advertise_address {
        Some(IpAddr::V6(addr)) => format!("[{addr}]:{port}"),
        Some(IpAddr::V4(addr)) => format!("{addr}:{port}"),
        None => format!("<master-ip>:{port}"),
    }
}
