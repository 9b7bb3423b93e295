//! `kubeadm config`

use std::{io::Write, path::PathBuf};

use anyhow::Result;
use clap::ArgMatches;
use kubeadm_core::{
    config::{MasterConfiguration, Settings},
    Error,
};

use super::{cluster_args, config_arg, kubeconfig_arg, master_config_from_flags};
use crate::cli::{CommandNode, Output};

const CONFIG_ABOUT: &str = "Manage configuration for a kubeadm cluster persisted in a ConfigMap in the cluster.";

const CONFIG_LONG_ABOUT: &str = "\
There is a ConfigMap in the kube-system namespace called \"kubeadm-config\" that kubeadm uses to store
internal configuration about the cluster. kubeadm CLI v1.8.0+ automatically creates this ConfigMap with
the config used with 'kubeadm init'.

The 'upload' commands print what would be stored; 'view' prints the configuration the
local settings produce.";

pub fn new_cmd_config(out: &Output, settings: &Settings) -> CommandNode {
    CommandNode::group("config", CONFIG_ABOUT)
        .long_about(CONFIG_LONG_ABOUT)
        .arg(kubeconfig_arg(settings))
        .subcommand(new_cmd_config_view(out, settings))
        .subcommand(new_cmd_config_upload(out, settings))
}

fn new_cmd_config_view(out: &Output, settings: &Settings) -> CommandNode {
    let out = out.clone();
    let settings = settings.clone();
    CommandNode::leaf(
        "view",
        "View the kubeadm configuration derived from the local settings.",
        move |_| run_config_view(&settings, &mut out.clone()),
    )
}

fn new_cmd_config_upload(out: &Output, settings: &Settings) -> CommandNode {
    let file_out = out.clone();
    let flags_out = out.clone();
    let flags_settings = settings.clone();
    CommandNode::group(
        "upload",
        "Upload configuration about the current state so 'kubeadm upgrade' can later know how to configure the upgraded cluster.",
    )
    .subcommand(
        CommandNode::leaf(
            "from-file",
            "Upload a configuration file to the in-cluster ConfigMap for kubeadm configuration.",
            move |inv| run_upload_from_file(inv.matches, &mut file_out.clone()),
        )
        .arg(config_arg().required(true)),
    )
    .subcommand(
        CommandNode::leaf(
            "from-flags",
            "Create the in-cluster configuration file for the first time from using flags.",
            move |inv| {
                let config = master_config_from_flags(inv.matches, &flags_settings)?;
                print_upload(inv.matches, &config, &mut flags_out.clone())
            },
        )
        .args(cluster_args(settings)),
    )
}

/// # Errors
///
/// Returns error if serialization or the write fails.
pub fn run_config_view(settings: &Settings, out: &mut impl Write) -> Result<()> {
    let config = MasterConfiguration::from_settings(settings);
    write!(out, "{}", config.to_yaml()?)?;
    Ok(())
}

/// # Errors
///
/// Returns error if `--config` is missing, unreadable or invalid.
pub fn run_upload_from_file(matches: &ArgMatches, out: &mut impl Write) -> Result<()> {
    let path = matches
        .get_one::<PathBuf>("config")
        .ok_or_else(|| Error::validation("the file path to upload must be given with --config"))?;
    let config = MasterConfiguration::from_file(path)?;
    print_upload(matches, &config, out)
}

fn print_upload(
    matches: &ArgMatches,
    config: &MasterConfiguration,
    out: &mut impl Write,
) -> Result<()> {
    let kubeconfig = matches
        .get_one::<PathBuf>("kubeconfig")
        .cloned()
        .unwrap_or_default();
    tracing::debug!(kubeconfig = %kubeconfig.display(), "uploading configuration");
    writeln!(
        out,
        "[uploadconfig] Would store the following configuration in ConfigMap \"kubeadm-config\" in namespace kube-system using {}:",
        kubeconfig.display()
    )?;
    write!(out, "{}", config.to_yaml()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use kubeadm_core::DispatchError;

    use super::*;
    use crate::cli::{output::Captured, run_cli};

    fn config_tree() -> (CommandNode, Captured) {
        let (out, captured) = Output::capture();
        let tree = CommandNode::group("kubeadm", "root")
            .subcommand(new_cmd_config(&out, &Settings::default()));
        (tree, captured)
    }

    #[test]
    fn test_view_prints_settings_configuration() {
        let (tree, captured) = config_tree();
        run_cli(&tree, ["kubeadm", "config", "view"]).unwrap();
        let parsed = MasterConfiguration::from_yaml(&captured.contents()).unwrap();
        assert_eq!(parsed, MasterConfiguration::from_settings(&Settings::default()));
    }

    #[test]
    fn test_upload_from_flags() {
        let (tree, captured) = config_tree();
        run_cli(
            &tree,
            ["kubeadm", "config", "upload", "from-flags", "--pod-network-cidr", "10.244.0.0/16"],
        )
        .unwrap();
        let printed = captured.contents();
        assert!(printed.starts_with("[uploadconfig] Would store"));
        assert!(printed.contains("using /etc/kubernetes/admin.conf:"));
        assert!(printed.contains("podSubnet: 10.244.0.0/16"));
    }

    #[test]
    fn test_upload_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"kubernetesVersion: v1.8.4\n").unwrap();
        let (tree, captured) = config_tree();
        run_cli(
            &tree,
            [
                "kubeadm",
                "config",
                "--kubeconfig",
                "/tmp/admin.conf",
                "upload",
                "from-file",
                "--config",
                file.path().to_str().unwrap(),
            ],
        )
        .unwrap();
        let printed = captured.contents();
        assert!(printed.contains("using /tmp/admin.conf:"));
        assert!(printed.contains("kubernetesVersion: v1.8.4"));
    }

    #[test]
    fn test_upload_from_file_requires_config() {
        let (tree, _) = config_tree();
        let err = run_cli(&tree, ["kubeadm", "config", "upload", "from-file"]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<clap::Error>().unwrap().kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_upload_alone_is_missing_subcommand() {
        let (tree, _) = config_tree();
        let err = run_cli(&tree, ["kubeadm", "config", "upload"]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DispatchError>(),
            Some(&DispatchError::MissingSubcommand {
                name: "upload".to_string()
            })
        );
    }
}
