//! `kubeadm alpha phase`
//!
//! Each phase of `init` is exposed on its own. Phases report what they
//! would do against the resolved configuration; nothing on the host is
//! touched.

use std::{io::Write, path::PathBuf};

use anyhow::Result;
use clap::ArgMatches;
use kubeadm_core::config::{MasterConfiguration, Settings};

use super::config_arg;
use crate::cli::{CommandNode, Output};

const PHASE_ABOUT: &str = "Invoke subsets of kubeadm functions separately for a manual install.";

const PHASE_LONG_ABOUT: &str = "\
Invoke subsets of kubeadm functions separately for a manual install.

Phases run in the order listed below when invoked through 'kubeadm init'.";

/// The init workflow, one step per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    Preflight,
    Certs,
    Kubeconfig,
    Controlplane,
    Etcd,
    MarkMaster,
    BootstrapToken,
    UploadConfig,
    Addon,
}

impl PhaseKind {
    /// Every phase, in `init` order.
    pub const ALL: [Self; 9] = [
        Self::Preflight,
        Self::Certs,
        Self::Kubeconfig,
        Self::Controlplane,
        Self::Etcd,
        Self::MarkMaster,
        Self::BootstrapToken,
        Self::UploadConfig,
        Self::Addon,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Preflight => "preflight",
            Self::Certs => "certs",
            Self::Kubeconfig => "kubeconfig",
            Self::Controlplane => "controlplane",
            Self::Etcd => "etcd",
            Self::MarkMaster => "mark-master",
            Self::BootstrapToken => "bootstrap-token",
            Self::UploadConfig => "upload-config",
            Self::Addon => "addon",
        }
    }

    pub const fn about(self) -> &'static str {
        match self {
            Self::Preflight => "Run pre-flight checks",
            Self::Certs => "Generate certificates for a Kubernetes cluster.",
            Self::Kubeconfig => "Generate all kubeconfig files necessary to establish the control plane and the admin kubeconfig file.",
            Self::Controlplane => "Generate all static pod manifest files necessary to establish the control plane.",
            Self::Etcd => "Generate static pod manifest file for etcd.",
            Self::MarkMaster => "Mark a node as master.",
            Self::BootstrapToken => "Manage kubeadm-specific Bootstrap Token functions.",
            Self::UploadConfig => "Upload the currently used configuration for kubeadm to a ConfigMap in the cluster.",
            Self::Addon => "Install an addon to a Kubernetes cluster.",
        }
    }

    /// Lines describing the work this phase would perform.
    pub fn plan(self, config: &MasterConfiguration, settings: &Settings) -> Vec<String> {
        let cert_dir = config.certificates_dir.display();
        let kubeconfig_dir = settings.kubeconfig_dir.display();
        let manifests_dir = settings.manifests_dir.display();
        let node = config.node_name.as_deref().unwrap_or("<hostname>");

        match self {
            Self::Preflight => vec!["[preflight] Would run pre-flight checks".to_string()],
            Self::Certs => ["ca", "apiserver", "apiserver-kubelet-client", "sa", "front-proxy-ca", "front-proxy-client"]
                .into_iter()
                .map(|name| format!("[certificates] Would generate {name} certificate and key in {cert_dir}"))
                .collect(),
            Self::Kubeconfig => ["admin", "kubelet", "controller-manager", "scheduler"]
                .into_iter()
                .map(|name| format!("[kubeconfig] Would write KubeConfig file to disk: \"{kubeconfig_dir}/{name}.conf\""))
                .collect(),
            Self::Controlplane => ["kube-apiserver", "kube-controller-manager", "kube-scheduler"]
                .into_iter()
                .map(|component| {
                    format!(
                        "[controlplane] Would write Static Pod manifest for component {component} ({}) to \"{manifests_dir}/{component}.yaml\"",
                        config.kubernetes_version
                    )
                })
                .collect(),
            Self::Etcd => vec![format!(
                "[etcd] Would write Static Pod manifest for a local etcd instance to \"{manifests_dir}/etcd.yaml\""
            )],
            Self::MarkMaster => vec![format!(
                "[markmaster] Would mark node {node} as master by adding a label and a taint"
            )],
            Self::BootstrapToken => {
                let ttl = if config.token_ttl == "0" {
                    "that never expires".to_string()
                } else {
                    format!("with TTL {}", config.token_ttl)
                };
                let token = config
                    .token
                    .as_deref()
                    .map_or_else(|| "a new bootstrap token".to_string(), |token| format!("bootstrap token {token}"));
                vec![
                    format!("[bootstraptoken] Would create {token} {ttl}"),
                    "[bootstraptoken] Would configure RBAC rules to allow node bootstrap tokens to post CSRs".to_string(),
                    "[bootstraptoken] Would create the \"cluster-info\" ConfigMap in the \"kube-public\" namespace".to_string(),
                ]
            }
            Self::UploadConfig => vec![
                "[uploadconfig] Would store the configuration used in ConfigMap \"kubeadm-config\" in the \"kube-system\" Namespace".to_string(),
            ],
            Self::Addon => vec![
                format!(
                    "[addons] Would apply essential addon: kube-dns (domain {})",
                    config.networking.dns_domain
                ),
                "[addons] Would apply essential addon: kube-proxy".to_string(),
            ],
        }
    }
}

pub fn new_cmd_phase(out: &Output, settings: &Settings) -> CommandNode {
    PhaseKind::ALL.into_iter().fold(
        CommandNode::group("phase", PHASE_ABOUT).long_about(PHASE_LONG_ABOUT),
        |group, phase| group.subcommand(new_cmd_single_phase(phase, out, settings)),
    )
}

fn new_cmd_single_phase(phase: PhaseKind, out: &Output, settings: &Settings) -> CommandNode {
    let out = out.clone();
    let settings = settings.clone();
    CommandNode::leaf(phase.name(), phase.about(), move |inv| {
        run_phase(phase, inv.matches, &settings, &mut out.clone())
    })
    .arg(config_arg())
}

/// # Errors
///
/// Returns error if `--config` names a missing or invalid file, or the
/// stream cannot be written.
pub fn run_phase(
    phase: PhaseKind,
    matches: &ArgMatches,
    settings: &Settings,
    out: &mut impl Write,
) -> Result<()> {
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => MasterConfiguration::from_file(path)?,
        None => MasterConfiguration::from_settings(settings),
    };
    tracing::debug!(phase = phase.name(), "planning phase");
    for line in phase.plan(&config, settings) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
