//! `kubeadm join`

use std::{io::Write, path::PathBuf};

use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, ArgMatches};
use kubeadm_core::{token::BootstrapToken, Error};

use super::skip_preflight_arg;
use crate::cli::{CommandNode, Output};

const JOIN_ABOUT: &str = "Run this on any machine you wish to join an existing cluster";

const JOIN_LONG_ABOUT: &str = "\
When joining a kubeadm initialized cluster, we need to establish
bidirectional trust. This is split into discovery (having the Node
trust the Kubernetes Master) and TLS bootstrap (having the Kubernetes
Master trust the Node).

There are 2 main schemes for discovery. The first is to use a shared
token along with the IP address of the API server. The second is to
provide a file (a subset of the standard kubeconfig file).

If you use a shared token for discovery, you should also pass the
--discovery-token-ca-cert-hash flag to validate the public key of the
root certificate authority (CA) presented by the Kubernetes Master. The
value of this flag is specified as \"sha256:<hex_encoded_hash>\".

Often times the same token is used for both parts. In this case, the
--token flag can be used instead of specifying each token individually.";

const CA_HASH_PREFIX: &str = "sha256:";

/// How the node learns about the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    Token(BootstrapToken),
    File(PathBuf),
}

/// Validated `join` options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOptions {
    pub masters: Vec<String>,
    pub discovery: Discovery,
    pub tls_bootstrap_token: BootstrapToken,
    pub ca_cert_hashes: Vec<String>,
    pub unsafe_skip_ca_verification: bool,
    pub node_name: Option<String>,
    pub skip_preflight: bool,
}

impl JoinOptions {
    /// # Errors
    ///
    /// Returns a validation error when no or both discovery methods are
    /// given, when token discovery lacks a master or CA pin, or when a
    /// token, endpoint or hash is malformed.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let shared = matches.get_one::<String>("token");
        let token_flag = |id: &str| -> Result<Option<BootstrapToken>> {
            matches
                .get_one::<String>(id)
                .or(shared)
                .map(|value| value.parse::<BootstrapToken>())
                .transpose()
                .map_err(Into::into)
        };

        let discovery_token = token_flag("discovery-token")?;
        let discovery_file = matches.get_one::<PathBuf>("discovery-file").cloned();
        let discovery = match (discovery_token, discovery_file) {
            (Some(_), Some(_)) => {
                return Err(Error::validation(
                    "discovery-token and discovery-file cannot both be set",
                )
                .into())
            }
            (None, None) => {
                return Err(Error::validation(
                    "discovery-token or discovery-file must be set",
                )
                .into())
            }
            (Some(token), None) => Discovery::Token(token),
            (None, Some(path)) => Discovery::File(path),
        };

        let tls_bootstrap_token = token_flag("tls-bootstrap-token")?
            .ok_or_else(|| Error::validation("tls-bootstrap-token must be set"))?;

        let masters: Vec<String> = matches
            .get_many::<String>("master")
            .into_iter()
            .flatten()
            .cloned()
            .collect();
        masters.iter().try_for_each(|master| validate_endpoint(master))?;

        let ca_cert_hashes: Vec<String> = matches
            .get_many::<String>("discovery-token-ca-cert-hash")
            .into_iter()
            .flatten()
            .cloned()
            .collect();
        ca_cert_hashes.iter().try_for_each(|hash| validate_ca_hash(hash))?;

        let unsafe_skip_ca_verification =
            matches.get_flag("discovery-token-unsafe-skip-ca-verification");

        if matches!(discovery, Discovery::Token(_)) {
            if masters.is_empty() {
                return Err(Error::validation(
                    "token-based discovery requires at least one master endpoint",
                )
                .into());
            }
            if ca_cert_hashes.is_empty() && !unsafe_skip_ca_verification {
                return Err(Error::validation(
                    "using token-based discovery without discovery-token-ca-cert-hash can be unsafe. \
                     set --discovery-token-unsafe-skip-ca-verification to continue",
                )
                .into());
            }
        }

        Ok(Self {
            masters,
            discovery,
            tls_bootstrap_token,
            ca_cert_hashes,
            unsafe_skip_ca_verification,
            node_name: matches.get_one::<String>("node-name").cloned(),
            skip_preflight: matches.get_flag("skip-preflight-checks"),
        })
    }
}

fn validate_endpoint(endpoint: &str) -> kubeadm_core::Result<()> {
    let invalid =
        || Error::validation(format!("invalid master endpoint {endpoint:?}: expected <host>:<port>"));
    let (host, port) = endpoint.rsplit_once(':').ok_or_else(invalid)?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(invalid());
    }
    match port.parse::<u16>() {
        Ok(port) if port > 0 => Ok(()),
        _ => Err(invalid()),
    }
}

fn validate_ca_hash(hash: &str) -> kubeadm_core::Result<()> {
    let well_formed = hash
        .strip_prefix(CA_HASH_PREFIX)
        .is_some_and(|hex| hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()));
    if well_formed {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "invalid discovery-token-ca-cert-hash {hash:?}: expected {CA_HASH_PREFIX}<64 hex characters>"
        )))
    }
}

pub fn new_cmd_join(out: &Output) -> CommandNode {
    let out = out.clone();
    CommandNode::leaf("join", JOIN_ABOUT, move |inv| run_join(inv.matches, &mut out.clone()))
        .long_about(JOIN_LONG_ABOUT)
        .arg(
            Arg::new("master")
                .value_name("MASTER")
                .num_args(0..)
                .help("API server endpoints (<host>:<port>) used for token-based discovery"),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .value_name("TOKEN")
                .help("Use this token for both discovery-token and tls-bootstrap-token"),
        )
        .arg(
            Arg::new("discovery-token")
                .long("discovery-token")
                .value_name("TOKEN")
                .help("A token used to validate cluster information fetched from the master"),
        )
        .arg(
            Arg::new("discovery-file")
                .long("discovery-file")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("A file from which to load cluster information"),
        )
        .arg(
            Arg::new("tls-bootstrap-token")
                .long("tls-bootstrap-token")
                .value_name("TOKEN")
                .help("A token used for TLS bootstrapping"),
        )
        .arg(
            Arg::new("discovery-token-ca-cert-hash")
                .long("discovery-token-ca-cert-hash")
                .value_name("HASH")
                .action(ArgAction::Append)
                .help("For token-based discovery, validate that the root CA public key matches this hash (format: \"sha256:<hex>\")"),
        )
        .arg(
            Arg::new("discovery-token-unsafe-skip-ca-verification")
                .long("discovery-token-unsafe-skip-ca-verification")
                .action(ArgAction::SetTrue)
                .help("For token-based discovery, allow joining without --discovery-token-ca-cert-hash pinning"),
        )
        .arg(
            Arg::new("node-name")
                .long("node-name")
                .value_name("NAME")
                .help("Specify the node name"),
        )
        .arg(skip_preflight_arg())
}

/// # Errors
///
/// Returns error if the options are invalid or the stream cannot be written.
pub fn run_join(matches: &ArgMatches, out: &mut impl Write) -> Result<()> {
    let options = JoinOptions::from_matches(matches)?;
    tracing::debug!(
        masters = ?options.masters,
        discovery = ?options.discovery,
        node_name = ?options.node_name,
        "resolved join options"
    );

    if options.skip_preflight {
        writeln!(out, "[preflight] Skipping pre-flight checks")?;
    } else {
        writeln!(out, "[preflight] Would run pre-flight checks")?;
    }

    match &options.discovery {
        Discovery::Token(token) => {
            for master in &options.masters {
                writeln!(
                    out,
                    "[discovery] Would request cluster-info from \"https://{master}\" using token {}",
                    token.id()
                )?;
            }
            if options.ca_cert_hashes.is_empty() {
                writeln!(out, "[discovery] Would skip root CA public key pinning")?;
            } else {
                writeln!(
                    out,
                    "[discovery] Would validate the root CA public key against {}",
                    options.ca_cert_hashes.join(", ")
                )?;
            }
        }
        Discovery::File(path) => {
            writeln!(out, "[discovery] Would load cluster-info from {}", path.display())?;
        }
    }

    writeln!(
        out,
        "[bootstrap] Would perform the TLS bootstrap with token {}",
        options.tls_bootstrap_token.id()
    )?;
    if let Some(node_name) = &options.node_name {
        writeln!(out, "[kubelet] Would register this node as {node_name:?}")?;
    }
    writeln!(out)?;
    writeln!(out, "[join] No changes were made to this host.")?;
    Ok(())
}
