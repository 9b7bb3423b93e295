//! Command factories
//!
//! Each module exposes a `new_cmd_*` factory returning a [`CommandNode`]
//! plus a `run_*` function holding the action, testable against any
//! writer.
//!
//! [`CommandNode`]: crate::cli::CommandNode

pub mod completion;
pub mod config;
pub mod init;
pub mod join;
pub mod phases;
pub mod reset;
pub mod token;
pub mod version;

use std::{net::IpAddr, path::PathBuf};

use clap::{parser::ValueSource, value_parser, Arg, ArgAction, ArgMatches};
use kubeadm_core::{
    config::{
        Api, MasterConfiguration, Networking, Settings, DEFAULT_BIND_PORT, DEFAULT_DNS_DOMAIN,
        DEFAULT_SERVICE_SUBNET, DEFAULT_TOKEN_TTL,
    },
    Error,
};

/// Flags that describe the cluster and conflict with `--config`.
pub(crate) const CLUSTER_FLAGS: [&str; 10] = [
    "apiserver-advertise-address",
    "apiserver-bind-port",
    "kubernetes-version",
    "pod-network-cidr",
    "service-cidr",
    "service-dns-domain",
    "cert-dir",
    "node-name",
    "token",
    "token-ttl",
];

pub(crate) fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .value_name("PATH")
        .value_parser(value_parser!(PathBuf))
        .help("Path to kubeadm config file (WARNING: Usage of a configuration file is experimental)")
}

pub(crate) fn skip_preflight_arg() -> Arg {
    Arg::new("skip-preflight-checks")
        .long("skip-preflight-checks")
        .action(ArgAction::SetTrue)
        .help("Skip preflight checks normally run before modifying the system")
}

pub(crate) fn kubeconfig_arg(settings: &Settings) -> Arg {
    Arg::new("kubeconfig")
        .long("kubeconfig")
        .value_name("PATH")
        .global(true)
        .value_parser(value_parser!(PathBuf))
        .default_value(
            settings
                .kubeconfig_dir
                .join("admin.conf")
                .display()
                .to_string(),
        )
        .help("The KubeConfig file to use when talking to the cluster")
}

pub(crate) fn cluster_args(settings: &Settings) -> Vec<Arg> {
    vec![
        Arg::new("apiserver-advertise-address")
            .long("apiserver-advertise-address")
            .value_name("IP")
            .value_parser(value_parser!(IpAddr))
            .help("The IP address the API Server will advertise it's listening on"),
        Arg::new("apiserver-bind-port")
            .long("apiserver-bind-port")
            .value_name("PORT")
            .value_parser(value_parser!(u16).range(1..))
            .default_value(DEFAULT_BIND_PORT.to_string())
            .help("Port for the API Server to bind to"),
        Arg::new("kubernetes-version")
            .long("kubernetes-version")
            .value_name("VERSION")
            .default_value(settings.kubernetes_version.clone())
            .help("Choose a specific Kubernetes version for the control plane"),
        Arg::new("pod-network-cidr")
            .long("pod-network-cidr")
            .value_name("CIDR")
            .help("Specify range of IP addresses for the pod network; if set, the control plane will automatically allocate CIDRs for every node"),
        Arg::new("service-cidr")
            .long("service-cidr")
            .value_name("CIDR")
            .default_value(DEFAULT_SERVICE_SUBNET)
            .help("Use alternative range of IP address for service VIPs"),
        Arg::new("service-dns-domain")
            .long("service-dns-domain")
            .value_name("DOMAIN")
            .default_value(DEFAULT_DNS_DOMAIN)
            .help("Use alternative domain for services, e.g. \"myorg.internal\""),
        Arg::new("cert-dir")
            .long("cert-dir")
            .value_name("DIR")
            .value_parser(value_parser!(PathBuf))
            .default_value(settings.cert_dir.display().to_string())
            .help("The path where to save and store the certificates"),
        Arg::new("node-name")
            .long("node-name")
            .value_name("NAME")
            .help("Specify the node name"),
        Arg::new("token")
            .long("token")
            .value_name("TOKEN")
            .help("The token to use for establishing bidirectional trust between nodes and masters"),
        Arg::new("token-ttl")
            .long("token-ttl")
            .value_name("DURATION")
            .default_value(DEFAULT_TOKEN_TTL)
            .help("The duration before the bootstrap token is automatically deleted (0 means never expires)"),
    ]
}

/// Cluster configuration from `--config` or from the cluster flags.
///
/// # Errors
///
/// Returns error when `--config` is mixed with cluster flags, or when the
/// resulting configuration is invalid.
pub(crate) fn resolve_master_config(
    matches: &ArgMatches,
    settings: &Settings,
) -> anyhow::Result<MasterConfiguration> {
    let Some(path) = matches.get_one::<PathBuf>("config") else {
        return master_config_from_flags(matches, settings);
    };

    let mixed: Vec<&str> = CLUSTER_FLAGS
        .into_iter()
        .filter(|id| matches.value_source(id) == Some(ValueSource::CommandLine))
        .collect();
    if !mixed.is_empty() {
        return Err(Error::validation(format!(
            "can not mix '--config' with arguments {mixed:?}"
        ))
        .into());
    }

    Ok(MasterConfiguration::from_file(path)?)
}

/// Cluster configuration built from [`cluster_args`] alone.
pub(crate) fn master_config_from_flags(
    matches: &ArgMatches,
    settings: &Settings,
) -> anyhow::Result<MasterConfiguration> {
    let defaults = MasterConfiguration::from_settings(settings);
    let string_flag = |id: &str| matches.get_one::<String>(id).cloned();

    let config = MasterConfiguration {
        api: Api {
            advertise_address: matches
                .get_one::<IpAddr>("apiserver-advertise-address")
                .copied(),
            bind_port: matches
                .get_one::<u16>("apiserver-bind-port")
                .copied()
                .unwrap_or(defaults.api.bind_port),
        },
        kubernetes_version: string_flag("kubernetes-version")
            .unwrap_or(defaults.kubernetes_version),
        networking: Networking {
            service_subnet: string_flag("service-cidr")
                .unwrap_or(defaults.networking.service_subnet),
            pod_subnet: string_flag("pod-network-cidr"),
            dns_domain: string_flag("service-dns-domain")
                .unwrap_or(defaults.networking.dns_domain),
        },
        certificates_dir: matches
            .get_one::<PathBuf>("cert-dir")
            .cloned()
            .unwrap_or(defaults.certificates_dir),
        node_name: string_flag("node-name"),
        token: string_flag("token"),
        token_ttl: string_flag("token-ttl").unwrap_or(defaults.token_ttl),
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use std::io::Write;

    use clap::Command;

    use super::*;

    fn parse(args: &[&str]) -> ArgMatches {
        Command::new("init")
            .arg(config_arg())
            .args(cluster_args(&Settings::default()))
            .try_get_matches_from(args)
            .unwrap()
    }

    #[test]
    fn test_flags_default_from_settings() {
        let config = resolve_master_config(&parse(&["init"]), &Settings::default()).unwrap();
        assert_eq!(config, MasterConfiguration::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = resolve_master_config(
            &parse(&[
                "init",
                "--apiserver-advertise-address",
                "10.0.0.5",
                "--pod-network-cidr",
                "10.244.0.0/16",
                "--token",
                "abcdef.0123456789abcdef",
            ]),
            &Settings::default(),
        )
        .unwrap();
        assert_eq!(
            config.api.advertise_address,
            Some("10.0.0.5".parse().unwrap())
        );
        assert_eq!(config.networking.pod_subnet.as_deref(), Some("10.244.0.0/16"));
        assert_eq!(config.token.as_deref(), Some("abcdef.0123456789abcdef"));
    }

    #[test]
    fn test_invalid_flag_values_are_rejected() {
        let err = resolve_master_config(
            &parse(&["init", "--service-cidr", "10.96.0.0"]),
            &Settings::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("networking.serviceSubnet"));
    }

    #[test]
    fn test_config_cannot_mix_with_cluster_flags() {
        let err = resolve_master_config(
            &parse(&["init", "--config", "/tmp/kubeadm.yaml", "--node-name", "n1"]),
            &Settings::default(),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"can not mix '--config' with arguments ["node-name"]"#
        );
    }

    #[test]
    fn test_config_file_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"kubernetesVersion: v1.8.0\nnodeName: master-0\n")
            .unwrap();
        let path = file.path().to_str().unwrap();
        let config =
            resolve_master_config(&parse(&["init", "--config", path]), &Settings::default())
                .unwrap();
        assert_eq!(config.kubernetes_version, "v1.8.0");
        assert_eq!(config.node_name.as_deref(), Some("master-0"));
    }
}
