//! `kubeadm version`

use std::io::Write;

use anyhow::Result;
use clap::{builder::PossibleValuesParser, Arg, ArgMatches};
use serde::Serialize;

use crate::cli::{CommandNode, Output};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub major: String,
    pub minor: String,
    pub git_version: String,
    pub platform: String,
}

impl VersionInfo {
    /// Version of this build.
    pub fn current() -> Self {
        Self {
            major: env!("CARGO_PKG_VERSION_MAJOR").to_string(),
            minor: env!("CARGO_PKG_VERSION_MINOR").to_string(),
            git_version: format!("v{}", env!("CARGO_PKG_VERSION")),
            platform: format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VersionDocument {
    client_version: VersionInfo,
}

pub fn new_cmd_version(out: &Output) -> CommandNode {
    let out = out.clone();
    CommandNode::leaf("version", "Print the version of kubeadm", move |inv| {
        run_version(inv.matches, &mut out.clone())
    })
    .arg(
        Arg::new("output")
            .short('o')
            .long("output")
            .value_name("FORMAT")
            .value_parser(PossibleValuesParser::new(["short", "json", "yaml"]))
            .help("Output format"),
    )
}

/// # Errors
///
/// Returns error if serialization or the write fails.
pub fn run_version(matches: &ArgMatches, out: &mut impl Write) -> Result<()> {
    let info = VersionInfo::current();
    match matches.get_one::<String>("output").map(String::as_str) {
        Some("short") => writeln!(out, "{}", info.git_version)?,
        Some("json") => {
            let doc = VersionDocument {
                client_version: info,
            };
            writeln!(out, "{}", serde_json::to_string_pretty(&doc)?)?;
        }
        Some("yaml") => {
            let doc = VersionDocument {
                client_version: info,
            };
            write!(out, "{}", serde_yaml::to_string(&doc)?)?;
        }
        _ => writeln!(
            out,
            "kubeadm version: {} ({})",
            info.git_version, info.platform
        )?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn version(args: &[&str]) -> Result<String> {
        let (out, _) = Output::capture();
        let matches = new_cmd_version(&out)
            .to_command()
            .try_get_matches_from(std::iter::once("version").chain(args.iter().copied()))?;
        let mut buf = Vec::new();
        run_version(&matches, &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    #[test]
    fn test_default_and_short_output() {
        let expected = format!("v{}", env!("CARGO_PKG_VERSION"));
        assert!(version(&[]).unwrap().starts_with(&format!("kubeadm version: {expected} (")));
        assert_eq!(version(&["-o", "short"]).unwrap(), format!("{expected}\n"));
    }

    #[test]
    fn test_structured_output() {
        let json: serde_json::Value = serde_json::from_str(&version(&["--output", "json"]).unwrap()).unwrap();
        assert_eq!(
            json["clientVersion"]["major"],
            env!("CARGO_PKG_VERSION_MAJOR")
        );
        let yaml = version(&["-o", "yaml"]).unwrap();
        assert!(yaml.starts_with("clientVersion:\n"));
        assert!(yaml.contains("gitVersion:"));
    }

    #[test]
    fn test_unknown_format_is_a_parse_error() {
        let err = version(&["-o", "xml"]).unwrap_err();
        assert!(err.downcast_ref::<clap::Error>().is_some());
    }
}
