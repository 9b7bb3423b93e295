//! Cluster configuration consumed by `init`, `config` and the phases
//!
//! Serialized as camelCase YAML. Keys missing from a file take the
//! built-in defaults.

use std::{
    net::IpAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use super::{Settings, DEFAULT_CERT_DIR, DEFAULT_KUBERNETES_VERSION};
use crate::{token::BootstrapToken, Error, Result};

pub const DEFAULT_BIND_PORT: u16 = 6443;
pub const DEFAULT_SERVICE_SUBNET: &str = "10.96.0.0/12";
pub const DEFAULT_DNS_DOMAIN: &str = "cluster.local";
pub const DEFAULT_TOKEN_TTL: &str = "24h";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Api {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advertise_address: Option<IpAddr>,
    pub bind_port: u16,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            advertise_address: None,
            bind_port: DEFAULT_BIND_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Networking {
    pub service_subnet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_subnet: Option<String>,
    pub dns_domain: String,
}

impl Default for Networking {
    fn default() -> Self {
        Self {
            service_subnet: DEFAULT_SERVICE_SUBNET.to_string(),
            pod_subnet: None,
            dns_domain: DEFAULT_DNS_DOMAIN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MasterConfiguration {
    pub api: Api,
    pub kubernetes_version: String,
    pub networking: Networking,
    pub certificates_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(rename = "tokenTTL")]
    pub token_ttl: String,
}

impl Default for MasterConfiguration {
    fn default() -> Self {
        Self {
            api: Api::default(),
            kubernetes_version: DEFAULT_KUBERNETES_VERSION.to_string(),
            networking: Networking::default(),
            certificates_dir: PathBuf::from(DEFAULT_CERT_DIR),
            node_name: None,
            token: None,
            token_ttl: DEFAULT_TOKEN_TTL.to_string(),
        }
    }
}

impl MasterConfiguration {
    /// Defaults with the settings-controlled values applied.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            kubernetes_version: settings.kubernetes_version.clone(),
            certificates_dir: settings.cert_dir.clone(),
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns error if the YAML is malformed or fails validation.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| Error::parse_error("cluster configuration", e))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns error if the file is missing, unreadable, malformed or invalid.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::not_found(format!(
                "configuration file {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::io_error(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&content)
    }

    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::parse_error("cluster configuration", e))
    }

    pub fn token_ttl(&self) -> Result<Duration> {
        parse_duration(&self.token_ttl)
    }

    /// # Errors
    ///
    /// Returns error on the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.api.bind_port == 0 {
            return Err(Error::validation("api.bindPort must be between 1 and 65535"));
        }
        if self.kubernetes_version.trim().is_empty() {
            return Err(Error::validation("kubernetesVersion must not be empty"));
        }
        validate_cidr("networking.serviceSubnet", &self.networking.service_subnet)?;
        if let Some(pod_subnet) = &self.networking.pod_subnet {
            validate_cidr("networking.podSubnet", pod_subnet)?;
        }
        if self.networking.dns_domain.trim().is_empty() {
            return Err(Error::validation("networking.dnsDomain must not be empty"));
        }
        if let Some(token) = &self.token {
            token.parse::<BootstrapToken>()?;
        }
        self.token_ttl()?;
        Ok(())
    }
}

fn validate_cidr(field: &str, value: &str) -> Result<()> {
    let invalid = || Error::validation(format!("{field}: {value:?} is not a valid CIDR"));
    let (addr, prefix) = value.split_once('/').ok_or_else(invalid)?;
    let addr: IpAddr = addr.parse().map_err(|_| invalid())?;
    let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
    let max = if addr.is_ipv4() { 32 } else { 128 };
    if prefix > max {
        return Err(invalid());
    }
    Ok(())
}

/// Parse a duration such as `24h`, `1h30m`, `90s` or `0`.
///
/// # Errors
///
/// Returns error on an empty string, a missing unit, or an unknown unit.
pub fn parse_duration(value: &str) -> Result<Duration> {
    let invalid = |reason: &str| Error::validation(format!("invalid duration {value:?}: {reason}"));
    let value_trimmed = value.trim();
    if value_trimmed.is_empty() {
        return Err(invalid("empty"));
    }
    if value_trimmed == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    for c in value_trimmed.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let amount: u64 = digits.parse().map_err(|_| invalid("missing number"))?;
        let unit = match c {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return Err(invalid("unknown unit, expected h, m or s")),
        };
        total = amount
            .checked_mul(unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| invalid("too large"))?;
        digits.clear();
    }
    if !digits.is_empty() {
        return Err(invalid("missing unit"));
    }
    Ok(Duration::from_secs(total))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use std::io::Write;

    use super::*;

    #[test]
    fn test_from_settings_applies_version_and_cert_dir() {
        let settings = Settings {
            kubernetes_version: "v1.8.3".to_string(),
            cert_dir: PathBuf::from("/srv/pki"),
            ..Settings::default()
        };
        let config = MasterConfiguration::from_settings(&settings);
        assert_eq!(config.kubernetes_version, "v1.8.3");
        assert_eq!(config.certificates_dir, PathBuf::from("/srv/pki"));
        assert_eq!(config.api.bind_port, DEFAULT_BIND_PORT);
    }

    #[test]
    fn test_yaml_uses_camel_case_keys() {
        let yaml = MasterConfiguration::default().to_yaml().unwrap();
        assert!(yaml.contains("kubernetesVersion: stable-1.8"));
        assert!(yaml.contains("serviceSubnet: 10.96.0.0/12"));
        assert!(yaml.contains("tokenTTL: 24h"));
        assert!(!yaml.contains("podSubnet"));
    }

    #[test]
    fn test_from_yaml_fills_missing_keys() {
        let config = MasterConfiguration::from_yaml(
            "api:\n  advertiseAddress: 192.168.0.10\nnetworking:\n  podSubnet: 10.244.0.0/16\n",
        )
        .unwrap();
        assert_eq!(
            config.api.advertise_address,
            Some("192.168.0.10".parse().unwrap())
        );
        assert_eq!(config.api.bind_port, 6443);
        assert_eq!(config.networking.pod_subnet.as_deref(), Some("10.244.0.0/16"));
        assert_eq!(config.networking.dns_domain, "cluster.local");
    }

    #[test]
    fn test_validation_rejects_bad_fields() {
        let bad_port = MasterConfiguration {
            api: Api {
                bind_port: 0,
                ..Api::default()
            },
            ..MasterConfiguration::default()
        };
        assert!(bad_port.validate().is_err());

        let bad_cidr = MasterConfiguration::from_yaml("networking:\n  podSubnet: 10.244.0.0/33\n");
        assert!(bad_cidr.is_err());

        let bad_token = MasterConfiguration::from_yaml("token: nope\n");
        assert!(matches!(bad_token, Err(Error::InvalidToken { .. })));

        let bad_ttl = MasterConfiguration::from_yaml("tokenTTL: 3d\n");
        assert!(bad_ttl.is_err());
    }

    #[test]
    fn test_from_file_missing_is_not_found() {
        let err = MasterConfiguration::from_file(Path::new("/nonexistent/kubeadm.yaml")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_from_file_reads_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"kubernetesVersion: v1.8.1\n").unwrap();
        let config = MasterConfiguration::from_file(file.path()).unwrap();
        assert_eq!(config.kubernetes_version, "v1.8.1");
    }

    #[test]
    fn test_parse_duration_forms() {
        assert_eq!(parse_duration("24h").unwrap(), Duration::from_secs(86_400));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5_400));
        assert_eq!(parse_duration("90s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
        assert!(parse_duration("").is_err());
        assert!(parse_duration("15").is_err());
        assert!(parse_duration("h").is_err());
        assert!(parse_duration("2d").is_err());
    }
}
