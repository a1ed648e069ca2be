//! Configuration schema for prebake
//!
//! Configuration is stored at `~/.config/prebake/config.toml`

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Prebuild engine settings
    pub prebuild: PrebuildConfig,

    /// Port allocation settings
    pub ports: PortsConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Prebuild engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrebuildConfig {
    /// Namespace prepended to every cache tag (`<namespace>/<image>:<tag>`)
    pub namespace: String,

    /// External build CLI
    pub builder: String,

    /// CLI used to probe for local images
    pub docker: String,

    /// Reserved top-level key in `devcontainer-lock.json`
    pub lock_namespace: String,
}

impl Default for PrebuildConfig {
    fn default() -> Self {
        Self {
            namespace: "prebake".to_string(),
            builder: "devcontainer".to_string(),
            docker: "docker".to_string(),
            lock_namespace: "prebuiltFeatures".to_string(),
        }
    }
}

/// Port allocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortsConfig {
    /// First port of the scan range (inclusive)
    pub range_start: u16,

    /// Last port of the scan range (inclusive)
    pub range_end: u16,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            range_start: 41000,
            range_end: 41999,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[prebuild]"));
        assert!(toml.contains("[ports]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.prebuild.namespace, "prebake");
        assert_eq!(config.ports.range_start, 41000);
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [prebuild]
            namespace = "acme-cache"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.prebuild.namespace, "acme-cache");
        assert_eq!(config.prebuild.builder, "devcontainer"); // default preserved
        assert_eq!(config.prebuild.lock_namespace, "prebuiltFeatures");
    }
}
