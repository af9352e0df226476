//! Rotator configuration loading and types.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use keywheel_core::ColumnLayout;
use keywheel_notify::MailConfig;
use keywheel_portal::PortalConfig;
use keywheel_rotation::{EnvironmentGroup, RosterColumns};

/// Configuration errors; all fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Root rotator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Object-store URL of the registry document (`s3://bucket/key`).
    pub document_url: String,
    /// Roster column header names.
    #[serde(default)]
    pub roster: RosterColumns,
    /// Physical layout of the registry sheet's columns.
    #[serde(default)]
    pub layout: ColumnLayout,
    /// Environments to process, keyed by name. Processed in key order.
    pub environments: BTreeMap<String, EnvironmentConfig>,
    /// Summary email settings.
    #[serde(default)]
    pub mail: MailConfig,
}

/// One environment's sheets and portal target.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentConfig {
    /// Roster sheet name in the shared document.
    pub roster_sheet: String,
    /// Registry sheet name in the shared document.
    pub registry_sheet: String,
    /// Portal deployment for this environment.
    pub portal: PortalConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Read {
                path: path.as_ref().display().to_string(),
                source,
            })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        if config.environments.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one environment must be configured".to_string(),
            ));
        }
        Ok(config)
    }

    /// Config file path from the environment, or the default location.
    pub fn config_path() -> String {
        std::env::var("KEYWHEEL_CONFIG").unwrap_or_else(|_| "./config/keywheel.yaml".to_string())
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("KEYWHEEL_DOCUMENT_URL") {
            self.document_url = url;
        }
    }

    /// The configured environments as engine groups, in name order.
    pub fn groups(&self) -> Vec<EnvironmentGroup> {
        self.environments
            .iter()
            .map(|(name, env)| EnvironmentGroup {
                name: name.clone(),
                roster_sheet: env.roster_sheet.clone(),
                registry_sheet: env.registry_sheet.clone(),
                portal: env.portal.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keywheel_core::RegistryColumn;

    const MINIMAL: &str = r"
document_url: s3://accounts/rotation/registry.json

environments:
  dev:
    roster_sheet: Accounts-dev
    registry_sheet: Rotation-dev
    portal:
      hostname: portal.dev.example.com
      idm_hostname: idm.dev.example.com
";

    #[test]
    fn minimal_config_parses_with_defaults() {
        let config = AppConfig::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.document_url, "s3://accounts/rotation/registry.json");
        assert_eq!(config.roster.username_header, "Username");
        assert_eq!(config.layout, ColumnLayout::standard());
        assert!(!config.mail.enabled);

        let groups = config.groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "dev");
        assert_eq!(groups[0].portal.scheme, "https");
    }

    #[test]
    fn environments_are_ordered_by_name() {
        let yaml = r"
document_url: s3://b/k
environments:
  prod:
    roster_sheet: A
    registry_sheet: R
    portal: {hostname: p, idm_hostname: i}
  dev:
    roster_sheet: A
    registry_sheet: R
    portal: {hostname: p, idm_hostname: i}
";
        let config = AppConfig::from_yaml(yaml).unwrap();
        let names: Vec<String> = config.groups().into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["dev", "prod"]);
    }

    #[test]
    fn custom_layout_is_validated() {
        let yaml = r"
document_url: s3://b/k
layout: {user: 3, credential: 2, previous: 1, timestamp: 0}
environments:
  dev:
    roster_sheet: A
    registry_sheet: R
    portal: {hostname: p, idm_hostname: i}
";
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.layout.index(RegistryColumn::User), 3);

        let bad = yaml.replace("user: 3", "user: 2");
        assert!(AppConfig::from_yaml(&bad).is_err());
    }

    #[test]
    fn empty_environments_rejected() {
        let yaml = "document_url: s3://b/k\nenvironments: {}\n";
        let err = AppConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn mail_block_round_trips() {
        let yaml = r"
document_url: s3://b/k
environments:
  dev:
    roster_sheet: A
    registry_sheet: R
    portal: {hostname: p, idm_hostname: i}
mail:
  enabled: true
  smtp_host: relay.internal
  sender_name: Rotation Bot
  from_address: rotation@example.com
  recipients: [ops@example.com]
";
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert!(config.mail.enabled);
        assert_eq!(config.mail.smtp_port, 25);
        assert_eq!(config.mail.recipients, vec!["ops@example.com"]);
    }
}
