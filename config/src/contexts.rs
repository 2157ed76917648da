// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Naming context settings

use crate::{ConfigError, ConfigResult};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Settings of one name/index mapping context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContextConfig {
    /// Records of the context are persisted under this name.
    pub instance_name: String,
    /// Made-up names are this prefix followed by the decimal index.
    pub artificial_name_prefix: String,
}

impl ContextConfig {
    #[must_use]
    pub fn new(instance_name: &str, artificial_name_prefix: &str) -> Self {
        Self {
            instance_name: instance_name.to_owned(),
            artificial_name_prefix: artificial_name_prefix.to_owned(),
        }
    }
}

/// Settings of one composite-key mapping context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MultiContextConfig {
    pub instance_name: String,
    /// The lowest index the context hands out.
    #[serde(default)]
    pub start_index: u32,
}

/// Settings of all the mapping contexts.
#[derive(Builder, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[builder(default)]
#[serde(default, rename_all = "kebab-case")]
pub struct ContextsConfig {
    pub interface: ContextConfig,
    pub bridge_domain: ContextConfig,
    pub acl: ContextConfig,
    pub macip_acl: ContextConfig,
    pub classify_table: ContextConfig,
    pub ipsec_sad: MultiContextConfig,
}

impl Default for ContextsConfig {
    fn default() -> Self {
        Self {
            interface: ContextConfig::new("interface-context", "interface"),
            bridge_domain: ContextConfig::new("bridge-domain-context", "bridge-domain"),
            acl: ContextConfig::new("acl-context", "vpp-acl-"),
            macip_acl: ContextConfig::new("macip-acl-context", "vpp-macip-acl-"),
            classify_table: ContextConfig::new("classify-table-context", "classify-table-"),
            ipsec_sad: MultiContextConfig {
                instance_name: "ipsec-sad-context".to_owned(),
                start_index: 0,
            },
        }
    }
}

impl ContextsConfig {
    /// Parse a YAML document. Contexts it does not mention keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: ContextsConfig =
            serde_yaml_ng::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        debug!("Loaded mapping contexts configuration: {config:?}");
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml_ng::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    fn instance_names(&self) -> [(&'static str, &str); 6] {
        [
            ("interface", self.interface.instance_name.as_str()),
            ("bridge-domain", self.bridge_domain.instance_name.as_str()),
            ("acl", self.acl.instance_name.as_str()),
            ("macip-acl", self.macip_acl.instance_name.as_str()),
            ("classify-table", self.classify_table.instance_name.as_str()),
            ("ipsec-sad", self.ipsec_sad.instance_name.as_str()),
        ]
    }

    /// Contexts share one mapping store: every one of them needs its own, non-empty, instance name.
    pub fn validate(&self) -> ConfigResult {
        let mut seen = BTreeSet::new();
        for (context, instance_name) in self.instance_names() {
            if instance_name.is_empty() {
                return Err(ConfigError::EmptyInstanceName(context));
            }
            if !seen.insert(instance_name) {
                return Err(ConfigError::DuplicateInstanceName(instance_name.to_owned()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        let config = ContextsConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.acl.artificial_name_prefix, "vpp-acl-");
        assert_eq!(config.interface.instance_name, "interface-context");
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = r"
classify-table:
  instance-name: tables
  artificial-name-prefix: table-
ipsec-sad:
  instance-name: sad
  start-index: 100
";
        let config = ContextsConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.classify_table, ContextConfig::new("tables", "table-"));
        assert_eq!(config.ipsec_sad.start_index, 100);
        assert_eq!(config.acl, ContextsConfig::default().acl);
    }

    #[test]
    fn yaml_round_trip() {
        let config = ContextsConfigBuilder::default()
            .interface(ContextConfig::new("ifaces", "if-"))
            .build()
            .unwrap();
        let parsed = ContextsConfig::from_yaml(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn duplicate_instance_names_are_rejected() {
        let config = ContextsConfigBuilder::default()
            .macip_acl(ContextConfig::new("acl-context", "vpp-macip-acl-"))
            .build()
            .unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateInstanceName("acl-context".to_owned()))
        );
    }

    #[test]
    fn empty_instance_name_is_rejected() {
        let yaml = "
bridge-domain:
  instance-name: ''
  artificial-name-prefix: bd
";
        assert_eq!(
            ContextsConfig::from_yaml(yaml),
            Err(ConfigError::EmptyInstanceName("bridge-domain"))
        );
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(
            ContextsConfig::from_yaml("interface: [1, 2"),
            Err(ConfigError::Parse(_))
        ));
    }
}
