// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Type for configuration / validation failures

use thiserror::Error;

/// The reasons why we may reject a configuration
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Could not parse configuration: {0}")]
    Parse(String),
    #[error("Could not serialize configuration: {0}")]
    Serialize(String),
    #[error("Context '{0}' has an empty instance name")]
    EmptyInstanceName(&'static str),
    #[error("Instance name '{0}' is used by more than one context")]
    DuplicateInstanceName(String),
}

/// Result-like type for configurations
pub type ConfigResult = Result<(), ConfigError>;
