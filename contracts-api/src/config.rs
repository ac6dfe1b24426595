//! Configuration for the contracts API

use crate::capabilities::{ApiVersion, Capability, CapabilitySet};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Contracts API configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API version contracts are validated against
    pub api_version: ApiVersion,

    /// Capabilities enabled on top of the version baseline
    pub enabled_capabilities: Vec<Capability>,

    /// Capabilities removed from the version baseline
    pub disabled_capabilities: Vec<Capability>,

    /// Documentation output
    pub docs: DocsConfig,
}

/// Output format of the documentation tool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocsFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// TOML
    Toml,
}

impl std::str::FromStr for DocsFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(DocsFormat::Json),
            "toml" => Ok(DocsFormat::Toml),
            other => Err(Error::Config(format!("Unknown docs format '{}'", other))),
        }
    }
}

/// Documentation tool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Output format
    pub format: DocsFormat,

    /// Include one-line type descriptions
    pub include_descriptions: bool,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            format: DocsFormat::Json,
            include_descriptions: true,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(version) = std::env::var("CONTRACTS_API_VERSION") {
            config.api_version = version.parse()?;
        }

        if let Ok(list) = std::env::var("CONTRACTS_ENABLE") {
            config.enabled_capabilities = parse_capabilities(&list)?;
        }

        if let Ok(list) = std::env::var("CONTRACTS_DISABLE") {
            config.disabled_capabilities = parse_capabilities(&list)?;
        }

        if let Ok(format) = std::env::var("CONTRACTS_DOCS_FORMAT") {
            config.docs.format = format.parse()?;
        }

        Ok(config)
    }

    /// Resolve the capability set this configuration describes
    pub fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::for_version(self.api_version)
            .with_overrides(&self.enabled_capabilities, &self.disabled_capabilities)
    }
}

/// Comma separated capability names
fn parse_capabilities(list: &str) -> Result<Vec<Capability>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}
