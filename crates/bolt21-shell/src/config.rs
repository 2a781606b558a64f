//! Shell configuration
//!
//! Compiled-in defaults, optionally overridden by a bundled JSON file.

use anyhow::Context;
use bolt21_net::PinningSettings;
use bolt21_shield::ShieldConfig;
use serde::{Deserialize, Serialize};

/// Default tracing filter
pub const DEFAULT_LOG_FILTER: &str = "info";

/// App shell configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Tracing filter directive
    pub log_filter: String,
    /// Screen capture protection
    pub shield: ShieldConfig,
    /// Certificate pinning
    pub pinning: PinningSettings,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            shield: ShieldConfig::default(),
            pinning: PinningSettings::default(),
        }
    }
}

impl ShellConfig {
    /// Parse from JSON; omitted sections keep their defaults
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("Failed to parse shell config")
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize shell config")
    }
}
