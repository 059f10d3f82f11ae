//! Host security policy projection.
//!
//! The orchestrator that launches tools reads one flag from host
//! configuration: whether execution must be forced into an isolated sandbox.
//! This module only parses and exposes that flag; it takes no part in the
//! redaction or environment checks.

use anyhow::Context;
use serde::Deserialize;

/// Slice of the host configuration consumed by the guard.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecurityConfig {
    pub strict_mode: bool,
}

impl GuardConfig {
    /// Parse the config from its JSON resource. A missing `security`
    /// section means strict mode is off.
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).context("failed to parse guard configuration")
    }
}

/// Whether tool execution must run inside an isolated sandbox.
pub fn should_force_sandbox(config: &GuardConfig) -> bool {
    config.security.strict_mode
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_not_strict() {
        let config = GuardConfig::default();
        assert!(!should_force_sandbox(&config));
    }

    #[test]
    fn test_strict_mode_from_json() {
        let config = GuardConfig::from_json(r#"{"security": {"strictMode": true}}"#).unwrap();
        assert!(should_force_sandbox(&config));
    }

    #[test]
    fn test_missing_security_section() {
        let config = GuardConfig::from_json(r#"{"other": 1}"#).unwrap();
        assert!(!should_force_sandbox(&config));
    }

    #[test]
    fn test_strict_mode_false() {
        let config = GuardConfig::from_json(r#"{"security": {"strictMode": false}}"#).unwrap();
        assert!(!should_force_sandbox(&config));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(GuardConfig::from_json("{not json").is_err());
    }
}
