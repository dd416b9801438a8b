// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{defaults, env as keys};
use crate::error::{AgentError, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Agent settings loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Sink configuration file watched for changes
    pub config_path: PathBuf,
    /// Directory the local secret source reads from
    pub secrets_dir: PathBuf,
    /// Window used to coalesce bursts of config writes into one restart
    pub debounce: Duration,
    /// How long a restart waits for the previous generation to exit
    pub drain_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config_path = lookup(keys::CONFIG_PATH)
            .map(PathBuf::from)
            .ok_or_else(|| {
                AgentError::Env(format!("{} environment variable not set", keys::CONFIG_PATH))
            })?;
        let secrets_dir = lookup(keys::SECRETS_DIR)
            .unwrap_or_else(|| defaults::SECRETS_DIR.to_string())
            .into();
        let debounce_ms = parse_number(&lookup, keys::DEBOUNCE_MS, defaults::DEBOUNCE_MS)?;
        let drain_secs = parse_number(&lookup, keys::DRAIN_TIMEOUT_SECS, defaults::DRAIN_TIMEOUT_SECS)?;

        Ok(Config {
            config_path,
            secrets_dir,
            debounce: Duration::from_millis(debounce_ms),
            drain_timeout: Duration::from_secs(drain_secs),
        })
    }
}

fn parse_number(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AgentError::Env(format!("{key}={raw} is not a number: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup_from(&[(keys::CONFIG_PATH, "/etc/agent.yaml")])).unwrap();

        assert_eq!(config.config_path, PathBuf::from("/etc/agent.yaml"));
        assert_eq!(config.secrets_dir, PathBuf::from(defaults::SECRETS_DIR));
        assert_eq!(config.debounce, Duration::from_millis(defaults::DEBOUNCE_MS));
        assert_eq!(config.drain_timeout, Duration::from_secs(defaults::DRAIN_TIMEOUT_SECS));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            (keys::CONFIG_PATH, "agent.yaml"),
            (keys::SECRETS_DIR, "/run/secrets"),
            (keys::DEBOUNCE_MS, "0"),
            (keys::DRAIN_TIMEOUT_SECS, "3"),
        ]))
        .unwrap();

        assert_eq!(config.secrets_dir, PathBuf::from("/run/secrets"));
        assert_eq!(config.debounce, Duration::ZERO);
        assert_eq!(config.drain_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_missing_config_path() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains(keys::CONFIG_PATH));
    }

    #[test]
    fn test_invalid_number() {
        let err = Config::from_lookup(lookup_from(&[
            (keys::CONFIG_PATH, "agent.yaml"),
            (keys::DEBOUNCE_MS, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AgentError::Env(_)));
    }
}
