// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Sink configuration file model and parsing.

use crate::constants::defaults;
use crate::error::{AgentError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One target the agent keeps synchronized
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SinkConfig {
    pub name: String,
    /// Output file written by the worker
    pub path: PathBuf,
    /// Inline template body
    #[serde(default)]
    pub template: Option<String>,
    /// Template file, read on every render
    #[serde(default)]
    pub template_path: Option<PathBuf>,
    /// Secrets fetched before each render
    #[serde(default)]
    pub secrets: Vec<String>,
    #[serde(default = "default_frequency")]
    pub frequency: String,
    /// Octal permission bits of the output file, e.g. "0640"
    #[serde(default)]
    pub mode: Option<String>,
}

/// Where a sink's template body comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSource<'a> {
    Inline(&'a str),
    File(&'a Path),
}

impl SinkConfig {
    pub fn template_source(&self) -> Option<TemplateSource<'_>> {
        match (&self.template, &self.template_path) {
            (Some(body), None) => Some(TemplateSource::Inline(body)),
            (None, Some(path)) => Some(TemplateSource::File(path)),
            _ => None,
        }
    }

    /// Refresh interval; validated at parse time
    pub fn refresh_interval(&self) -> Result<Duration> {
        parse_duration(&self.frequency)
    }

    /// Permission bits for the output file, owner-only unless configured
    pub fn file_mode(&self) -> Result<u32> {
        let Some(raw) = self.mode.as_deref() else {
            return Ok(defaults::FILE_MODE);
        };
        match u32::from_str_radix(raw.trim(), 8) {
            Ok(mode) if mode <= 0o777 => Ok(mode),
            _ => Err(AgentError::InvalidConfig(format!(
                "invalid mode '{}': must be octal permission bits such as 0640",
                raw
            ))),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AgentError::InvalidConfig("sink name cannot be empty".to_string()));
        }
        if self.path.as_os_str().is_empty() {
            return Err(AgentError::InvalidConfig(format!(
                "sink {} has an empty path",
                self.name
            )));
        }
        if self.template_source().is_none() {
            return Err(AgentError::InvalidConfig(format!(
                "sink {} must set exactly one of template or templatePath",
                self.name
            )));
        }
        self.refresh_interval()
            .and_then(|_| self.file_mode())
            .map_err(|e| AgentError::InvalidConfig(format!("sink {}: {}", self.name, e)))?;
        Ok(())
    }
}

fn default_frequency() -> String {
    defaults::FREQUENCY.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    sinks: Vec<SinkConfig>,
}

/// Read and parse the sink configuration file, preserving sink order
pub async fn parse_config(path: &Path) -> Result<Vec<SinkConfig>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| AgentError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
    parse_config_str(path, &contents)
}

pub fn parse_config_str(path: &Path, contents: &str) -> Result<Vec<SinkConfig>> {
    let file: ConfigFile =
        serde_yaml::from_str(contents).map_err(|source| AgentError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })?;

    let mut seen = HashSet::new();
    for sink in &file.sinks {
        sink.validate()?;
        if !seen.insert(sink.name.as_str()) {
            return Err(AgentError::InvalidConfig(format!(
                "duplicate sink name {}",
                sink.name
            )));
        }
    }

    Ok(file.sinks)
}

/// Parse a duration such as "30s", "5m", "1h" or "1d"
pub fn parse_duration(raw: &str) -> Result<Duration> {
    let trimmed = raw.trim();
    let invalid = || {
        AgentError::InvalidConfig(format!(
            "invalid duration '{}': must match <number><unit> where unit is s, m, h, or d",
            trimmed
        ))
    };

    let unit = trimmed.chars().last().ok_or_else(invalid)?;
    let number: u64 = trimmed[..trimmed.len() - unit.len_utf8()]
        .parse()
        .map_err(|_| invalid())?;
    if number == 0 {
        return Err(AgentError::InvalidConfig(
            "duration must be greater than 0".to_string(),
        ));
    }

    let multiplier: u64 = match unit.to_ascii_lowercase() {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        'd' => 86400,
        _ => return Err(invalid()),
    };
    let seconds = number.checked_mul(multiplier).ok_or_else(|| {
        AgentError::InvalidConfig(format!("duration '{}' is out of range", trimmed))
    })?;
    Ok(Duration::from_secs(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> Result<Vec<SinkConfig>> {
        parse_config_str(Path::new("agent.yaml"), contents)
    }

    #[test]
    fn test_parse_preserves_order() {
        let sinks = parse(
            r#"
sinks:
  - name: web
    path: /etc/ssl/web.pem
    template: '{{ fullChain("web") }}'
    secrets: [web]
    frequency: 5m
  - name: db
    path: /etc/ssl/db.key
    templatePath: /etc/agent/db.tmpl
"#,
        )
        .unwrap();

        assert_eq!(sinks.len(), 2);
        assert_eq!(sinks[0].name, "web");
        assert_eq!(sinks[0].secrets, vec!["web".to_string()]);
        assert_eq!(sinks[0].refresh_interval().unwrap(), Duration::from_secs(300));
        assert_eq!(sinks[1].name, "db");
        assert_eq!(
            sinks[1].template_source(),
            Some(TemplateSource::File(Path::new("/etc/agent/db.tmpl")))
        );
        assert_eq!(sinks[1].refresh_interval().unwrap(), Duration::from_secs(60));
    }

    #[test]
    fn test_parse_empty_file() {
        assert!(parse("sinks: []").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse("sinks: [this is: not: valid"),
            Err(AgentError::ParseConfig { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_fields() {
        assert!(matches!(
            parse("sinks:\n  - name: a\n    path: /tmp/a\n    template: x\n    colour: red\n"),
            Err(AgentError::ParseConfig { .. })
        ));
    }

    #[test]
    fn test_both_template_kinds_rejected() {
        let err = parse(
            "sinks:\n  - name: a\n    path: /tmp/a\n    template: x\n    templatePath: /tmp/t\n",
        )
        .unwrap_err();
        assert!(matches!(err, AgentError::InvalidConfig(_)));
    }

    #[test]
    fn test_missing_template_rejected() {
        let err = parse("sinks:\n  - name: a\n    path: /tmp/a\n").unwrap_err();
        assert!(err.to_string().contains("exactly one of template"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = parse(
            "sinks:\n  - name: a\n    path: /tmp/a\n    template: x\n  - name: a\n    path: /tmp/b\n    template: y\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate sink name a"));
    }

    #[test]
    fn test_bad_frequency_rejected() {
        let err = parse("sinks:\n  - name: a\n    path: /tmp/a\n    template: x\n    frequency: often\n")
            .unwrap_err();
        assert!(matches!(err, AgentError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let err = parse_config(Path::new("/nonexistent/agent.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ReadConfig { .. }));
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("1D").unwrap(), Duration::from_secs(86400));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("5w").is_err());
    }

    #[test]
    fn test_parse_duration_overflow() {
        assert!(matches!(
            parse_duration("999999999999999999d"),
            Err(AgentError::InvalidConfig(_))
        ));
        assert!(matches!(
            parse_duration("18446744073709551615m"),
            Err(AgentError::InvalidConfig(_))
        ));
        assert_eq!(
            parse_duration("18446744073709551615s").unwrap(),
            Duration::from_secs(u64::MAX)
        );
    }

    #[test]
    fn test_huge_frequency_rejected_in_config() {
        let err = parse(
            "sinks:\n  - name: a\n    path: /tmp/a\n    template: x\n    frequency: 999999999999999999d\n",
        )
        .unwrap_err();
        assert!(matches!(err, AgentError::InvalidConfig(_)));
    }

    #[test]
    fn test_file_mode() {
        let sinks = parse(
            "sinks:\n  - name: a\n    path: /tmp/a\n    template: x\n  - name: b\n    path: /tmp/b\n    template: y\n    mode: \"0644\"\n",
        )
        .unwrap();

        assert_eq!(sinks[0].file_mode().unwrap(), 0o600);
        assert_eq!(sinks[1].file_mode().unwrap(), 0o644);
    }

    #[test]
    fn test_bad_file_mode_rejected() {
        for mode in ["\"rw-r--r--\"", "\"0999\"", "\"1777\""] {
            let err = parse(&format!(
                "sinks:\n  - name: a\n    path: /tmp/a\n    template: x\n    mode: {mode}\n"
            ))
            .unwrap_err();
            assert!(matches!(err, AgentError::InvalidConfig(_)), "{mode} accepted");
        }
    }
}
