// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;
use thiserror::Error;

/// Failures scoped to a single secret during one render call.
///
/// None of the messages carry the secret value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error("secret {name} has no {field}")]
    MissingField { name: String, field: &'static str },

    #[error("secret {name}: got unexpected content type: {content_type}")]
    UnexpectedContentType { name: String, content_type: String },

    #[error("secret {name}: failed to decode value: {reason}")]
    Decode { name: String, reason: String },

    #[error("secret {name} does not contain a private key")]
    NoPrivateKey { name: String },

    #[error("secret {name} does not contain a certificate")]
    NoCertificate { name: String },

    #[error("{function} lookup failed: expected a secret named {name}")]
    NotFound { function: &'static str, name: String },
}

/// Failures while rendering a template.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("error reading template {path}: {source}")]
    ReadTemplate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("error parsing template:\n{template}\nerror: {source}")]
    Parse {
        template: String,
        source: minijinja::Error,
    },

    #[error("error executing template:\n{template}\nerror: {source}")]
    Execute {
        template: String,
        source: minijinja::Error,
    },

    #[error(transparent)]
    Secret(#[from] SecretError),
}

impl RenderError {
    /// True when the failure depends on the secrets seen by this one call, so a
    /// later render against fresh secrets may succeed. Template defects are not.
    pub fn is_call_scoped(&self) -> bool {
        matches!(self, RenderError::Secret(_))
    }
}

/// Process-level failures.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("failed to read config {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ParseConfig {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid environment: {0}")]
    Env(String),

    #[error("file watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;
