// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Content types a vault attaches to secret values
pub mod content_types {
    pub const PEM: &str = "application/x-pem-file";
    pub const PKCS12: &str = "application/x-pkcs12";
}

/// Names of the secret helpers exposed to templates
pub mod functions {
    pub const PRIVATE_KEY: &str = "privateKey";
    pub const CERT: &str = "cert";
    pub const ISSUERS: &str = "issuers";
    pub const FULL_CHAIN: &str = "fullChain";
}

/// Environment variables read by the agent
pub mod env {
    pub const CONFIG_PATH: &str = "AGENT_CONFIG";
    pub const SECRETS_DIR: &str = "AGENT_SECRETS_DIR";
    pub const DEBOUNCE_MS: &str = "AGENT_DEBOUNCE_MS";
    pub const DRAIN_TIMEOUT_SECS: &str = "AGENT_DRAIN_TIMEOUT_SECS";
}

/// Defaults applied when the environment or config file leave a value unset
pub mod defaults {
    pub const SECRETS_DIR: &str = "./secrets";
    pub const DEBOUNCE_MS: u64 = 250;
    pub const DRAIN_TIMEOUT_SECS: u64 = 10;
    pub const FREQUENCY: &str = "60s";
    pub const FILE_MODE: u32 = 0o600;
}
