// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::content_types;
use crate::error::SecretError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Encoding of a secret value, which decides the decoder used for it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// PEM text holding a private key and certificates
    Pem,
    /// Base64 encoded PKCS#12 archive with an empty password
    Pkcs12,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Pem => content_types::PEM,
            ContentType::Pkcs12 => content_types::PKCS12,
        }
    }

    /// Convert the content type string delivered by the vault
    pub fn parse(secret_name: &str, raw: &str) -> Result<Self, SecretError> {
        match raw {
            content_types::PEM => Ok(ContentType::Pem),
            content_types::PKCS12 => Ok(ContentType::Pkcs12),
            other => Err(SecretError::UnexpectedContentType {
                name: secret_name.to_string(),
                content_type: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A secret as delivered by the vault. Either field may be absent.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    pub value: Option<String>,
    pub content_type: Option<String>,
}

impl Secret {
    pub fn new(value: impl Into<String>, content_type: ContentType) -> Self {
        Secret {
            value: Some(value.into()),
            content_type: Some(content_type.as_str().to_string()),
        }
    }

    /// The encoded payload; absent or empty is an error naming the secret
    pub fn value(&self, name: &str) -> Result<&str, SecretError> {
        self.value
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SecretError::MissingField {
                name: name.to_string(),
                field: "value",
            })
    }

    /// The declared content type, converted to the closed set the decoders support
    pub fn content_type(&self, name: &str) -> Result<ContentType, SecretError> {
        let raw = self
            .content_type
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| SecretError::MissingField {
                name: name.to_string(),
                field: "content type",
            })?;
        ContentType::parse(name, raw)
    }
}

// Values are never printed.
impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("value", &self.value.as_ref().map(|_| "<redacted>"))
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Snapshot of the secrets available to one render call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceMap {
    pub secrets: BTreeMap<String, Secret>,
}

impl ResourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: impl Into<String>, secret: Secret) -> Self {
        self.secrets.insert(name.into(), secret);
        self
    }

    pub fn secret(&self, name: &str) -> Option<&Secret> {
        self.secrets.get(name)
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}
