// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Extraction of keys and certificates from vault secrets.
//!
//! A secret is decoded according to its content type into a [`Bundle`], and
//! one of four artifacts is taken from it as normalized PEM text.

mod pem;
mod pkcs12;

use crate::constants::functions;
use crate::error::SecretError;
use crate::types::{ContentType, Secret};

/// Private key block with the label it was stored under
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyBlock {
    pub label: String,
    pub der: Vec<u8>,
}

/// Decoded secret material; certificates are leaf first
#[derive(Debug, Clone, Default)]
pub(crate) struct Bundle {
    pub private_key: Option<KeyBlock>,
    pub certificates: Vec<Vec<u8>>,
}

/// The four artifacts a secret can be rendered as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    PrivateKey,
    LeafCertificate,
    IssuerChain,
    FullChain,
}

impl Artifact {
    pub const ALL: [Artifact; 4] = [
        Artifact::PrivateKey,
        Artifact::LeafCertificate,
        Artifact::IssuerChain,
        Artifact::FullChain,
    ];

    /// Name of the template function producing this artifact
    pub fn function_name(&self) -> &'static str {
        match self {
            Artifact::PrivateKey => functions::PRIVATE_KEY,
            Artifact::LeafCertificate => functions::CERT,
            Artifact::IssuerChain => functions::ISSUERS,
            Artifact::FullChain => functions::FULL_CHAIN,
        }
    }

    pub fn extract(&self, name: &str, secret: &Secret) -> Result<String, SecretError> {
        let bundle = decode(name, secret)?;
        let no_certificate = || SecretError::NoCertificate {
            name: name.to_string(),
        };

        match self {
            Artifact::PrivateKey => bundle
                .private_key
                .map(|key| pem::encode(&key.label, &key.der))
                .ok_or_else(|| SecretError::NoPrivateKey {
                    name: name.to_string(),
                }),
            Artifact::LeafCertificate => bundle
                .certificates
                .first()
                .map(|der| pem::encode(pem::CERTIFICATE_LABEL, der))
                .ok_or_else(no_certificate),
            Artifact::IssuerChain => match bundle.certificates.split_first() {
                Some((_, issuers)) => Ok(encode_certificates(issuers)),
                None => Err(no_certificate()),
            },
            Artifact::FullChain if bundle.certificates.is_empty() => Err(no_certificate()),
            Artifact::FullChain => Ok(encode_certificates(&bundle.certificates)),
        }
    }
}

fn decode(name: &str, secret: &Secret) -> Result<Bundle, SecretError> {
    let content_type = secret.content_type(name)?;
    let value = secret.value(name)?;

    match content_type {
        ContentType::Pem => pem::decode(name, value),
        ContentType::Pkcs12 => pkcs12::decode(name, value),
    }
}

fn encode_certificates(certificates: &[Vec<u8>]) -> String {
    certificates
        .iter()
        .map(|der| pem::encode(pem::CERTIFICATE_LABEL, der))
        .collect()
}

/// PEM private key held by the secret
pub fn extract_private_key(name: &str, secret: &Secret) -> Result<String, SecretError> {
    Artifact::PrivateKey.extract(name, secret)
}

/// PEM end-entity certificate held by the secret
pub fn extract_leaf_certificate(name: &str, secret: &Secret) -> Result<String, SecretError> {
    Artifact::LeafCertificate.extract(name, secret)
}

/// PEM issuer certificates, leaf excluded; empty for a lone certificate
pub fn extract_issuer_chain(name: &str, secret: &Secret) -> Result<String, SecretError> {
    Artifact::IssuerChain.extract(name, secret)
}

/// PEM leaf certificate followed by its issuers
pub fn extract_full_chain(name: &str, secret: &Secret) -> Result<String, SecretError> {
    Artifact::FullChain.extract(name, secret)
}
