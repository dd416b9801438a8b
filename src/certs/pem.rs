// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! PEM block decoding and normalized encoding.

use super::{Bundle, KeyBlock};
use crate::error::SecretError;
use base64::Engine;
use x509_parser::pem::Pem;

pub(crate) const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Encode DER bytes as a PEM block wrapped at 64 columns
pub(crate) fn encode(label: &str, der: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(der);
    format!(
        "-----BEGIN {label}-----\n{}\n-----END {label}-----\n",
        b64.as_bytes()
            .chunks(64)
            .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
            .collect::<Vec<_>>()
            .join("\n")
    )
}

/// Split PEM text into its private key and its certificates, in file order.
/// Blocks with other labels are skipped.
pub(crate) fn decode(name: &str, text: &str) -> Result<Bundle, SecretError> {
    let mut private_key = None;
    let mut certificates = Vec::new();
    let mut blocks = 0usize;

    for block in Pem::iter_from_buffer(text.as_bytes()) {
        let block = block.map_err(|e| SecretError::Decode {
            name: name.to_string(),
            reason: format!("invalid PEM: {e}"),
        })?;
        blocks += 1;

        if block.label == CERTIFICATE_LABEL {
            certificates.push(block.contents);
        } else if block.label.ends_with("PRIVATE KEY") && private_key.is_none() {
            private_key = Some(KeyBlock {
                label: block.label,
                der: block.contents,
            });
        }
    }

    if blocks == 0 {
        return Err(SecretError::Decode {
            name: name.to_string(),
            reason: "no PEM blocks found".to_string(),
        });
    }

    Ok(Bundle {
        private_key,
        certificates,
    })
}
