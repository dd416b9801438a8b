// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! PKCS#12 archive decoding.

use super::{Bundle, KeyBlock};
use crate::error::SecretError;
use base64::Engine;
use openssl::pkcs12::Pkcs12;
use p12::PFX;
use x509_parser::prelude::*;

const PKCS8_LABEL: &str = "PRIVATE KEY";

/// Vault exported archives carry no password.
const PASSWORD: &str = "";

/// Private key DER and certificate DERs as stored in an archive
type Contents = (Option<Vec<u8>>, Vec<Vec<u8>>);

/// Decode a base64 PKCS#12 archive into its key and its certificates, leaf first.
pub(crate) fn decode(name: &str, value: &str) -> Result<Bundle, SecretError> {
    let decode_err = |reason: String| SecretError::Decode {
        name: name.to_string(),
        reason,
    };

    let compact: String = value.split_whitespace().collect();
    let der = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| decode_err(format!("invalid base64: {e}")))?;

    // Legacy PBE first; PBES2 (AES) archives go through OpenSSL
    let (key, certificates) = match read_legacy(&der) {
        Ok(contents) if contents.0.is_some() || !contents.1.is_empty() => contents,
        legacy => read_pbes2(&der).map_err(|modern| match legacy {
            Err(legacy) => decode_err(format!("{legacy}; {modern}")),
            Ok(_) => decode_err(modern),
        })?,
    };

    Ok(Bundle {
        private_key: key.map(|der| KeyBlock {
            label: PKCS8_LABEL.to_string(),
            der,
        }),
        certificates: order_leaf_first(certificates).map_err(decode_err)?,
    })
}

fn read_legacy(der: &[u8]) -> Result<Contents, String> {
    let pfx = PFX::parse(der).map_err(|e| format!("invalid PKCS#12 archive: {e:?}"))?;
    let keys = pfx
        .key_bags(PASSWORD)
        .map_err(|e| format!("failed to read key bags: {e:?}"))?;
    let certificates = pfx
        .cert_x509_bags(PASSWORD)
        .map_err(|e| format!("failed to read certificate bags: {e:?}"))?;
    Ok((keys.into_iter().next(), certificates))
}

fn read_pbes2(der: &[u8]) -> Result<Contents, String> {
    let parsed = Pkcs12::from_der(der)
        .and_then(|archive| archive.parse2(PASSWORD))
        .map_err(|e| format!("failed to decrypt archive: {e}"))?;

    let key = parsed
        .pkey
        .map(|key| key.private_key_to_pkcs8())
        .transpose()
        .map_err(|e| format!("failed to encode private key: {e}"))?;

    let mut certificates = Vec::new();
    if let Some(cert) = parsed.cert {
        certificates.push(cert.to_der().map_err(|e| e.to_string())?);
    }
    if let Some(ca) = parsed.ca {
        for cert in ca.iter() {
            certificates.push(cert.to_der().map_err(|e| e.to_string())?);
        }
    }
    Ok((key, certificates))
}

/// Order certificates as leaf, then its issuers up the chain. Certificates
/// that are not part of the leaf's chain keep their archive order at the end.
fn order_leaf_first(certificates: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>, String> {
    let names = certificates
        .iter()
        .map(|der| {
            X509Certificate::from_der(der)
                .map(|(_, cert)| {
                    (
                        cert.subject().as_raw().to_vec(),
                        cert.issuer().as_raw().to_vec(),
                    )
                })
                .map_err(|e| format!("invalid certificate in archive: {e}"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if names.is_empty() {
        return Ok(certificates);
    }

    // The leaf issued nothing else in the archive.
    let issued_something = |i: usize| {
        names
            .iter()
            .enumerate()
            .any(|(j, (_, issuer))| j != i && *issuer == names[i].0)
    };
    let leaf = (0..names.len())
        .find(|&i| !issued_something(i))
        .unwrap_or(0);

    let mut order = vec![leaf];
    let mut current = leaf;
    while let Some(next) = (0..names.len())
        .find(|&j| !order.contains(&j) && names[j].0 == names[current].1)
    {
        order.push(next);
        current = next;
    }
    let unlinked: Vec<usize> = (0..names.len()).filter(|i| !order.contains(i)).collect();
    order.extend(unlinked);

    let mut slots: Vec<Option<Vec<u8>>> = certificates.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
}
