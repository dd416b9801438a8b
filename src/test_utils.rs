// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test fixtures: generated certificate chains and a recording worker.

use crate::error::AgentError;
use crate::sync::Worker;
use crate::types::SinkConfig;
use base64::Engine;
use futures::future::{BoxFuture, FutureExt};
use rcgen::{BasicConstraints, Certificate, CertificateParams, DnType, IsCa, KeyPair};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

fn encode_pem(label: &str, der: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(der);
    let body: Vec<&str> = b64
        .as_bytes()
        .chunks(64)
        .map(|chunk| std::str::from_utf8(chunk).unwrap())
        .collect();
    format!("-----BEGIN {label}-----\n{}\n-----END {label}-----\n", body.join("\n"))
}

fn params(common_name: &str, is_ca: bool) -> CertificateParams {
    let mut params = CertificateParams::default();
    params.distinguished_name.push(DnType::CommonName, common_name);
    if is_ca {
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    }
    params
}

/// A root -> intermediate -> leaf chain with the leaf's PKCS#8 key
pub struct TestChain {
    pub key_der: Vec<u8>,
    pub key_pem: String,
    pub leaf_der: Vec<u8>,
    pub intermediate_der: Vec<u8>,
    pub root_der: Vec<u8>,
}

impl TestChain {
    pub fn generate() -> Self {
        let root_key = KeyPair::generate().unwrap();
        let root: Certificate = params("Test Root CA", true).self_signed(&root_key).unwrap();

        let intermediate_key = KeyPair::generate().unwrap();
        let intermediate = params("Test Intermediate CA", true)
            .signed_by(&intermediate_key, &root, &root_key)
            .unwrap();

        let leaf_key = KeyPair::generate().unwrap();
        let leaf = params("tls.example.com", false)
            .signed_by(&leaf_key, &intermediate, &intermediate_key)
            .unwrap();

        let key_der = leaf_key.serialize_der();
        TestChain {
            key_pem: encode_pem("PRIVATE KEY", &key_der),
            key_der,
            leaf_der: leaf.der().to_vec(),
            intermediate_der: intermediate.der().to_vec(),
            root_der: root.der().to_vec(),
        }
    }

    /// Key, leaf and intermediate as one PEM document
    pub fn pem_bundle(&self) -> String {
        format!(
            "{}{}{}",
            self.key_pem,
            encode_pem("CERTIFICATE", &self.leaf_der),
            encode_pem("CERTIFICATE", &self.intermediate_der)
        )
    }

    /// Key, leaf and intermediate as a base64 PKCS#12 archive with no password
    pub fn pkcs12_base64(&self) -> String {
        let pfx = p12::PFX::new(
            &self.leaf_der,
            &self.key_der,
            Some(self.intermediate_der.as_slice()),
            "",
            "tls",
        )
        .unwrap();
        base64::engine::general_purpose::STANDARD.encode(pfx.to_der())
    }

    /// The same material as a PBES2 archive (AES-256-CBC key and certificate
    /// bags, SHA-256 MAC) with an empty password
    pub fn pkcs12_aes_base64(&self) -> String {
        use openssl::hash::MessageDigest;
        use openssl::nid::Nid;
        use openssl::pkcs12::Pkcs12;
        use openssl::pkey::PKey;
        use openssl::stack::Stack;
        use openssl::x509::X509;

        let key = PKey::private_key_from_pkcs8(&self.key_der).unwrap();
        let leaf = X509::from_der(&self.leaf_der).unwrap();
        let mut ca = Stack::new().unwrap();
        ca.push(X509::from_der(&self.intermediate_der).unwrap()).unwrap();

        let mut builder = Pkcs12::builder();
        builder
            .name("tls")
            .pkey(&key)
            .cert(&leaf)
            .ca(ca)
            .key_algorithm(Nid::AES_256_CBC)
            .cert_algorithm(Nid::AES_256_CBC)
            .mac_md(MessageDigest::sha256());
        let archive = builder.build2("").unwrap();
        base64::engine::general_purpose::STANDARD.encode(archive.to_der().unwrap())
    }
}

/// What a [`RecordingWorker`] observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    Started(String),
    Cancelled(String),
}

/// Worker that records its lifecycle and idles until cancelled
#[derive(Default, Clone)]
pub struct RecordingWorker {
    pub events: Arc<Mutex<Vec<WorkerEvent>>>,
}

impl RecordingWorker {
    pub fn events(&self) -> Vec<WorkerEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn started(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, WorkerEvent::Started(_)))
            .count()
    }

    pub fn cancelled(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, WorkerEvent::Cancelled(_)))
            .count()
    }
}

impl Worker for RecordingWorker {
    fn run(
        &self,
        sink: SinkConfig,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<(), AgentError>> {
        let events = self.events.clone();
        async move {
            events
                .lock()
                .unwrap()
                .push(WorkerEvent::Started(sink.name.clone()));
            cancel.cancelled().await;
            events
                .lock()
                .unwrap()
                .push(WorkerEvent::Cancelled(sink.name));
            Ok(())
        }
        .boxed()
    }
}

/// Write a config file with one inline-template sink per name
pub fn write_config(path: &std::path::Path, names: &[&str]) {
    let mut contents = String::from("sinks:\n");
    for name in names {
        contents.push_str(&format!(
            "  - name: {name}\n    path: /tmp/{name}.out\n    template: \"{name}\"\n"
        ));
    }
    std::fs::write(path, contents).unwrap();
}
