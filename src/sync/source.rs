// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Where workers get their secrets from.

use crate::error::{AgentError, Result};
use crate::types::{ContentType, ResourceMap, Secret};
use base64::Engine;
use futures::future::{BoxFuture, FutureExt};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Resolves secret names into a snapshot for one render.
///
/// Names the source does not know are left out of the map; the renderer
/// reports them if a template asks for them.
pub trait SecretSource: Send + Sync + 'static {
    fn fetch<'a>(&'a self, names: &'a [String]) -> BoxFuture<'a, Result<ResourceMap>>;
}

/// Reads secrets from files in a local directory.
///
/// `<name>.pem` is served as PEM text, `<name>.pfx` or `<name>.p12` as a
/// base64 encoded PKCS#12 archive.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn load(&self, name: &str) -> Result<Option<Secret>> {
        validate_name(name)?;

        if let Some(text) = read_optional(&self.root.join(format!("{name}.pem"))).await? {
            let text = String::from_utf8(text).map_err(|e| {
                AgentError::Io(std::io::Error::new(ErrorKind::InvalidData, e))
            })?;
            return Ok(Some(Secret::new(text, ContentType::Pem)));
        }

        for extension in ["pfx", "p12"] {
            let path = self.root.join(format!("{name}.{extension}"));
            if let Some(bytes) = read_optional(&path).await? {
                let value = base64::engine::general_purpose::STANDARD.encode(bytes);
                return Ok(Some(Secret::new(value, ContentType::Pkcs12)));
            }
        }

        Ok(None)
    }
}

impl SecretSource for DirectorySource {
    fn fetch<'a>(&'a self, names: &'a [String]) -> BoxFuture<'a, Result<ResourceMap>> {
        async move {
            let mut resources = ResourceMap::new();
            for name in names {
                match self.load(name).await? {
                    Some(secret) => resources = resources.with_secret(name.clone(), secret),
                    None => debug!("Secret {} not found", name),
                }
            }
            Ok(resources)
        }
        .boxed()
    }
}

/// Secret names map to single file names inside the root
fn validate_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(AgentError::InvalidConfig(format!(
            "secret name {name:?} is not a plain file name"
        ))),
    }
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
