// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Template rendering against a snapshot of vault secrets.
//!
//! Templates use Jinja syntax, with Go template calls such as
//! `{{privateKey "tls"}}` accepted as well. Besides the generic helpers they
//! can call `privateKey`, `cert`, `issuers` and `fullChain` with a secret name,
//! and read raw secrets through `secrets.<name>.value`.

mod compat;
mod helpers;

use crate::certs::Artifact;
use crate::error::{RenderError, SecretError};
use crate::types::ResourceMap;
use minijinja::{Environment, Error, ErrorKind, UndefinedBehavior};
use std::path::Path;
use std::sync::Arc;

/// Read a template file and render it
pub async fn render_file(path: &Path, resources: &ResourceMap) -> Result<String, RenderError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| RenderError::ReadTemplate {
            path: path.to_path_buf(),
            source,
        })?;
    render_inline(&contents, resources)
}

/// Parse and execute a template body. Nothing is cached between calls.
pub fn render_inline(template: &str, resources: &ResourceMap) -> Result<String, RenderError> {
    let body = compat::translate(template);
    let env = environment(resources);

    let compiled = env
        .template_from_str(&body)
        .map_err(|source| RenderError::Parse {
            template: template.to_string(),
            source,
        })?;

    compiled.render(resources).map_err(|source| match secret_error(&source) {
        Some(secret) => RenderError::Secret(secret),
        None => RenderError::Execute {
            template: template.to_string(),
            source,
        },
    })
}

fn environment<'source>(resources: &ResourceMap) -> Environment<'source> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    minijinja_contrib::add_to_environment(&mut env);
    helpers::register(&mut env);

    let resources = Arc::new(resources.clone());
    for artifact in Artifact::ALL {
        let resources = Arc::clone(&resources);
        env.add_function(artifact.function_name(), move |name: String| {
            resources
                .secret(&name)
                .ok_or_else(|| SecretError::NotFound {
                    function: artifact.function_name(),
                    name: name.clone(),
                })
                .and_then(|secret| artifact.extract(&name, secret))
                .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()).with_source(e))
        });
    }

    env
}

/// Recover the secret failure a helper attached to an execution error
fn secret_error(err: &Error) -> Option<SecretError> {
    let mut source = std::error::Error::source(err);
    while let Some(e) = source {
        if let Some(secret) = e.downcast_ref::<SecretError>() {
            return Some(secret.clone());
        }
        source = e.source();
    }
    None
}
