// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Per-sink loop: fetch secrets, render the template, write the output.

use crate::error::{AgentError, Result};
use crate::render::{render_file, render_inline};
use crate::sync::source::SecretSource;
use crate::sync::supervisor::Worker;
use crate::types::{SinkConfig, TemplateSource};
use futures::future::{BoxFuture, FutureExt};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Result of one synchronization pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Written,
    Unchanged,
}

/// Worker that renders a sink's template from a [`SecretSource`] on a fixed interval
#[derive(Clone)]
pub struct RenderWorker {
    source: Arc<dyn SecretSource>,
}

impl RenderWorker {
    pub fn new(source: Arc<dyn SecretSource>) -> Self {
        Self { source }
    }
}

impl Worker for RenderWorker {
    fn run(
        &self,
        sink: SinkConfig,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<()>> {
        let source = Arc::clone(&self.source);
        async move { run_sink(source.as_ref(), &sink, &cancel).await }.boxed()
    }
}

async fn run_sink(
    source: &dyn SecretSource,
    sink: &SinkConfig,
    cancel: &CancellationToken,
) -> Result<()> {
    let interval = sink.refresh_interval()?;
    info!("Worker started, refreshing every {:?}", interval);

    while !cancel.is_cancelled() {
        match sync_once(source, sink).await {
            Ok(SyncOutcome::Written) => info!("Wrote {}", sink.path.display()),
            Ok(SyncOutcome::Unchanged) => debug!("{} is up to date", sink.path.display()),
            Err(AgentError::Render(e)) if !e.is_call_scoped() => {
                error!("Template for sink {} is broken: {}", sink.name, e);
                return Err(e.into());
            }
            Err(e) => warn!("Sync failed, retrying in {:?}: {}", interval, e),
        }

        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(interval) => {}
        }
    }

    info!("Worker stopped");
    Ok(())
}

/// Fetch, render and write a sink once
#[instrument(skip(source, sink), fields(sink = %sink.name))]
pub async fn sync_once(source: &dyn SecretSource, sink: &SinkConfig) -> Result<SyncOutcome> {
    let resources = source.fetch(&sink.secrets).await?;

    let rendered = match sink.template_source() {
        Some(TemplateSource::Inline(body)) => render_inline(body, &resources)?,
        Some(TemplateSource::File(path)) => render_file(path, &resources).await?,
        None => {
            return Err(AgentError::InvalidConfig(format!(
                "sink {} has no template",
                sink.name
            )))
        }
    };

    write_if_changed(&sink.path, &rendered, sink.file_mode()?).await
}

/// Replace `path` with `contents` unless it already holds exactly `contents`
/// with the requested permissions.
async fn write_if_changed(path: &Path, contents: &str, mode: u32) -> Result<SyncOutcome> {
    if let Ok(existing) = tokio::fs::read(path).await {
        if existing == contents.as_bytes() && has_mode(path, mode).await {
            return Ok(SyncOutcome::Unchanged);
        }
    }

    let target = path.to_path_buf();
    let contents = contents.to_owned();
    tokio::task::spawn_blocking(move || replace_file(&target, contents.as_bytes(), mode))
        .await
        .map_err(|e| AgentError::Io(io::Error::new(io::ErrorKind::Other, e)))??;

    Ok(SyncOutcome::Written)
}

/// Write into a uniquely named temporary file next to `path`, then rename it
/// over `path`. Concurrent writers never share a staging file.
fn replace_file(path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let prefix = format!(
        ".{}.",
        path.file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default()
    );
    let mut staging = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)?;
    staging.write_all(contents)?;
    set_mode(staging.as_file(), mode)?;
    staging.as_file().sync_all()?;
    staging.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(unix)]
fn set_mode(file: &std::fs::File, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_file: &std::fs::File, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
async fn has_mode(path: &Path, mode: u32) -> bool {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.permissions().mode() & 0o777 == mode)
        .unwrap_or(false)
}

#[cfg(not(unix))]
async fn has_mode(_path: &Path, _mode: u32) -> bool {
    true
}
