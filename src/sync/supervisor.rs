// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Starts one worker per configured sink and stops them as a unit.

use crate::error::Result;
use crate::types::{parse_config, SinkConfig};
use futures::future::BoxFuture;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};

/// The per-sink loop run by a generation
pub trait Worker: Send + Sync + 'static {
    /// Keep `sink` synchronized until `cancel` fires. An `Err` means the sink
    /// cannot make progress and the agent should stop.
    fn run(
        &self,
        sink: SinkConfig,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<()>>;
}

/// Parses the sink configuration and starts worker generations.
pub struct Supervisor {
    worker: Arc<dyn Worker>,
    last_generation: AtomicU64,
}

impl Supervisor {
    pub fn new(worker: Arc<dyn Worker>) -> Self {
        Self {
            worker,
            last_generation: AtomicU64::new(0),
        }
    }

    /// Parse the config at `path` and start one worker per sink, all sharing
    /// one cancellation token. Nothing is started if parsing fails.
    #[instrument(skip(self))]
    pub async fn start_generation(&self, path: &Path) -> Result<Generation> {
        let sinks = parse_config(path).await?;
        let id = self.last_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();

        for sink in &sinks {
            let span = info_span!("sink", sink = %sink.name, generation = id);
            tasks.spawn(
                self.worker
                    .run(sink.clone(), cancel.child_token())
                    .instrument(span),
            );
        }

        info!("Started generation {} with {} sinks", id, sinks.len());

        Ok(Generation {
            id,
            sinks: sinks.into_iter().map(|s| s.name).collect(),
            cancel,
            tasks,
        })
    }
}

/// The workers started from one parse of the configuration.
///
/// Dropping a generation cancels it without waiting for its workers.
pub struct Generation {
    id: u64,
    sinks: Vec<String>,
    cancel: CancellationToken,
    tasks: JoinSet<Result<()>>,
}

impl Generation {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Names of the sinks this generation was started with, in config order
    pub fn sinks(&self) -> &[String] {
        &self.sinks
    }

    /// Signal all workers to stop. Returns immediately.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True when every worker has exited
    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for the next worker to exit; `None` when none are left
    pub async fn next_exit(&mut self) -> Option<std::result::Result<Result<()>, JoinError>> {
        self.tasks.join_next().await
    }

    /// Cancel and wait up to `drain_timeout` for the workers to exit. Workers
    /// still running afterwards are detached, not aborted.
    pub async fn shutdown(mut self, drain_timeout: Duration) {
        info!("Stopping generation {}", self.id);
        self.cancel();

        let drained = tokio::time::timeout(drain_timeout, drain(&mut self.tasks)).await;
        if drained.is_err() {
            warn!(
                "Generation {} still has {} running workers after {:?}, detaching them",
                self.id,
                self.tasks.len(),
                drain_timeout
            );
            self.tasks.detach_all();
        } else {
            debug!("Generation {} stopped", self.id);
        }
    }
}

async fn drain(tasks: &mut JoinSet<Result<()>>) {
    while let Some(exit) = tasks.join_next().await {
        match exit {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Worker exited with error during shutdown: {}", e),
            Err(e) => error!("Worker task failed: {}", e),
        }
    }
}

impl Drop for Generation {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.tasks.detach_all();
    }
}

impl std::fmt::Debug for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generation")
            .field("id", &self.id)
            .field("sinks", &self.sinks)
            .field("running", &self.tasks.len())
            .finish()
    }
}
