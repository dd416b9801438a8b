// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Restarts the worker generation whenever the sink configuration changes.

use crate::constants::defaults;
use crate::error::{AgentError, Result};
use crate::sync::{Generation, Supervisor};
use crate::watch::events::{classify, WatchEvent};
use notify::{Event, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

type EventReceiver = UnboundedReceiver<notify::Result<Event>>;

/// Watches the sink configuration and owns the running generation
pub struct ConfigWatcher {
    path: PathBuf,
    supervisor: Supervisor,
    debounce: Duration,
    drain_timeout: Duration,
}

impl ConfigWatcher {
    pub fn new(path: impl Into<PathBuf>, supervisor: Supervisor) -> Self {
        Self {
            path: path.into(),
            supervisor,
            debounce: Duration::from_millis(defaults::DEBOUNCE_MS),
            drain_timeout: Duration::from_secs(defaults::DRAIN_TIMEOUT_SECS),
        }
    }

    /// Window during which further events are folded into one restart.
    /// Zero restarts on every event.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    /// Start the workers and keep them in line with the config file.
    ///
    /// Only returns on a fatal error or when the watch backend goes away.
    pub async fn run(&self) -> Result<()> {
        let config = std::fs::canonicalize(&self.path).map_err(|source| AgentError::ReadConfig {
            path: self.path.clone(),
            source,
        })?;
        let dir = config.parent().ok_or_else(|| {
            AgentError::InvalidConfig(format!("{} has no parent directory", config.display()))
        })?;

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.send(res);
        })?;
        // The parent is watched so editors that replace the file stay visible
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        info!("Watching {} for changes", config.display());

        let result = self.drive(&config, rx).await;
        drop(watcher);
        result
    }

    pub(crate) async fn drive(&self, config: &Path, mut rx: EventReceiver) -> Result<()> {
        let mut generation = self.supervisor.start_generation(config).await?;

        loop {
            tokio::select! {
                received = rx.recv() => {
                    let Some(event) = received else {
                        info!("Watch channel closed, stopping");
                        generation.shutdown(self.drain_timeout).await;
                        return Ok(());
                    };

                    match classify(config, event) {
                        WatchEvent::Write => {
                            self.coalesce(config, &mut rx).await;
                            info!("Config {} changed, restarting workers", config.display());
                            generation.shutdown(self.drain_timeout).await;
                            generation = self.supervisor.start_generation(config).await?;
                        }
                        WatchEvent::Ignored(kind) => debug!("Ignoring {:?} on config", kind),
                        WatchEvent::Unrelated => {}
                        WatchEvent::Error(e) => error!("Watch error: {}", e),
                    }
                }
                exit = generation.next_exit(), if !generation.is_idle() => {
                    if let Err(e) = handle_exit(&generation, exit) {
                        generation.shutdown(self.drain_timeout).await;
                        return Err(e);
                    }
                }
            }
        }
    }

    /// Swallow events until the debounce window that started with the first
    /// write has passed
    async fn coalesce(&self, config: &Path, rx: &mut EventReceiver) {
        if self.debounce.is_zero() {
            return;
        }

        let deadline = Instant::now() + self.debounce;
        let mut folded = 0usize;
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => break,
                received = rx.recv() => match received {
                    Some(event) => match classify(config, event) {
                        WatchEvent::Error(e) => warn!("Watch error while debouncing: {}", e),
                        _ => folded += 1,
                    },
                    None => break,
                },
            }
        }

        if folded > 0 {
            debug!("Folded {} further events into one restart", folded);
        }
    }
}

fn handle_exit(
    generation: &Generation,
    exit: Option<std::result::Result<Result<()>, tokio::task::JoinError>>,
) -> Result<()> {
    match exit {
        Some(Ok(Ok(()))) => {
            debug!("A worker of generation {} exited", generation.id());
            Ok(())
        }
        Some(Ok(Err(e))) => {
            error!("Worker of generation {} failed: {}", generation.id(), e);
            Err(e)
        }
        Some(Err(e)) => {
            error!("Worker task of generation {} panicked: {}", generation.id(), e);
            Ok(())
        }
        None => Ok(()),
    }
}
