// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use keyvault_agent::config::Config;
use keyvault_agent::sync::{DirectorySource, RenderWorker, Supervisor};
use keyvault_agent::watch::ConfigWatcher;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting keyvault agent");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: config={}, secrets_dir={}",
        config.config_path.display(),
        config.secrets_dir.display()
    );

    let source = Arc::new(DirectorySource::new(config.secrets_dir.clone()));
    let supervisor = Supervisor::new(Arc::new(RenderWorker::new(source)));
    let watcher = ConfigWatcher::new(config.config_path.clone(), supervisor)
        .with_debounce(config.debounce)
        .with_drain_timeout(config.drain_timeout);

    // Dropping the watcher future cancels the running generation
    tokio::select! {
        result = watcher.run() => result?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Received Ctrl-C, shutting down");
        }
    }

    Ok(())
}
