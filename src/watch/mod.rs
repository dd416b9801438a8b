// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Config file watching.

pub mod config_watcher;
pub mod events;

pub use config_watcher::ConfigWatcher;
pub use events::{classify, WatchEvent};
