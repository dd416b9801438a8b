// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Worker generations and the per-sink synchronization loop.

pub mod source;
pub mod supervisor;
pub mod worker;

pub use source::{DirectorySource, SecretSource};
pub use supervisor::{Generation, Supervisor, Worker};
pub use worker::{sync_once, RenderWorker, SyncOutcome};
