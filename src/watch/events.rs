// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Sorting raw notify events into the ones that should restart workers.

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};
use std::path::Path;

/// How the watcher treats one notification
#[derive(Debug)]
pub enum WatchEvent {
    /// The config file was written, created or renamed into place
    Write,
    /// The config file was touched in a way that does not change its contents
    Ignored(EventKind),
    /// Some other file in the watched directory
    Unrelated,
    Error(notify::Error),
}

/// Classify a notification from the config file's parent directory
pub fn classify(config: &Path, event: notify::Result<Event>) -> WatchEvent {
    let event = match event {
        Ok(event) => event,
        Err(e) => return WatchEvent::Error(e),
    };

    let concerns_config = match event.kind {
        // paths are [from, to]; only the destination matters
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => event
            .paths
            .last()
            .is_some_and(|p| same_file_name(config, p)),
        _ => event.paths.iter().any(|p| same_file_name(config, p)),
    };
    if !concerns_config {
        return WatchEvent::Unrelated;
    }

    if is_write(&event.kind) {
        WatchEvent::Write
    } else {
        WatchEvent::Ignored(event.kind)
    }
}

fn is_write(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Any
            | EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Any)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Both))
    )
}

fn same_file_name(config: &Path, candidate: &Path) -> bool {
    config.file_name().is_some() && config.file_name() == candidate.file_name()
}
