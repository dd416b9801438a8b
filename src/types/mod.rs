// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Data model shared by the supervisor, workers and renderer.

pub mod secret;
pub mod sink;

pub use secret::{ContentType, ResourceMap, Secret};
pub use sink::{parse_config, SinkConfig, TemplateSource};
