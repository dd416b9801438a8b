// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Generic string helpers registered next to minijinja's builtins.

use base64::Engine;
use minijinja::{Environment, Error, ErrorKind};

pub(crate) fn register(env: &mut Environment<'_>) {
    env.add_filter("b64enc", b64enc);
    env.add_filter("b64dec", b64dec);
    env.add_filter("trimPrefix", trim_prefix);
    env.add_filter("trimSuffix", trim_suffix);
    env.add_filter("quote", quote);
    env.add_filter("nindent", nindent);
}

fn b64enc(value: String) -> String {
    base64::engine::general_purpose::STANDARD.encode(value)
}

fn b64dec(value: String) -> Result<String, Error> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(value.trim())
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, format!("b64dec: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, format!("b64dec: {e}")))
}

fn trim_prefix(value: String, prefix: String) -> String {
    value
        .strip_prefix(prefix.as_str())
        .map(str::to_string)
        .unwrap_or(value)
}

fn trim_suffix(value: String, suffix: String) -> String {
    value
        .strip_suffix(suffix.as_str())
        .map(str::to_string)
        .unwrap_or(value)
}

fn quote(value: String) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Newline, then the value with every line indented by `width` spaces
fn nindent(value: String, width: usize) -> String {
    let pad = " ".repeat(width);
    format!("\n{pad}{}", value.replace('\n', &format!("\n{pad}")))
}
