// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Go template call syntax on top of Jinja.
//!
//! Inside `{{ ... }}` the following are rewritten before parsing:
//!
//! - `privateKey "tls"` becomes `privateKey("tls")`, likewise for `cert`,
//!   `issuers` and `fullChain`
//! - `| nindent 4` becomes `| nindent(4)` for the helpers listed in `HELPERS`
//! - `nindent 4 "x"` becomes `("x" | nindent(4))`; the last argument is the value
//! - `.secrets.tls.value` becomes `secrets.tls.value`
//!
//! Text outside actions, string literals and Jinja call syntax are left alone.

use crate::constants::functions;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;

/// Helpers that take their value as the last argument when called Go style
const HELPERS: &[&str] = &[
    "b64enc",
    "b64dec",
    "quote",
    "nindent",
    "indent",
    "trimPrefix",
    "trimSuffix",
    "replace",
    "default",
    "join",
    "upper",
    "lower",
    "trim",
];

const SECRET_FUNCTIONS: &[&str] = &[
    functions::PRIVATE_KEY,
    functions::CERT,
    functions::ISSUERS,
    functions::FULL_CHAIN,
];

const STRING: &str = r#""(?:[^"\\]|\\.)*""#;
const FIELD: &str = r"\.[A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*";

static ACTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{\{(.*?)\}\}").unwrap_or_else(|_| unreachable!()));

static ARGUMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"{STRING}|-?\d+|{FIELD}")).unwrap_or_else(|_| unreachable!())
});

static TOKEN: Lazy<Regex> = Lazy::new(|| {
    let argument = format!(r"(?:\s+(?:{STRING}|-?\d+|{FIELD}))");
    let helpers = HELPERS.join("|");
    let callables = [SECRET_FUNCTIONS, HELPERS].concat().join("|");
    Regex::new(&format!(
        r#"{STRING}|'(?:[^'\\]|\\.)*'|(?P<pipe>\|\s*(?:{helpers}){argument}+)|(?P<call>\b(?:{callables}){argument}+)|(?P<lead>^|[\s(,-])\.(?P<field>[A-Za-z_]\w*)"#
    ))
    .unwrap_or_else(|_| unreachable!())
});

/// Rewrite Go style calls in `template` into their Jinja form
pub(crate) fn translate(template: &str) -> Cow<'_, str> {
    ACTION.replace_all(template, |caps: &Captures| {
        format!("{{{{{}}}}}", TOKEN.replace_all(&caps[1], rewrite_token))
    })
}

fn rewrite_token(caps: &Captures) -> String {
    if let Some(pipe) = caps.name("pipe") {
        let (name, args) = split_call(pipe.as_str().trim_start_matches('|').trim_start());
        return format!("| {}({})", name, args.join(", "));
    }

    if let Some(call) = caps.name("call") {
        let (name, mut args) = split_call(call.as_str());
        if SECRET_FUNCTIONS.contains(&name) {
            return format!("{}({})", name, args.join(", "));
        }
        return match args.pop() {
            Some(value) if args.is_empty() => format!("({value} | {name})"),
            Some(value) => format!("({} | {}({}))", value, name, args.join(", ")),
            None => caps[0].to_string(),
        };
    }

    if let (Some(lead), Some(field)) = (caps.name("lead"), caps.name("field")) {
        return format!("{}{}", lead.as_str(), field.as_str());
    }

    caps[0].to_string()
}

/// Split `name arg arg` into the name and its arguments in Jinja form
fn split_call(text: &str) -> (&str, Vec<String>) {
    let (name, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
    let args = ARGUMENT
        .find_iter(rest)
        .map(|arg| arg.as_str().trim_start_matches('.').to_string())
        .collect();
    (name, args)
}
