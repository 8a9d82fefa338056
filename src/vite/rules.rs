//! The three independent vite config rewrites.
//!
//! Each rule is a pure `&str -> Step` function: the (possibly) rewritten text
//! plus exactly one action line describing what happened.

use crate::edit::TextEdit;
use crate::vite::anchor::{ensure_server_block, find_server_block, own_property_spans, ServerBlock};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static ALLOW_ALL_TRUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"allowedHosts\s*:\s*true").expect("valid regex"));

static ALLOW_ALL_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"allowedHosts\s*:\s*["']all["']"#).expect("valid regex"));

static HOSTS_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"allowedHosts\s*:\s*\[").expect("valid regex"));

static PORT_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bport\s*:\s*").expect("valid regex"));

static NUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+").expect("valid regex"));

static DEVTOOLS_EVENT_BUS_PORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"devtools\s*\([^)]*?eventBusConfig\s*:\s*\{[^}]*?\bport\s*:\s*(?P<value>\d+)")
        .expect("valid regex")
});

static DEVTOOLS_EMPTY_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"devtools\s*\(\s*\)").expect("valid regex"));

static DEVTOOLS_OBJECT_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"devtools\s*\(\s*\{").expect("valid regex"));

const DEVTOOLS_IDENT: &str = "devtools";

/// Text after one rule ran, with the action it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub content: String,
    pub action: String,
}

impl Step {
    fn unchanged(content: &str, action: impl Into<String>) -> Self {
        Self {
            content: content.to_string(),
            action: action.into(),
        }
    }

    fn edited(content: &str, edit: TextEdit, action: impl Into<String>) -> Self {
        match edit.apply(content) {
            Ok(updated) => Self {
                content: updated,
                action: action.into(),
            },
            Err(err) => {
                tracing::warn!("rejected vite config edit: {err}");
                Self::unchanged(content, format!("edit rejected: {err}"))
            }
        }
    }
}

/// Labels for the three outcomes of injecting a property into `server: {}`.
struct Injection<'a> {
    setting: &'a str,
    into_existing: String,
    into_created: String,
}

/// Insert `property` as the first entry of the server block, creating the
/// block first when the file has none.
fn inject_server_property(content: &str, property: &str, labels: Injection<'_>) -> Step {
    let property = format!("\n    {property}");

    if let Some(block) = find_server_block(content) {
        return Step::edited(
            content,
            TextEdit::insert(block.end(), property),
            labels.into_existing,
        );
    }

    let created = match ensure_server_block(content) {
        ServerBlock::Created(text) => text,
        ServerBlock::Present | ServerBlock::Unrecognized => {
            return Step::unchanged(
                content,
                format!("{}: unrecognized config format", labels.setting),
            );
        }
    };

    // Offsets from before synthesis are stale; match again on the new text
    match find_server_block(&created) {
        Some(block) => Step::edited(
            &created,
            TextEdit::insert(block.end(), property),
            labels.into_created,
        ),
        None => Step::unchanged(
            content,
            format!("{}: unrecognized config format", labels.setting),
        ),
    }
}

/// The value of the server block's own `port` key.
enum PortValue {
    Numeric(Range<usize>),
    Other,
}

/// Look for `port:` directly inside the server block, never in a nested
/// object such as `hmr: { port }` or `proxy: { ... }`.
fn server_port_value(content: &str) -> Option<PortValue> {
    let block = find_server_block(content)?;
    own_property_spans(content, block.end())
        .into_iter()
        .find_map(|span| {
            PORT_KEY
                .find(&content[span.clone()])
                .map(|key| span.start + key.end())
        })
        .map(|value_start| match NUMERIC.find(&content[value_start..]) {
            Some(digits) => PortValue::Numeric(value_start..value_start + digits.end()),
            None => PortValue::Other,
        })
}

/// Render a JS string literal.
fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Allow `.<dev_domain>` (any subdomain) through `server.allowedHosts`.
pub fn patch_allowed_hosts(content: &str, dev_domain: &str) -> Step {
    let wildcard = format!(".{dev_domain}");

    if content.contains(&wildcard) {
        return Step::unchanged(content, "allowedHosts: domain already present");
    }

    // A permissive setting always wins; never narrow it
    if ALLOW_ALL_TRUE.is_match(content) {
        return Step::unchanged(content, "allowedHosts: already allows all (true)");
    }
    if ALLOW_ALL_STRING.is_match(content) {
        return Step::unchanged(content, r#"allowedHosts: already allows all ("all")"#);
    }

    let entry = quote(&wildcard);

    if let Some(list) = HOSTS_LIST.find(content) {
        let separator = if content[list.end()..].trim_start().starts_with(']') {
            ""
        } else {
            ", "
        };
        return Step::edited(
            content,
            TextEdit::insert(list.end(), format!("{entry}{separator}")),
            "allowedHosts: appended domain",
        );
    }

    inject_server_property(
        content,
        &format!("allowedHosts: [{entry}],"),
        Injection {
            setting: "allowedHosts",
            into_existing: "allowedHosts: added to server block".to_string(),
            into_created: "allowedHosts: created server block".to_string(),
        },
    )
}

/// Set `server.port`, replacing an existing numeric value in place.
pub fn patch_server_port(content: &str, port: u16) -> Step {
    match server_port_value(content) {
        Some(PortValue::Numeric(value)) => {
            if content[value.clone()].parse::<u32>().ok() == Some(u32::from(port)) {
                return Step::unchanged(content, format!("server.port: already {port}"));
            }
            return Step::edited(
                content,
                TextEdit::replace(value.start, value.end, port.to_string()),
                format!("server.port: replaced with {port}"),
            );
        }
        // `port: process.env.PORT` and friends; adding a second key would shadow it
        Some(PortValue::Other) => {
            return Step::unchanged(content, "server.port: non-numeric value left unchanged");
        }
        None => {}
    }

    inject_server_property(
        content,
        &format!("port: {port},"),
        Injection {
            setting: "server.port",
            into_existing: format!("server.port: injected {port}"),
            into_created: format!("server.port: created server block with port {port}"),
        },
    )
}

/// Give the `devtools()` plugin its own event bus port.
pub fn patch_devtools_port(content: &str, port: u16) -> Step {
    if !content.contains(DEVTOOLS_IDENT) {
        return Step::unchanged(content, "devtools: not found, skipped");
    }

    if let Some(value) = DEVTOOLS_EVENT_BUS_PORT
        .captures(content)
        .and_then(|caps| caps.name("value"))
    {
        if value.as_str().parse::<u32>().ok() == Some(u32::from(port)) {
            return Step::unchanged(
                content,
                format!("devtools: eventBusConfig.port already {port}"),
            );
        }
        return Step::edited(
            content,
            TextEdit::replace(value.start(), value.end(), port.to_string()),
            format!("devtools: updated eventBusConfig.port to {port}"),
        );
    }

    if let Some(call) = DEVTOOLS_EMPTY_CALL.find(content) {
        return Step::edited(
            content,
            TextEdit::replace(
                call.start(),
                call.end(),
                format!("devtools({{ eventBusConfig: {{ port: {port} }} }})"),
            ),
            format!("devtools: injected eventBusConfig.port {port}"),
        );
    }

    if let Some(call) = DEVTOOLS_OBJECT_CALL.find(content) {
        return Step::edited(
            content,
            TextEdit::insert(call.end(), format!(" eventBusConfig: {{ port: {port} }},")),
            format!("devtools: added eventBusConfig.port {port}"),
        );
    }

    Step::unchanged(content, "devtools: unrecognized call pattern")
}
