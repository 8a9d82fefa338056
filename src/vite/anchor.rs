//! Server-block anchor detection and synthesis.
//!
//! The `server: { ... }` block is never modelled as an object. Its existence
//! is a regex match on whatever text is current, so callers re-run
//! [`find_server_block`] after every mutation instead of holding offsets.

use crate::edit::TextEdit;
use regex::{Match, Regex};
use std::ops::Range;
use std::sync::LazyLock;

static SERVER_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bserver\s*:\s*\{").expect("valid server block regex"));

/// Text inserted right after the top-level opening brace.
const SERVER_BLOCK_STUB: &str = "\n  server: {\n  },";

/// A recognized top-level wrapping style of a vite config.
#[derive(Debug)]
pub struct ConfigIdiom {
    /// Short label used in diagnostics
    pub name: &'static str,
    /// Matches up to and including the opening brace of the config object
    opener: Regex,
}

impl ConfigIdiom {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            opener: Regex::new(pattern).expect("valid config idiom regex"),
        }
    }

    /// Byte offset just past the opening brace, if this idiom is present.
    pub fn opener_end(&self, content: &str) -> Option<usize> {
        self.opener.find(content).map(|m| m.end())
    }
}

/// Top-level idioms, tried in order. Add new authoring styles here.
pub static CONFIG_IDIOMS: LazyLock<Vec<ConfigIdiom>> = LazyLock::new(|| {
    vec![
        // `export default defineConfig({` or `const config = defineConfig({`
        ConfigIdiom::new("defineConfig", r"defineConfig\s*\(\s*\{"),
        ConfigIdiom::new("export default object", r"export\s+default\s*\{"),
    ]
});

/// Outcome of [`ensure_server_block`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerBlock {
    /// A server block was already there; text unchanged
    Present,
    /// A new empty server block was inserted; carries the new text
    Created(String),
    /// No recognized top-level idiom, nothing inserted
    Unrecognized,
}

/// Locate the opening `server: {` of the first server block.
pub fn find_server_block(content: &str) -> Option<Match<'_>> {
    SERVER_BLOCK.find(content)
}

/// Byte ranges of the text sitting directly inside the object opened just
/// before `open_end`, stopping at its closing brace.
///
/// Nested objects, arrays, calls and string literals are excluded, so a
/// search within the returned ranges only sees the object's own keys.
pub fn own_property_spans(content: &str, open_end: usize) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut depth = 1usize;
    let mut start = open_end;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (offset, ch) in content[open_end..].char_indices() {
        let at = open_end + offset;

        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                quote = None;
                if depth == 1 {
                    start = at + ch.len_utf8();
                }
            }
            continue;
        }

        match ch {
            '"' | '\'' | '`' => {
                if depth == 1 {
                    spans.push(start..at);
                }
                quote = Some(ch);
            }
            '{' | '[' | '(' => {
                if depth == 1 {
                    spans.push(start..at);
                }
                depth += 1;
            }
            '}' | ']' | ')' => {
                depth -= 1;
                if depth == 0 {
                    spans.push(start..at);
                    return spans;
                }
                if depth == 1 {
                    start = at + ch.len_utf8();
                }
            }
            _ => {}
        }
    }

    // unterminated object: everything up to the end
    if quote.is_none() && depth == 1 {
        spans.push(start..content.len());
    }
    spans
}

/// First idiom present in `content`, with the offset past its opening brace.
pub fn detect_idiom(content: &str) -> Option<(&'static ConfigIdiom, usize)> {
    CONFIG_IDIOMS
        .iter()
        .find_map(|idiom| idiom.opener_end(content).map(|end| (idiom, end)))
}

/// Make sure a `server: {}` block exists, inserting one as the first
/// property of the top-level config object when it does not.
pub fn ensure_server_block(content: &str) -> ServerBlock {
    if find_server_block(content).is_some() {
        return ServerBlock::Present;
    }

    let Some((idiom, at)) = detect_idiom(content) else {
        return ServerBlock::Unrecognized;
    };

    match TextEdit::insert(at, SERVER_BLOCK_STUB).apply(content) {
        Ok(updated) => {
            tracing::debug!(idiom = idiom.name, "synthesized server block");
            ServerBlock::Created(updated)
        }
        Err(err) => {
            tracing::warn!(idiom = idiom.name, "could not insert server block: {err}");
            ServerBlock::Unrecognized
        }
    }
}
