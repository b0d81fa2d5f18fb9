use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::{Segment, Spoiler};

// Syntax:
//   {% spoiler text %}
//   {% spoiler style:box text %}
//   {% spoiler style:box color:red text %}
//
// The keyword ends at an ASCII word boundary, so Han text may follow it
// directly. The boundary character stays part of the captured content.
static SPOILER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{%\s*spoiler((?:[^A-Za-z0-9_](?s:.*?))??)%\}")
        .expect("spoiler pattern is valid")
});

/// How a spoiler hides its content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpoilerStyle {
    Box,
    #[default]
    Blur,
}

impl SpoilerStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            SpoilerStyle::Box => "box",
            SpoilerStyle::Blur => "blur",
        }
    }

    fn from_param(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "box" => Some(SpoilerStyle::Box),
            "blur" => Some(SpoilerStyle::Blur),
            _ => None,
        }
    }
}

impl fmt::Display for SpoilerStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extract spoiler blocks from a text run.
pub fn split_spoilers(text: &str) -> Vec<Segment> {
    let mut result = Vec::new();
    let mut last = 0;

    for caps in SPOILER_RE.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let before = &text[last..whole.start()];
        if !before.is_empty() {
            result.push(Segment::text(before));
        }
        result.push(Segment::Spoiler(parse_spoiler(inner.as_str(), whole.as_str())));
        last = whole.end();
    }
    let rest = &text[last..];
    if !rest.is_empty() {
        result.push(Segment::text(rest));
    }

    result
}

/// Parse the inside of a spoiler block.
///
/// Leading `style:` and `color:` tokens are parameters, in any order. The
/// first other token starts the content. Only the prefix is checked, so a
/// content word beginning with `style:` right after the parameters is taken
/// as one.
fn parse_spoiler(inner: &str, source: &str) -> Spoiler {
    let inner = inner.trim();
    let tokens: Vec<&str> = inner.split_whitespace().collect();

    let mut style = SpoilerStyle::default();
    let mut color = None;
    let mut consumed = 0;

    for (i, token) in tokens.iter().enumerate() {
        if let Some(value) = strip_key(token, "style:") {
            // Anything after a second colon is ignored
            let value = value.split(':').next().unwrap_or_default();
            if let Some(parsed) = SpoilerStyle::from_param(value) {
                style = parsed;
            }
            consumed = i + 1;
            continue;
        }
        if let Some(value) = strip_key(token, "color:") {
            color = Some(value.to_string());
            consumed = i + 1;
            continue;
        }
        break;
    }

    // Re-joining collapses inner whitespace; with no parameters the text is kept as written
    let value = if consumed == 0 {
        inner.to_string()
    } else {
        tokens[consumed..].join(" ")
    };

    Spoiler {
        style,
        color,
        value,
        source: source.to_string(),
    }
}

/// Case-insensitive `key` prefix strip.
fn strip_key<'a>(token: &'a str, key: &str) -> Option<&'a str> {
    let head = token.get(..key.len())?;
    head.eq_ignore_ascii_case(key).then(|| &token[key.len()..])
}
