use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::segment::tags::TAG_CHARS;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)#([^\s#][^\n]*)").expect("heading pattern is valid"));

static TAG_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^[{TAG_CHARS}]+$")).expect("tag pattern is valid"));

/// Prepare a text run for the markup parser.
///
/// `#Title` becomes the heading `# Title` unless everything after the `#` on
/// that line is tag characters. With `hard_line_breaks`, every newline
/// becomes a Markdown hard break so single newlines stay visible.
pub fn normalize(text: &str, hard_line_breaks: bool) -> String {
    let text = HEADING_RE.replace_all(text, |caps: &Captures| {
        let rest = &caps[2];
        if TAG_ONLY_RE.is_match(rest) {
            caps[0].to_string()
        } else {
            format!("{}# {}", &caps[1], rest)
        }
    });

    if hard_line_breaks {
        text.replace('\n', "  \n")
    } else {
        text.into_owned()
    }
}
