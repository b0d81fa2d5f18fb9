use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::{RawMarkup, Segment};

/// A ```` ```__html ```` fence: opener, optional whitespace, a newline, then
/// everything up to the first closing ```` ``` ````.
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```__html\s*\n((?s:.*?))```").expect("fence pattern is valid"));

/// Byte ranges of every complete raw-markup fence in `text`.
pub(crate) fn fences(text: &str) -> impl Iterator<Item = Range<usize>> + '_ {
    FENCE_RE.find_iter(text).map(|m| m.range())
}

/// Extract raw-markup fences from a literal text run.
///
/// Fence content is trimmed and never looked at again. An unterminated fence
/// stays literal text.
pub fn split_raw_markup(text: &str) -> Vec<Segment> {
    let mut result = Vec::new();
    let mut last = 0;

    for caps in FENCE_RE.captures_iter(text) {
        let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            result.push(Segment::text(&text[last..whole.start()]));
        }
        result.push(Segment::RawMarkup(RawMarkup {
            value: body.as_str().trim().to_string(),
            source: whole.as_str().to_string(),
        }));
        last = whole.end();
    }
    if last < text.len() {
        result.push(Segment::text(&text[last..]));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw(value: &str, source: &str) -> Segment {
        Segment::RawMarkup(RawMarkup {
            value: value.to_string(),
            source: source.to_string(),
        })
    }

    #[test]
    fn extracts_fence_between_text() {
        let input = "before\n```__html\n  <div>hi</div>\n```\nafter";
        assert_eq!(
            split_raw_markup(input),
            vec![
                Segment::text("before\n"),
                raw("<div>hi</div>", "```__html\n  <div>hi</div>\n```"),
                Segment::text("\nafter"),
            ]
        );
    }

    #[test]
    fn first_closing_fence_wins() {
        let input = "```__html\na\n```b```";
        assert_eq!(
            split_raw_markup(input),
            vec![raw("a", "```__html\na\n```"), Segment::text("b```")]
        );
    }

    #[test]
    fn opener_may_have_trailing_spaces() {
        let input = "```__html   \n<p>x</p>```";
        assert_eq!(
            split_raw_markup(input),
            vec![raw("<p>x</p>", input)]
        );
    }

    #[test]
    fn content_is_opaque() {
        let body = "#tag {% spoiler hidden %} :smileys_grin:";
        let input = format!("```__html\n{body}\n```");
        assert_eq!(split_raw_markup(&input), vec![raw(body, &input)]);
    }

    #[test]
    fn unterminated_fence_is_text() {
        let input = "```__html\n<b>never closed";
        assert_eq!(split_raw_markup(input), vec![Segment::text(input)]);
    }

    #[test]
    fn opener_without_newline_is_text() {
        let input = "```__html <b>x</b>```";
        assert_eq!(split_raw_markup(input), vec![Segment::text(input)]);
    }

    #[test]
    fn ordinary_code_fence_is_text() {
        let input = "```rust\nfn main() {}\n```";
        assert_eq!(split_raw_markup(input), vec![Segment::text(input)]);
    }
}
