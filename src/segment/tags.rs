use std::sync::LazyLock;

use regex::Regex;

use super::{Segment, Tag, raw};

/// Characters allowed in a tag name: Han ideographs, ASCII letters, digits, `_` and `/`.
pub(crate) const TAG_CHARS: &str = r"\x{4e00}-\x{9fa5}A-Za-z0-9_/";

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?:^|\s)(#[{TAG_CHARS}]+)")).expect("tag pattern is valid")
});

/// Split text into literal runs and hashtags.
///
/// Whitespace that introduces a tag becomes its own text segment. Complete
/// raw-markup fences are skipped over and emitted whole as text so their
/// content is never tagged.
pub fn split_tags(text: &str) -> Vec<Segment> {
    let mut parts = Vec::new();
    let mut last = 0;

    for fence in raw::fences(text) {
        push_tags(text, last, fence.start, &mut parts);
        parts.push(Segment::text(&text[fence.clone()]));
        last = fence.end;
    }
    push_tags(text, last, text.len(), &mut parts);

    parts
}

fn push_tags(text: &str, start: usize, end: usize, parts: &mut Vec<Segment>) {
    let mut last = start;

    while last < end {
        // Searching the whole haystack keeps `^` anchored to the real start of input
        let Some(caps) = TAG_RE.captures_at(text, last) else {
            break;
        };
        let (Some(whole), Some(tag)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        if whole.start() >= end {
            break;
        }

        if whole.start() > last {
            parts.push(Segment::text(&text[last..whole.start()]));
        }
        if tag.start() > whole.start() {
            parts.push(Segment::text(&text[whole.start()..tag.start()]));
        }
        parts.push(Segment::Tag(Tag {
            content: tag.as_str().to_string(),
            name: tag.as_str()[1..].to_string(),
        }));

        last = whole.end();
    }

    if last < end {
        parts.push(Segment::text(&text[last..end]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn tag(name: &str) -> Segment {
        Segment::Tag(Tag::new(name))
    }

    #[test]
    fn two_level_tag_between_words() {
        assert_eq!(
            split_tags("hello #world/foo end"),
            vec![
                Segment::text("hello"),
                Segment::text(" "),
                tag("world/foo"),
                Segment::text(" end"),
            ]
        );
    }

    #[test]
    fn tag_at_start_of_input() {
        assert_eq!(
            split_tags("#rust is fun"),
            vec![tag("rust"), Segment::text(" is fun")]
        );
    }

    #[test]
    fn han_characters_are_tag_characters() {
        assert_eq!(
            split_tags("今天 #读书笔记"),
            vec![Segment::text("今天"), Segment::text(" "), tag("读书笔记")]
        );
    }

    #[test]
    fn newline_before_tag_is_kept_as_text() {
        assert_eq!(
            split_tags("line\n#tag"),
            vec![Segment::text("line"), Segment::text("\n"), tag("tag")]
        );
    }

    #[rstest]
    #[case::glued_to_word("email#notatag")]
    #[case::bare_hash("# heading")]
    #[case::double_hash("##twice")]
    #[case::empty("")]
    fn no_tag(#[case] input: &str) {
        let parts = split_tags(input);
        assert!(parts.iter().all(|p| matches!(p, Segment::Text { .. })));
        assert_eq!(super::super::to_source(&parts), input);
    }

    #[test]
    fn adjacent_hash_is_left_as_text() {
        // The second `#` has no whitespace before it
        assert_eq!(split_tags("#a#b"), vec![tag("a"), Segment::text("#b")]);
    }

    #[test]
    fn tag_stops_at_punctuation() {
        assert_eq!(
            split_tags("#Hello, world"),
            vec![tag("Hello"), Segment::text(", world")]
        );
    }

    #[test]
    fn tags_inside_raw_fence_are_ignored() {
        let input = "#before\n```__html\n#inside\n```\n#after";
        assert_eq!(
            split_tags(input),
            vec![
                tag("before"),
                Segment::text("\n"),
                Segment::text("```__html\n#inside\n```"),
                Segment::text("\n"),
                tag("after"),
            ]
        );
    }

    #[test]
    fn tag_directly_after_fence_needs_whitespace() {
        let input = "```__html\nx\n```#glued";
        assert_eq!(
            split_tags(input),
            vec![
                Segment::text("```__html\nx\n```"),
                Segment::text("#glued"),
            ]
        );
    }
}
