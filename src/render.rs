//! Assemble segments into render nodes.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::block::{Block, List, Span};
use crate::emoji::{self, EmojiResolver, EmojiToken};
use crate::normalize::normalize;
use crate::parser;
use crate::segment::{self, Segment, Spoiler, SpoilerStyle, Tag};

static LEADING_BREAKS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*\n+").expect("leading break pattern is valid"));

static TRAILING_BREAKS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n+[ \t]*$").expect("trailing break pattern is valid"));

/// A displayable piece of a rendered post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Tag(TagChip),
    Markup { blocks: Vec<Block> },
    Spoiler(SpoilerView),
    RawMarkup { value: String },
    LineBreak,
    /// Keeps a spoiler from running into the word after it.
    Space,
}

/// A clickable hashtag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagChip {
    pub name: String,
    /// The literal `#name` token, used as a tooltip.
    pub content: String,
    pub parent: String,
    pub child: Option<String>,
    pub active: bool,
}

impl TagChip {
    fn new(tag: &Tag, active_tag: Option<&str>) -> Self {
        let path = tag.path();
        Self {
            name: tag.name.clone(),
            content: tag.content.clone(),
            parent: path.parent.to_string(),
            child: path.child.map(str::to_string),
            active: active_tag == Some(tag.name.as_str()),
        }
    }

    pub fn is_second_level(&self) -> bool {
        self.child.is_some()
    }

    /// The active tag after this chip is clicked: clicking the active tag clears it.
    pub fn toggle(&self) -> Option<String> {
        if self.active {
            None
        } else {
            Some(self.name.clone())
        }
    }
}

/// What the spoiler presenter needs to draw a hidden block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpoilerView {
    pub text: String,
    pub style: SpoilerStyle,
    pub color: Option<String>,
}

impl From<Spoiler> for SpoilerView {
    fn from(spoiler: Spoiler) -> Self {
        Self {
            text: spoiler.value,
            style: spoiler.style,
            color: spoiler.color,
        }
    }
}

/// The rendered form of one post body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Rendered {
    pub nodes: Vec<Node>,
}

impl Rendered {
    pub fn tags(&self) -> impl Iterator<Item = &TagChip> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Tag(chip) => Some(chip),
            _ => None,
        })
    }

    /// Every emoji image in the markup, in document order.
    pub fn emoji(&self) -> Vec<EmojiToken> {
        let mut tokens = Vec::new();
        for node in &self.nodes {
            if let Node::Markup { blocks } = node {
                collect_block_emoji(blocks, &mut tokens);
            }
        }
        tokens
    }
}

fn collect_block_emoji(blocks: &[Block], tokens: &mut Vec<EmojiToken>) {
    for block in blocks {
        match block {
            Block::Heading { content, .. } | Block::Paragraph { content } => {
                collect_span_emoji(content, tokens)
            }
            Block::Quote { blocks } => collect_block_emoji(blocks, tokens),
            Block::List(list) => collect_list_emoji(list, tokens),
            Block::CodeBlock { .. } | Block::Rule => {}
        }
    }
}

fn collect_list_emoji(list: &List, tokens: &mut Vec<EmojiToken>) {
    for item in &list.items {
        collect_span_emoji(&item.content, tokens);
        if let Some(nested) = &item.nested {
            collect_list_emoji(nested, tokens);
        }
        collect_block_emoji(&item.blocks, tokens);
    }
}

fn collect_span_emoji(spans: &[Span], tokens: &mut Vec<EmojiToken>) {
    for span in spans {
        match span {
            Span::Image { alt, .. } => tokens.extend(EmojiToken::from_alt(alt)),
            Span::Bold { content }
            | Span::Italic { content }
            | Span::Strikethrough { content }
            | Span::Link { content, .. } => collect_span_emoji(content, tokens),
            Span::Text { .. } | Span::Code { .. } | Span::LineBreak => {}
        }
    }
}

/// Line breaks deferred between the pieces of one spoiler-bearing text run.
#[derive(Debug, Default)]
struct LineBreakState {
    pending_breaks: usize,
    last_was_spoiler: bool,
}

impl LineBreakState {
    fn flush(&mut self, nodes: &mut Vec<Node>) {
        push_breaks(std::mem::take(&mut self.pending_breaks), nodes);
    }
}

fn push_breaks(count: usize, nodes: &mut Vec<Node>) {
    nodes.extend(std::iter::repeat_n(Node::LineBreak, count));
}

/// Renders post bodies against an emoji resolver.
pub struct Renderer<'a, R: EmojiResolver + ?Sized> {
    resolver: &'a R,
    active_tag: Option<&'a str>,
    hard_line_breaks: bool,
}

impl<'a, R: EmojiResolver + ?Sized> Renderer<'a, R> {
    pub fn new(resolver: &'a R) -> Self {
        Self {
            resolver,
            active_tag: None,
            hard_line_breaks: true,
        }
    }

    /// Mark chips for this tag as active.
    pub fn with_active_tag(mut self, active_tag: Option<&'a str>) -> Self {
        self.active_tag = active_tag;
        self
    }

    pub fn with_hard_line_breaks(mut self, hard_line_breaks: bool) -> Self {
        self.hard_line_breaks = hard_line_breaks;
        self
    }

    pub fn render(&self, content: &str) -> Rendered {
        let mut nodes = Vec::new();

        for part in segment::tags::split_tags(content) {
            match part {
                Segment::Text { content: text } => self.render_text(&text, &mut nodes),
                other => self.push_segment(other, &mut nodes),
            }
        }

        log::debug!("rendered {} nodes", nodes.len());
        Rendered { nodes }
    }

    /// Render a literal run from the tag pass: raw-markup fences first, then spoilers.
    fn render_text(&self, text: &str, nodes: &mut Vec<Node>) {
        for run in segment::raw::split_raw_markup(text) {
            match run {
                Segment::Text { content: text } => self.render_run(&text, nodes),
                other => self.push_segment(other, nodes),
            }
        }
    }

    fn render_run(&self, text: &str, nodes: &mut Vec<Node>) {
        let pieces = segment::spoiler::split_spoilers(text);

        if let [Segment::Text { content }] = pieces.as_slice() {
            self.push_markup(content, nodes);
            return;
        }

        let mut state = LineBreakState::default();
        for piece in pieces {
            match piece {
                Segment::Text { content } => {
                    state.flush(nodes);

                    let leading = LEADING_BREAKS_RE.find(&content);
                    let leading_breaks = leading.map_or(0, |m| count_newlines(m.as_str()));
                    if leading_breaks > 0 {
                        push_breaks(leading_breaks, nodes);
                    } else if state.last_was_spoiler {
                        nodes.push(Node::Space);
                    }

                    let inner = &content[leading.map_or(0, |m| m.end())..];
                    let trailing = TRAILING_BREAKS_RE.find(inner);
                    let inner = &inner[..trailing.map_or(inner.len(), |m| m.start())];

                    self.push_markup(inner, nodes);
                    // Deferred: dropped if nothing follows
                    state.pending_breaks = trailing.map_or(0, |m| count_newlines(m.as_str()));
                    state.last_was_spoiler = false;
                }
                Segment::Spoiler(spoiler) => {
                    state.flush(nodes);
                    nodes.push(Node::Spoiler(spoiler.into()));
                    state.last_was_spoiler = true;
                }
                other => self.push_segment(other, nodes),
            }
        }
    }

    fn push_segment(&self, segment: Segment, nodes: &mut Vec<Node>) {
        match segment {
            Segment::Text { content } => self.push_markup(&content, nodes),
            Segment::Tag(tag) => nodes.push(Node::Tag(TagChip::new(&tag, self.active_tag))),
            Segment::Spoiler(spoiler) => nodes.push(Node::Spoiler(spoiler.into())),
            Segment::RawMarkup(raw) => nodes.push(Node::RawMarkup { value: raw.value }),
        }
    }

    fn push_markup(&self, text: &str, nodes: &mut Vec<Node>) {
        let markup = normalize(text, self.hard_line_breaks);
        let blocks = emoji::transform(parser::parse(&markup), self.resolver);
        if !blocks.is_empty() {
            nodes.push(Node::Markup { blocks });
        }
    }
}

fn count_newlines(s: &str) -> usize {
    s.bytes().filter(|&b| b == b'\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct NoEmoji;

    impl EmojiResolver for NoEmoji {
        fn is_category(&self, _category: &str) -> bool {
            false
        }

        fn build_url(&self, category: &str, name: &str, format: &str) -> String {
            format!("{category}/{name}.{format}")
        }
    }

    fn render(content: &str) -> Vec<Node> {
        Renderer::new(&NoEmoji).render(content).nodes
    }

    fn text(value: &str) -> Node {
        Node::Markup {
            blocks: vec![Block::Paragraph {
                content: vec![Span::text(value)],
            }],
        }
    }

    fn spoiler(value: &str) -> Node {
        Node::Spoiler(SpoilerView {
            text: value.to_string(),
            style: SpoilerStyle::Blur,
            color: None,
        })
    }

    #[test]
    fn one_break_each_side_of_spoiler() {
        assert_eq!(
            render("line one\n{% spoiler hidden %}\nline two"),
            vec![
                text("line one"),
                Node::LineBreak,
                spoiler("hidden"),
                Node::LineBreak,
                text("line two"),
            ]
        );
    }

    #[test]
    fn spoiler_first_and_last_add_no_breaks() {
        assert_eq!(render("{% spoiler a %}"), vec![spoiler("a")]);
        assert_eq!(
            render("{% spoiler a %}\nafter"),
            vec![spoiler("a"), Node::LineBreak, text("after")]
        );
        assert_eq!(
            render("before\n{% spoiler a %}"),
            vec![text("before"), Node::LineBreak, spoiler("a")]
        );
    }

    #[test]
    fn trailing_breaks_after_last_text_are_dropped() {
        assert_eq!(
            render("{% spoiler a %} tail\n\n"),
            vec![spoiler("a"), Node::Space, text("tail")]
        );
    }

    #[test]
    fn blank_line_counts_both_newlines() {
        assert_eq!(
            render("above\n\n{% spoiler a %}"),
            vec![text("above"), Node::LineBreak, Node::LineBreak, spoiler("a")]
        );
    }

    #[test]
    fn space_separates_spoiler_from_following_word() {
        assert_eq!(
            render("say {% spoiler a %}done"),
            vec![text("say"), spoiler("a"), Node::Space, text("done")]
        );
    }

    #[test]
    fn consecutive_spoilers() {
        assert_eq!(
            render("{% spoiler a %}{% spoiler b %}"),
            vec![spoiler("a"), spoiler("b")]
        );
    }

    #[test]
    fn raw_markup_resets_break_bookkeeping() {
        assert_eq!(
            render("{% spoiler a %}\n```__html\n<hr>\n```\nnext"),
            vec![
                spoiler("a"),
                Node::LineBreak,
                Node::RawMarkup {
                    value: "<hr>".to_string()
                },
                text("next"),
            ]
        );
    }

    #[test]
    fn text_without_spoiler_is_one_block() {
        let nodes = render("one\ntwo");
        assert_eq!(
            nodes,
            vec![Node::Markup {
                blocks: vec![Block::Paragraph {
                    content: vec![Span::text("one"), Span::LineBreak, Span::text("two")],
                }],
            }]
        );
    }

    #[test]
    fn soft_breaks_without_hard_line_breaks() {
        let nodes = Renderer::new(&NoEmoji)
            .with_hard_line_breaks(false)
            .render("one\ntwo")
            .nodes;
        assert_eq!(nodes, vec![text("one two")]);
    }

    #[test]
    fn tags_become_chips() {
        let rendered = Renderer::new(&NoEmoji)
            .with_active_tag(Some("world/foo"))
            .render("hello #world/foo end #other");
        let chips: Vec<_> = rendered.tags().collect();
        assert_eq!(chips.len(), 2);
        assert_eq!(chips[0].parent, "world");
        assert_eq!(chips[0].child.as_deref(), Some("foo"));
        assert!(chips[0].active);
        assert!(chips[0].is_second_level());
        assert_eq!(chips[0].toggle(), None);
        assert!(!chips[1].active);
        assert_eq!(chips[1].toggle().as_deref(), Some("other"));
    }

    #[test]
    fn whitespace_only_runs_render_nothing() {
        assert_eq!(
            render("#a #b"),
            vec![
                Node::Tag(TagChip::new(&Tag::new("a"), None)),
                Node::Tag(TagChip::new(&Tag::new("b"), None)),
            ]
        );
    }
}
