//! Emoji shortcodes (`:category_name:`) and their image locators.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::block::{Block, List, ListItem, Span};
use crate::config::EmojiConfig;

static SHORTCODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i):([a-z0-9]+)_([a-z0-9_\-]+):").expect("shortcode pattern is valid")
});

static ALT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^emoji:([a-z0-9]+)_([a-z0-9_\-]+)").expect("emoji alt pattern is valid")
});

static EXTENSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(\w+)(?:[?#]|$)").expect("extension pattern is valid"));

const ALT_PREFIX: &str = "emoji:";

/// Looks up emoji categories and builds image locators for them.
pub trait EmojiResolver {
    fn is_category(&self, category: &str) -> bool;

    fn build_url(&self, category: &str, name: &str, format: &str) -> String;

    /// Format used for the first locator of every emoji.
    fn default_format(&self) -> &str {
        "png"
    }
}

/// A `:category_name:` shortcode, lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EmojiToken {
    pub category: String,
    pub name: String,
}

impl EmojiToken {
    pub fn new(category: &str, name: &str) -> Self {
        Self {
            category: category.to_lowercase(),
            name: name.to_lowercase(),
        }
    }

    /// Alt text that marks an image as this emoji.
    pub fn alt(&self) -> String {
        format!("{ALT_PREFIX}{self}")
    }

    /// Recover the token from an image's alt text.
    pub fn from_alt(alt: &str) -> Option<Self> {
        let caps = ALT_RE.captures(alt)?;
        Some(Self::new(caps.get(1)?.as_str(), caps.get(2)?.as_str()))
    }
}

impl fmt::Display for EmojiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.category, self.name)
    }
}

/// Emoji catalog backed by the `[emoji]` config section.
#[derive(Debug, Clone)]
pub struct EmojiCatalog {
    base_url: String,
    categories: BTreeSet<String>,
    default_format: String,
    fallback_formats: Vec<String>,
}

impl EmojiCatalog {
    pub fn from_config(config: &EmojiConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            categories: config.categories.iter().map(|c| c.to_lowercase()).collect(),
            default_format: config.default_format.clone(),
            fallback_formats: config.fallback_formats.clone(),
        }
    }

    pub fn fallback_formats(&self) -> &[String] {
        &self.fallback_formats
    }

    /// Fallback state for an emoji image that is about to be shown.
    pub fn fallback_for(&self, alt: &str, url: &str) -> Option<FormatFallback> {
        FormatFallback::for_image(alt, url, &self.fallback_formats)
    }
}

impl EmojiResolver for EmojiCatalog {
    fn is_category(&self, category: &str) -> bool {
        self.categories.contains(category)
    }

    fn build_url(&self, category: &str, name: &str, format: &str) -> String {
        format!("{}/{category}/{name}.{format}", self.base_url)
    }

    fn default_format(&self) -> &str {
        &self.default_format
    }
}

/// Replace emoji shortcodes in a parsed document with image spans.
///
/// Code blocks, inline code, links and images are left alone. Shortcodes with
/// an unknown category stay text.
pub fn transform<R: EmojiResolver + ?Sized>(blocks: Vec<Block>, resolver: &R) -> Vec<Block> {
    blocks
        .into_iter()
        .map(|block| transform_block(block, resolver))
        .collect()
}

fn transform_block<R: EmojiResolver + ?Sized>(block: Block, resolver: &R) -> Block {
    match block {
        Block::Heading { level, content } => Block::Heading {
            level,
            content: transform_spans(content, resolver),
        },
        Block::Paragraph { content } => Block::Paragraph {
            content: transform_spans(content, resolver),
        },
        Block::Quote { blocks } => Block::Quote {
            blocks: transform(blocks, resolver),
        },
        Block::List(list) => Block::List(transform_list(list, resolver)),
        block @ (Block::CodeBlock { .. } | Block::Rule) => block,
    }
}

fn transform_list<R: EmojiResolver + ?Sized>(list: List, resolver: &R) -> List {
    List {
        ordered: list.ordered,
        items: list
            .items
            .into_iter()
            .map(|item| ListItem {
                content: transform_spans(item.content, resolver),
                nested: item
                    .nested
                    .map(|nested| Box::new(transform_list(*nested, resolver))),
                blocks: transform(item.blocks, resolver),
                checked: item.checked,
            })
            .collect(),
    }
}

fn transform_spans<R: EmojiResolver + ?Sized>(spans: Vec<Span>, resolver: &R) -> Vec<Span> {
    let mut out = Vec::with_capacity(spans.len());
    for span in spans {
        match span {
            Span::Text { value } => expand_text(&value, resolver, &mut out),
            Span::Bold { content } => out.push(Span::Bold {
                content: transform_spans(content, resolver),
            }),
            Span::Italic { content } => out.push(Span::Italic {
                content: transform_spans(content, resolver),
            }),
            Span::Strikethrough { content } => out.push(Span::Strikethrough {
                content: transform_spans(content, resolver),
            }),
            skipped @ (Span::Code { .. }
            | Span::Link { .. }
            | Span::Image { .. }
            | Span::LineBreak) => out.push(skipped),
        }
    }
    out
}

/// Split one text span around recognized shortcodes.
fn expand_text<R: EmojiResolver + ?Sized>(value: &str, resolver: &R, out: &mut Vec<Span>) {
    let mut last = 0;

    for caps in SHORTCODE_RE.captures_iter(value) {
        let (Some(whole), Some(category), Some(name)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        let token = EmojiToken::new(category.as_str(), name.as_str());
        if !resolver.is_category(&token.category) {
            continue;
        }

        if whole.start() > last {
            out.push(Span::text(&value[last..whole.start()]));
        }
        log::trace!("emoji shortcode {token}");
        out.push(Span::Image {
            url: resolver.build_url(&token.category, &token.name, resolver.default_format()),
            alt: token.alt(),
            title: None,
        });
        last = whole.end();
    }

    if last < value.len() {
        out.push(Span::text(&value[last..]));
    }
}

/// Where an emoji image is in its format fallback sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackState {
    /// Showing the format at this index of the fallback list.
    Trying(usize),
    /// Showing a format that is not in the fallback list.
    Initial,
    Exhausted,
}

/// Retries an emoji image in other formats after load failures.
///
/// Each format in the list is tried at most once, in order, skipping the
/// one already shown. Once every format has failed the state is
/// [`FallbackState::Exhausted`] and further failures are ignored.
#[derive(Debug, Clone)]
pub struct FormatFallback {
    token: EmojiToken,
    formats: Vec<String>,
    tried: Vec<bool>,
    state: FallbackState,
}

impl FormatFallback {
    pub fn new(token: EmojiToken, formats: &[String], current_format: &str) -> Self {
        let mut tried = vec![false; formats.len()];
        let state = match formats.iter().position(|f| f == current_format) {
            Some(index) => {
                tried[index] = true;
                FallbackState::Trying(index)
            }
            None => FallbackState::Initial,
        };
        Self {
            token,
            formats: formats.to_vec(),
            tried,
            state,
        }
    }

    /// Build the fallback for an image, if its alt text marks it as an emoji.
    pub fn for_image(alt: &str, url: &str, formats: &[String]) -> Option<Self> {
        let token = EmojiToken::from_alt(alt)?;
        let current = url_format(url).unwrap_or_default();
        Some(Self::new(token, formats, current))
    }

    pub fn token(&self) -> &EmojiToken {
        &self.token
    }

    pub fn state(&self) -> FallbackState {
        self.state
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == FallbackState::Exhausted
    }

    /// Advance after `failed_url` failed to load, returning the next locator to try.
    pub fn on_load_failure<R: EmojiResolver + ?Sized>(
        &mut self,
        resolver: &R,
        failed_url: &str,
    ) -> Option<String> {
        if self.is_exhausted() {
            return None;
        }

        for (index, format) in self.formats.iter().enumerate() {
            if self.tried[index] {
                continue;
            }
            self.tried[index] = true;
            let candidate = resolver.build_url(&self.token.category, &self.token.name, format);
            if candidate != failed_url {
                log::debug!("emoji {} failed to load, retrying as {format}", self.token);
                self.state = FallbackState::Trying(index);
                return Some(candidate);
            }
        }

        log::debug!("emoji {} has no formats left", self.token);
        self.state = FallbackState::Exhausted;
        None
    }
}

/// File extension of a locator, ignoring any query or fragment.
pub fn url_format(url: &str) -> Option<&str> {
    EXTENSION_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
