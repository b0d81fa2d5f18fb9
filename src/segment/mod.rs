//! Lexical segmentation of a post body.
//!
//! Segmentation runs in three passes, each over the unconsumed text of the
//! previous one: hashtags ([`tags`]), raw-markup fences ([`raw`]) and
//! spoiler blocks ([`spoiler`]). Every pass is total; anything it does not
//! recognize stays a [`Segment::Text`].

pub mod raw;
pub mod spoiler;
pub mod tags;

use serde::Serialize;

pub use spoiler::SpoilerStyle;

/// One piece of a segmented post body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    Text { content: String },
    Tag(Tag),
    Spoiler(Spoiler),
    RawMarkup(RawMarkup),
}

impl Segment {
    pub fn text(content: impl Into<String>) -> Self {
        Segment::Text {
            content: content.into(),
        }
    }

    /// The exact source text this segment was cut from.
    pub fn source(&self) -> &str {
        match self {
            Segment::Text { content } => content,
            Segment::Tag(tag) => &tag.content,
            Segment::Spoiler(spoiler) => &spoiler.source,
            Segment::RawMarkup(raw) => &raw.source,
        }
    }
}

/// A `#name` or `#parent/child` hashtag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    /// The literal token, including the leading `#`.
    pub content: String,
    pub name: String,
}

/// Parent and optional child of a two-level tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagPath<'a> {
    pub parent: &'a str,
    pub child: Option<&'a str>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            content: format!("#{name}"),
            name,
        }
    }

    /// Splits the name at its first `/`.
    pub fn path(&self) -> TagPath<'_> {
        match self.name.split_once('/') {
            Some((parent, child)) => TagPath {
                parent,
                child: Some(child),
            },
            None => TagPath {
                parent: &self.name,
                child: None,
            },
        }
    }
}

/// A `{% spoiler ... %}` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Spoiler {
    pub style: SpoilerStyle,
    pub color: Option<String>,
    pub value: String,
    #[serde(skip)]
    pub source: String,
}

/// A fenced raw-markup block, passed through unparsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawMarkup {
    /// Fence content with surrounding whitespace trimmed.
    pub value: String,
    #[serde(skip)]
    pub source: String,
}

/// Run all three segmentation passes and flatten the result.
pub fn segment(content: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    for part in tags::split_tags(content) {
        let text = match part {
            Segment::Text { content } => content,
            other => {
                segments.push(other);
                continue;
            }
        };
        for run in raw::split_raw_markup(&text) {
            match run {
                Segment::Text { content: text } => {
                    segments.extend(spoiler::split_spoilers(&text));
                }
                other => segments.push(other),
            }
        }
    }
    log::trace!("segmented {} bytes into {} segments", content.len(), segments.len());
    segments
}

/// Concatenate segment sources back into the original text.
pub fn to_source(segments: &[Segment]) -> String {
    segments.iter().map(Segment::source).collect()
}
