use serde::Serialize;

/// Inline text spans with formatting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Span {
    Text { value: String },
    Bold { content: Vec<Span> },
    Italic { content: Vec<Span> },
    Strikethrough { content: Vec<Span> },
    Code { value: String },
    Link { url: String, content: Vec<Span> },
    /// Images carry their alt text flattened; emoji images use `emoji:<category>_<name>`.
    Image {
        url: String,
        alt: String,
        title: Option<String>,
    },
    LineBreak,
}

impl Span {
    pub fn text(value: impl Into<String>) -> Self {
        Span::Text {
            value: value.into(),
        }
    }
}

/// A single list item, which can contain nested content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListItem {
    pub content: Vec<Span>,
    pub nested: Option<Box<List>>,
    /// Headings, quotes, code and any text following them, in source order after `nested`
    pub blocks: Vec<Block>,
    /// For task lists: None = not a task, Some(false) = unchecked, Some(true) = checked
    pub checked: Option<bool>,
}

/// A list (ordered or unordered)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct List {
    pub ordered: bool,
    pub items: Vec<ListItem>,
}

/// Block-level elements parsed from the lightweight markup of a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading {
        level: u8,
        content: Vec<Span>,
    },
    Paragraph {
        content: Vec<Span>,
    },
    CodeBlock {
        language: Option<String>,
        content: String,
    },
    Quote {
        blocks: Vec<Block>,
    },
    List(List),
    Rule,
}
