use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::block::{Block, List, ListItem, Span};

/// Parse normalized lightweight markup into a list of blocks
pub fn parse(markup: &str) -> Vec<Block> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    let parser = Parser::new_ext(markup, options);
    let mut state = ParseState::default();

    for event in parser {
        process_event(event, &mut state);
    }

    log::trace!("parsed {} blocks", state.blocks.len());
    state.blocks
}

#[derive(Default)]
struct ParseState {
    blocks: Vec<Block>,

    // Current inline content being built
    spans: Vec<Span>,
    // Nested span buffers for bold, italic, strikethrough, links and images
    span_stack: Vec<Vec<Span>>,

    // Current heading level (if in a heading)
    heading_level: Option<u8>,

    // Code block state
    in_code_block: bool,
    code_language: Option<String>,
    code_content: String,

    // Link and image destinations, innermost last
    link_urls: Vec<String>,
    images: Vec<(String, Option<String>)>,

    // Raw HTML block being collected
    in_html_block: bool,
    html_content: String,

    // Enclosing block buffers while inside block quotes, with the list depth
    // at which each quote opened
    quote_stack: Vec<(Vec<Block>, usize)>,

    list_stack: Vec<ListBuilder>,
}

struct ListBuilder {
    ordered: bool,
    items: Vec<ListItem>,
    current_item_spans: Vec<Span>,
    current_item_nested: Option<Box<List>>,
    current_item_blocks: Vec<Block>,
    current_item_checked: Option<bool>,
}

impl ListBuilder {
    /// Item text goes in front until a block or nested list has been seen;
    /// after that it keeps its place as a paragraph.
    fn push_spans(&mut self, spans: Vec<Span>) {
        if spans.is_empty() {
            return;
        }
        if self.current_item_blocks.is_empty() && self.current_item_nested.is_none() {
            self.current_item_spans.extend(spans);
        } else {
            self.current_item_blocks
                .push(Block::Paragraph { content: spans });
        }
    }
}

impl ParseState {
    /// Append text, merging with a directly preceding text span so that
    /// downstream token scans see one contiguous run.
    fn push_text(&mut self, text: &str) {
        if let Some(Span::Text { value }) = self.spans.last_mut() {
            value.push_str(text);
        } else {
            self.spans.push(Span::text(text));
        }
    }

    /// The innermost open container is a list item rather than a block quote.
    fn in_list_item(&self) -> bool {
        let quote_depth = self.quote_stack.last().map_or(0, |(_, depth)| *depth);
        self.list_stack.len() > quote_depth
    }

    /// Move loose text of a tight list item into the item before a block starts.
    fn flush_item_text(&mut self) {
        if !self.in_list_item() {
            return;
        }
        let spans = std::mem::take(&mut self.spans);
        if let Some(list) = self.list_stack.last_mut() {
            list.push_spans(spans);
        }
    }

    /// Append a finished block to the open list item, quote or document.
    fn push_block(&mut self, block: Block) {
        if self.in_list_item() {
            if let Some(list) = self.list_stack.last_mut() {
                list.current_item_blocks.push(block);
                return;
            }
        }
        self.blocks.push(block);
    }

    fn open_inline(&mut self) {
        self.span_stack.push(std::mem::take(&mut self.spans));
    }

    /// Pops the enclosing span buffer, returning the content built since `open_inline`.
    fn close_inline(&mut self, wrap: impl FnOnce(Vec<Span>) -> Span) {
        let content = std::mem::take(&mut self.spans);
        if let Some(parent) = self.span_stack.pop() {
            self.spans = parent;
            self.spans.push(wrap(content));
        }
    }
}

fn process_event(event: Event, state: &mut ParseState) {
    match event {
        // Headings
        Event::Start(Tag::Heading { level, .. }) => {
            state.flush_item_text();
            state.heading_level = Some(heading_level_to_u8(level));
        }
        Event::End(TagEnd::Heading(_)) => {
            if let Some(level) = state.heading_level.take() {
                let content = std::mem::take(&mut state.spans);
                state.push_block(Block::Heading { level, content });
            }
        }

        // Paragraphs
        Event::Start(Tag::Paragraph) => {}
        Event::End(TagEnd::Paragraph) => {
            let content = std::mem::take(&mut state.spans);
            if !content.is_empty() {
                // Directly inside a list item the text belongs to that item
                if state.in_list_item() {
                    if let Some(list) = state.list_stack.last_mut() {
                        list.push_spans(content);
                    }
                } else {
                    state.blocks.push(Block::Paragraph { content });
                }
            }
        }

        // Block quotes collect their own blocks
        Event::Start(Tag::BlockQuote(_)) => {
            state.flush_item_text();
            let parent = std::mem::take(&mut state.blocks);
            state.quote_stack.push((parent, state.list_stack.len()));
        }
        Event::End(TagEnd::BlockQuote(_)) => {
            let inner = std::mem::take(&mut state.blocks);
            if let Some((parent, _)) = state.quote_stack.pop() {
                state.blocks = parent;
                state.push_block(Block::Quote { blocks: inner });
            }
        }

        // Text content
        Event::Text(text) => {
            if state.in_code_block {
                state.code_content.push_str(&text);
            } else {
                state.push_text(&text);
            }
        }

        // Raw HTML outside a raw-markup fence is shown as written
        Event::Start(Tag::HtmlBlock) => {
            state.flush_item_text();
            state.in_html_block = true;
            state.html_content.clear();
        }
        Event::End(TagEnd::HtmlBlock) => {
            state.in_html_block = false;
            let html = std::mem::take(&mut state.html_content);
            let content = html_lines(&html);
            if !content.is_empty() {
                state.push_block(Block::Paragraph { content });
            }
        }
        Event::Html(html) | Event::InlineHtml(html) => {
            if state.in_html_block {
                state.html_content.push_str(&html);
            } else if state.in_code_block {
                state.code_content.push_str(&html);
            } else {
                state.push_text(&html);
            }
        }

        // Inline code
        Event::Code(code) => {
            state.spans.push(Span::Code {
                value: code.into_string(),
            });
        }

        // Bold
        Event::Start(Tag::Strong) => state.open_inline(),
        Event::End(TagEnd::Strong) => state.close_inline(|content| Span::Bold { content }),

        // Italic
        Event::Start(Tag::Emphasis) => state.open_inline(),
        Event::End(TagEnd::Emphasis) => state.close_inline(|content| Span::Italic { content }),

        Event::Start(Tag::Strikethrough) => state.open_inline(),
        Event::End(TagEnd::Strikethrough) => {
            state.close_inline(|content| Span::Strikethrough { content })
        }

        // Links
        Event::Start(Tag::Link { dest_url, .. }) => {
            state.link_urls.push(dest_url.into_string());
            state.open_inline();
        }
        Event::End(TagEnd::Link) => {
            let url = state.link_urls.pop().unwrap_or_default();
            state.close_inline(|content| Span::Link { url, content });
        }

        // Images: nested content collapses into the alt text
        Event::Start(Tag::Image {
            dest_url, title, ..
        }) => {
            let title = title.into_string();
            let title = if title.is_empty() { None } else { Some(title) };
            state.images.push((dest_url.into_string(), title));
            state.open_inline();
        }
        Event::End(TagEnd::Image) => {
            let (url, title) = state.images.pop().unwrap_or_default();
            state.close_inline(|content| Span::Image {
                url,
                alt: plain_text(&content),
                title,
            });
        }

        // Code blocks
        Event::Start(Tag::CodeBlock(kind)) => {
            state.flush_item_text();
            state.in_code_block = true;
            state.code_language = match kind {
                CodeBlockKind::Fenced(lang) => {
                    let lang = lang.into_string();
                    if lang.is_empty() { None } else { Some(lang) }
                }
                CodeBlockKind::Indented => None,
            };
            state.code_content.clear();
        }
        Event::End(TagEnd::CodeBlock) => {
            state.in_code_block = false;
            let content = std::mem::take(&mut state.code_content);
            let language = state.code_language.take();
            state.push_block(Block::CodeBlock { language, content });
        }

        // Lists
        Event::Start(Tag::List(first_item)) => {
            // Text of the enclosing item belongs to that item, not the nested list
            state.flush_item_text();
            state.list_stack.push(ListBuilder {
                ordered: first_item.is_some(),
                items: Vec::new(),
                current_item_spans: Vec::new(),
                current_item_nested: None,
                current_item_blocks: Vec::new(),
                current_item_checked: None,
            });
        }
        Event::End(TagEnd::List(_)) => {
            if let Some(list_builder) = state.list_stack.pop() {
                let list = List {
                    ordered: list_builder.ordered,
                    items: list_builder.items,
                };
                // The first sublist of an item with no blocks yet is its nested list
                let parent = if state.in_list_item() {
                    state.list_stack.last_mut().filter(|parent| {
                        parent.current_item_nested.is_none()
                            && parent.current_item_blocks.is_empty()
                    })
                } else {
                    None
                };
                match parent {
                    Some(parent) => parent.current_item_nested = Some(Box::new(list)),
                    None => state.push_block(Block::List(list)),
                }
            }
        }

        Event::Start(Tag::Item) => {
            if let Some(list) = state.list_stack.last_mut() {
                list.current_item_spans.clear();
                list.current_item_nested = None;
                list.current_item_blocks.clear();
                list.current_item_checked = None;
            }
        }
        Event::End(TagEnd::Item) => {
            // Collect any remaining spans
            let remaining = std::mem::take(&mut state.spans);

            if let Some(list) = state.list_stack.last_mut() {
                list.push_spans(remaining);
                let content = std::mem::take(&mut list.current_item_spans);
                let nested = list.current_item_nested.take();
                let blocks = std::mem::take(&mut list.current_item_blocks);
                let checked = list.current_item_checked.take();
                list.items.push(ListItem {
                    content,
                    nested,
                    blocks,
                    checked,
                });
            }
        }

        // Task list checkboxes
        Event::TaskListMarker(checked) => {
            if let Some(list) = state.list_stack.last_mut() {
                list.current_item_checked = Some(checked);
            }
        }

        // Horizontal rule
        Event::Rule => {
            state.flush_item_text();
            state.push_block(Block::Rule);
        }

        // Soft/hard breaks
        Event::SoftBreak => {
            state.push_text(" ");
        }
        Event::HardBreak => {
            state.spans.push(Span::LineBreak);
        }

        // Ignore other events
        _ => {}
    }
}

fn heading_level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// One text span per line of an HTML block, trailing whitespace dropped.
fn html_lines(html: &str) -> Vec<Span> {
    let mut content = Vec::new();
    for line in html.trim_end().lines() {
        if !content.is_empty() {
            content.push(Span::LineBreak);
        }
        content.push(Span::text(line.trim_end()));
    }
    content
}

/// Flatten spans into their visible text.
pub(crate) fn plain_text(spans: &[Span]) -> String {
    let mut out = String::new();
    for span in spans {
        match span {
            Span::Text { value } | Span::Code { value } => out.push_str(value),
            Span::Bold { content }
            | Span::Italic { content }
            | Span::Strikethrough { content }
            | Span::Link { content, .. } => out.push_str(&plain_text(content)),
            Span::Image { alt, .. } => out.push_str(alt),
            Span::LineBreak => out.push('\n'),
        }
    }
    out
}
