use crate::block::{Block, List, Span};
use crate::render::{Node, Rendered};

/// Convert rendered nodes to a plain-text outline for terminals and snapshots
pub fn rendered_to_outline(rendered: &Rendered) -> String {
    let mut out = String::new();
    // Set after a block-level node so the next one starts on its own line
    let mut after_block = false;

    for node in &rendered.nodes {
        let is_block = matches!(node, Node::Markup { .. } | Node::RawMarkup { .. });
        if is_block && after_block && !out.ends_with('\n') {
            out.push('\n');
        }
        after_block = is_block;

        match node {
            Node::Tag(chip) => {
                out.push('[');
                out.push_str(&chip.content);
                if chip.active {
                    out.push('*');
                }
                out.push(']');
            }
            Node::Markup { blocks } => {
                for (i, block) in blocks.iter().enumerate() {
                    if i > 0 {
                        out.push('\n');
                    }
                    emit_block(block, "", &mut out);
                }
            }
            Node::Spoiler(spoiler) => {
                out.push_str("[spoiler:");
                out.push_str(spoiler.style.as_str());
                if let Some(color) = &spoiler.color {
                    out.push(' ');
                    out.push_str(color);
                }
                out.push_str("] ");
                out.push_str(&spoiler.text);
                out.push_str(" [/spoiler]");
            }
            Node::RawMarkup { value } => {
                out.push_str("<raw>\n");
                out.push_str(value);
                out.push_str("\n</raw>");
            }
            Node::LineBreak => out.push('\n'),
            Node::Space => out.push(' '),
        }
    }

    out
}

fn emit_block(block: &Block, prefix: &str, out: &mut String) {
    match block {
        Block::Heading { level, content } => {
            out.push_str(prefix);
            for _ in 0..*level {
                out.push('#');
            }
            out.push(' ');
            spans_to_outline(content, prefix, out);
        }
        Block::Paragraph { content } => {
            out.push_str(prefix);
            spans_to_outline(content, prefix, out);
        }
        Block::CodeBlock { language, content } => {
            out.push_str(prefix);
            out.push_str("```");
            if let Some(lang) = language {
                out.push_str(lang);
            }
            for line in content.lines() {
                out.push('\n');
                out.push_str(prefix);
                out.push_str(line);
            }
            out.push('\n');
            out.push_str(prefix);
            out.push_str("```");
        }
        Block::Quote { blocks } => {
            let nested = format!("{prefix}> ");
            for (i, inner) in blocks.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                emit_block(inner, &nested, out);
            }
        }
        Block::List(list) => list_to_outline(list, prefix, 0, out),
        Block::Rule => {
            out.push_str(prefix);
            out.push_str("---");
        }
    }
}

fn list_to_outline(list: &List, prefix: &str, depth: usize, out: &mut String) {
    for (i, item) in list.items.iter().enumerate() {
        if i > 0 || depth > 0 {
            out.push('\n');
        }
        out.push_str(prefix);
        for _ in 0..depth {
            out.push_str("  ");
        }
        if list.ordered {
            out.push_str(&format!("{}. ", i + 1));
        } else {
            out.push_str("- ");
        }
        match item.checked {
            Some(true) => out.push_str("[x] "),
            Some(false) => out.push_str("[ ] "),
            None => {}
        }
        spans_to_outline(&item.content, prefix, out);
        if let Some(nested) = &item.nested {
            list_to_outline(nested, prefix, depth + 1, out);
        }
        if !item.blocks.is_empty() {
            let indent = format!("{prefix}{}", "  ".repeat(depth + 1));
            for block in &item.blocks {
                out.push('\n');
                emit_block(block, &indent, out);
            }
        }
    }
}

fn spans_to_outline(spans: &[Span], prefix: &str, out: &mut String) {
    for span in spans {
        match span {
            Span::Text { value } => out.push_str(value),
            Span::Bold { content } => {
                out.push_str("**");
                spans_to_outline(content, prefix, out);
                out.push_str("**");
            }
            Span::Italic { content } => {
                out.push('_');
                spans_to_outline(content, prefix, out);
                out.push('_');
            }
            Span::Strikethrough { content } => {
                out.push_str("~~");
                spans_to_outline(content, prefix, out);
                out.push_str("~~");
            }
            Span::Code { value } => {
                out.push('`');
                out.push_str(value);
                out.push('`');
            }
            Span::Link { url, content } => {
                out.push('[');
                spans_to_outline(content, prefix, out);
                out.push_str("](");
                out.push_str(url);
                out.push(')');
            }
            Span::Image { url, alt, .. } => {
                // Emoji show as their shortcode
                if let Some(token) = crate::emoji::EmojiToken::from_alt(alt) {
                    out.push_str(&format!("<{token}>"));
                } else {
                    out.push_str(&format!("![{alt}]({url})"));
                }
            }
            Span::LineBreak => {
                out.push('\n');
                out.push_str(prefix);
            }
        }
    }
}
