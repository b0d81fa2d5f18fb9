mod block;
mod config;
pub mod emoji;
mod normalize;
mod outline;
mod parser;
mod render;
pub mod segment;

pub use block::{Block, List, ListItem, Span};
pub use config::{Config, ConfigError, EmojiConfig, RenderConfig};
pub use emoji::{EmojiCatalog, EmojiResolver, EmojiToken, FallbackState, FormatFallback};
pub use normalize::normalize;
pub use outline::rendered_to_outline;
pub use render::{Node, Rendered, Renderer, SpoilerView, TagChip};
pub use segment::{RawMarkup, Segment, Spoiler, SpoilerStyle, Tag, TagPath};

/// Parse lightweight markup into a vector of blocks, without any post extensions.
pub fn parse_markup(markup: &str) -> Vec<Block> {
    parser::parse(markup)
}

/// Render a post body with default line-break handling.
pub fn render<R: EmojiResolver + ?Sized>(
    content: &str,
    active_tag: Option<&str>,
    resolver: &R,
) -> Rendered {
    Renderer::new(resolver)
        .with_active_tag(active_tag)
        .render(content)
}

/// Render a post body using the emoji catalog and render options from `config`.
pub fn render_with_config(content: &str, active_tag: Option<&str>, config: &Config) -> Rendered {
    let catalog = EmojiCatalog::from_config(&config.emoji);
    Renderer::new(&catalog)
        .with_active_tag(active_tag)
        .with_hard_line_breaks(config.render.hard_line_breaks)
        .render(content)
}
