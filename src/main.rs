use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

#[derive(Parser)]
#[command(name = "postmark")]
#[command(about = "Render a post body with tags, spoilers, raw markup and emoji")]
struct Cli {
    /// Input post file, or `-` for stdin
    input: PathBuf,

    /// Config file (defaults to postmark.toml in the current directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tag to mark as active
    #[arg(short, long)]
    active_tag: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Outline)]
    format: Format,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Plain-text outline of the render nodes
    Outline,
    /// Render nodes as JSON
    Json,
    /// Flat segment list as JSON
    Segments,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let content = read_input(&cli.input)?;

    let config = match &cli.config {
        Some(path) => postmark::Config::load(path)?,
        None => postmark::Config::load_or_default(Path::new("postmark.toml"))?,
    };

    let output = match cli.format {
        Format::Outline => {
            let rendered =
                postmark::render_with_config(&content, cli.active_tag.as_deref(), &config);
            postmark::rendered_to_outline(&rendered)
        }
        Format::Json => {
            let rendered =
                postmark::render_with_config(&content, cli.active_tag.as_deref(), &config);
            serde_json::to_string_pretty(&rendered).context("failed to serialize render nodes")?
        }
        Format::Segments => {
            let segments = postmark::segment::segment(&content);
            serde_json::to_string_pretty(&segments).context("failed to serialize segments")?
        }
    };

    println!("{output}");
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("failed to read stdin")?;
        return Ok(content);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
