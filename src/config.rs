use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

static DEFAULT_CONFIG: &str = include_str!("default_config.toml");

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub emoji: EmojiConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmojiConfig {
    /// Locators are `{base_url}/{category}/{name}.{format}`.
    pub base_url: String,
    pub categories: Vec<String>,
    pub default_format: String,
    /// Formats tried, in order, when an emoji image fails to load.
    pub fallback_formats: Vec<String>,
}

impl Default for EmojiConfig {
    fn default() -> Self {
        Self {
            base_url: "/emoji".to_string(),
            categories: [
                "smileys",
                "people",
                "animals",
                "food",
                "travel",
                "activities",
                "objects",
                "symbols",
                "flags",
            ]
            .map(String::from)
            .to_vec(),
            default_format: "png".to_string(),
            fallback_formats: ["png", "webp", "gif"].map(String::from).to_vec(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Turn every newline into a visible line break.
    pub hard_line_breaks: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            hard_line_breaks: true,
        }
    }
}

impl Config {
    /// The config bundled with the crate.
    pub fn compiled_default() -> Self {
        match toml::from_str(DEFAULT_CONFIG) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("bundled config is invalid, using built-in defaults: {e}");
                Self::default()
            }
        }
    }

    /// Parse config from TOML text. Missing keys take their defaults.
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, path)
    }

    /// Load config from a TOML file, or the bundled default if there is no such file.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                log::debug!("no config at {}, using defaults", path.display());
                Ok(Self::compiled_default())
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bundled_default_matches_built_in() {
        let bundled = Config::compiled_default();
        let built_in = Config::default();
        assert_eq!(bundled.emoji.base_url, built_in.emoji.base_url);
        assert_eq!(bundled.emoji.categories, built_in.emoji.categories);
        assert_eq!(bundled.emoji.default_format, built_in.emoji.default_format);
        assert_eq!(bundled.emoji.fallback_formats, built_in.emoji.fallback_formats);
        assert_eq!(bundled.render.hard_line_breaks, built_in.render.hard_line_breaks);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config = Config::from_toml(
            "[emoji]\nbase_url = \"https://cdn.example.com\"\n",
            Path::new("inline.toml"),
        )
        .unwrap();
        assert_eq!(config.emoji.base_url, "https://cdn.example.com");
        assert_eq!(config.emoji.default_format, "png");
        assert!(config.render.hard_line_breaks);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let err = Config::from_toml("[emoji\n", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(err.to_string(), "invalid config bad.toml");
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let config = Config::load_or_default(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(config.emoji.fallback_formats, ["png", "webp", "gif"]);
    }

    #[test]
    fn missing_file_is_an_error_for_load() {
        let err = Config::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
