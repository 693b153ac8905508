//! YAML configuration for the parser and the fetchers.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "dewiktionary.yaml";
pub const DEFAULT_API_URL: &str = "https://de.wiktionary.org/w/api.php";

/// How the parser reacts to markup it does not recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Skip unrecognized headings and parameters and keep going; stage
    /// failures inside one block become diagnostics.
    #[default]
    Lenient,
    /// Any unrecognized structure or stage failure aborts the parse.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub mode: Mode,
    /// Translation languages to keep, by code.
    pub translation_languages: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            mode: Mode::Lenient,
            translation_languages: ["en", "fr", "it", "es"].iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ParserConfig {
    pub fn strict() -> Self {
        ParserConfig {
            mode: Mode::Strict,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub api_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            api_url: DEFAULT_API_URL.to_string(),
            user_agent: format!("dewiktionary-rust/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub parser: ParserConfig,
    pub fetch: FetchConfig,
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml(&text)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load `explicit` if given, else the default file if present, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => match find_config_file() {
                Some(path) => Self::load(&path),
                None => Ok(Config::default()),
            },
        }
    }
}

fn find_config_file() -> Option<PathBuf> {
    let candidates = [PathBuf::from(DEFAULT_CONFIG_FILE)];
    candidates.into_iter().find(|p| p.exists())
}
