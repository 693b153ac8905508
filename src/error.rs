//! Error taxonomy for fetching and parsing.

use thiserror::Error;

/// Why a page could not be turned into a `WordEntry`.
///
/// All variants are deterministic for a given input: re-parsing the same
/// wikitext always fails the same way, so only a re-fetch can change the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The page exists but has no German section.
    #[error("no German language section on the page")]
    LanguageNotPresent,

    /// The German section has no recognizable part-of-speech heading.
    #[error("no part-of-speech heading found in the German section")]
    NoPartOfSpeechFound,

    /// A specific stage hit markup it could not make sense of.
    #[error("{stage}: {reason}")]
    ParseFailure { stage: String, reason: String },
}

impl ParseError {
    pub fn failure(stage: &str, reason: impl Into<String>) -> Self {
        ParseError::ParseFailure {
            stage: stage.to_string(),
            reason: reason.into(),
        }
    }

    /// Name of the stage that failed.
    pub fn stage(&self) -> &str {
        match self {
            ParseError::LanguageNotPresent => "locate_language_section",
            ParseError::NoPartOfSpeechFound => "split_pos_blocks",
            ParseError::ParseFailure { stage, .. } => stage,
        }
    }
}

/// Low-level markup errors raised by the template tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WikitextError {
    #[error("unbalanced template at byte {offset}")]
    UnbalancedTemplate { offset: usize },

    #[error("templates nested too deeply at byte {offset}")]
    NestingTooDeep { offset: usize },
}

impl WikitextError {
    /// Short reason used when the error is lifted into a `ParseFailure`.
    pub fn reason(&self) -> &'static str {
        match self {
            WikitextError::UnbalancedTemplate { .. } => "unbalanced template",
            WikitextError::NestingTooDeep { .. } => "template nesting too deep",
        }
    }

    pub fn at_stage(&self, stage: &str) -> ParseError {
        ParseError::failure(stage, self.reason())
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no Wiktionary page for \"{word}\"")]
    NotFound { word: String },

    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {code}: {info}")]
    Api { code: String, info: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Error returned by a full fetch-then-parse lookup.
///
/// Fetch errors are passed through unchanged.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("\"{word}\" not found in German Wiktionary")]
    NotFound { word: String },

    #[error(transparent)]
    Fetch(FetchError),

    #[error("failed to parse \"{word}\": {source}")]
    Parse {
        word: String,
        #[source]
        source: ParseError,
    },
}

impl From<FetchError> for LookupError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotFound { word } => LookupError::NotFound { word },
            other => LookupError::Fetch(other),
        }
    }
}
