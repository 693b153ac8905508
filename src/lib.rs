//! German Wiktionary lookup and wikitext parser.
//!
//! Turns the wikitext of a de.wiktionary.org page into a [`WordEntry`]: one
//! block per part-of-speech heading of the German section, each with its
//! numbered definitions, inflection table, translations and lemma references.
//!
//! ```no_run
//! use dewiktionary::{lookup, ApiFetcher, Config, Parser};
//!
//! let config = Config::default();
//! let fetcher = ApiFetcher::new(&config.fetch)?;
//! let entry = lookup(&fetcher, &Parser::new(config.parser), "Mann")?;
//! println!("{}", serde_json::to_string_pretty(&entry)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod dump;
pub mod error;
pub mod fetch;
pub mod inflection;
pub mod lookup;
pub mod model;
pub mod parser;
pub mod wikitext;

pub use config::{Config, FetchConfig, Mode, ParserConfig};
pub use dump::{run_scan, DumpFetcher, ScanOptions, ScanStats};
pub use error::{ConfigError, FetchError, LookupError, ParseError, WikitextError};
pub use fetch::{ApiFetcher, Fetcher};
pub use inflection::{FormKey, InflectionFamily, InflectionTable};
pub use lookup::{lookup, lookup_with_article, LookupResult};
pub use model::{
    Article, Definition, DefinitionKind, Diagnostic, FormOf, LanguageSection, PartOfSpeech,
    PartOfSpeechBlock, Translation, WordEntry,
};
pub use parser::{parse, Parser, PosSegment};
