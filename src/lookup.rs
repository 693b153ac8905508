//! Fetch a page and parse it in one step.

use crate::error::LookupError;
use crate::fetch::Fetcher;
use crate::model::{Article, WordEntry};
use crate::parser::Parser;

/// What a lookup produced: the parsed entry plus the page it came from.
#[derive(Debug)]
pub struct LookupResult {
    pub article: Article,
    pub entry: Result<WordEntry, LookupError>,
}

/// Fetch `word` and parse the page. Fetch failures are returned as-is and
/// never retried here.
pub fn lookup<F: Fetcher + ?Sized>(
    fetcher: &F,
    parser: &Parser,
    word: &str,
) -> Result<WordEntry, LookupError> {
    let article = fetcher.fetch(word)?;
    parse_article(parser, &article)
}

/// Like [`lookup`], but keeps the fetched article even when parsing fails.
pub fn lookup_with_article<F: Fetcher + ?Sized>(
    fetcher: &F,
    parser: &Parser,
    word: &str,
) -> Result<LookupResult, LookupError> {
    let article = fetcher.fetch(word)?;
    let entry = parse_article(parser, &article);
    Ok(LookupResult { article, entry })
}

fn parse_article(parser: &Parser, article: &Article) -> Result<WordEntry, LookupError> {
    parser.parse(article).map_err(|source| LookupError::Parse {
        word: article.headword().to_string(),
        source,
    })
}
