//! Page fetchers: where raw wikitext comes from.

use std::time::Duration;

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::model::{normalize_headword, Article};

/// Supplies the raw wikitext of a page.
pub trait Fetcher {
    fn fetch(&self, word: &str) -> Result<Article, FetchError>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch(&self, word: &str) -> Result<Article, FetchError> {
        (**self).fetch(word)
    }
}

impl<F: Fetcher + ?Sized> Fetcher for Box<F> {
    fn fetch(&self, word: &str) -> Result<Article, FetchError> {
        (**self).fetch(word)
    }
}

/// Fetches pages through the MediaWiki Action API (`action=parse`).
pub struct ApiFetcher {
    client: reqwest::blocking::Client,
    api_url: String,
}

impl ApiFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
        })
    }
}

impl Fetcher for ApiFetcher {
    fn fetch(&self, word: &str) -> Result<Article, FetchError> {
        let word = normalize_headword(word);
        let params = [
            ("action", "parse"),
            ("prop", "wikitext"),
            ("page", word.as_str()),
            ("format", "json"),
            ("formatversion", "2"),
            ("redirects", "1"),
        ];

        tracing::debug!(word = %word, url = %self.api_url, "fetching page");
        let response = self.client.get(&self.api_url).query(&params).send()?;

        if !response.status().is_success() {
            return Err(FetchError::Api {
                code: response.status().as_u16().to_string(),
                info: format!("HTTP {}", response.status()),
            });
        }

        let body = response.text()?;
        decode_response(&word, &body)
    }
}

/// Turn an `action=parse` JSON body into an `Article`.
///
/// Success looks like `{"parse": {"title": ..., "wikitext": ...}}`; a missing
/// page is `{"error": {"code": "missingtitle", ...}}`.
pub fn decode_response(word: &str, body: &str) -> Result<Article, FetchError> {
    let json: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| FetchError::InvalidResponse(format!("failed to parse response: {}", e)))?;

    if let Some(error) = json.get("error") {
        let code = error["code"].as_str().unwrap_or_default().to_string();
        if code == "missingtitle" || code == "invalidtitle" {
            return Err(FetchError::NotFound {
                word: word.to_string(),
            });
        }
        return Err(FetchError::Api {
            code,
            info: error["info"].as_str().unwrap_or_default().to_string(),
        });
    }

    let parse = json
        .get("parse")
        .ok_or_else(|| FetchError::InvalidResponse("no \"parse\" object in response".to_string()))?;
    let wikitext = parse["wikitext"]
        .as_str()
        .ok_or_else(|| FetchError::InvalidResponse("no wikitext in response".to_string()))?;

    if let Some(title) = parse["title"].as_str() {
        if title != word {
            tracing::debug!(word, title, "followed redirect");
        }
    }

    Ok(Article::new(word, wikitext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wikitext() {
        let body = r#"{"parse":{"title":"Mann","pageid":1234,"wikitext":"== Mann ({{Sprache|Deutsch}}) ==\n"}}"#;
        let article = decode_response("Mann", body).unwrap();
        assert_eq!(article.headword(), "Mann");
        assert_eq!(article.wikitext(), "== Mann ({{Sprache|Deutsch}}) ==\n");
    }

    #[test]
    fn missing_title_is_not_found() {
        let body = r#"{"error":{"code":"missingtitle","info":"The page you specified doesn't exist."}}"#;
        let err = decode_response("Xyzzy", body).unwrap_err();
        assert!(matches!(err, FetchError::NotFound { ref word } if word == "Xyzzy"));
    }

    #[test]
    fn other_api_errors_keep_code() {
        let body = r#"{"error":{"code":"ratelimited","info":"slow down"}}"#;
        let err = decode_response("Mann", body).unwrap_err();
        assert!(matches!(err, FetchError::Api { ref code, .. } if code == "ratelimited"));
    }

    #[test]
    fn malformed_body() {
        assert!(matches!(
            decode_response("Mann", "<html>"),
            Err(FetchError::InvalidResponse(_))
        ));
        assert!(matches!(
            decode_response("Mann", r#"{"parse":{"title":"Mann"}}"#),
            Err(FetchError::InvalidResponse(_))
        ));
        assert!(matches!(
            decode_response("Mann", "{}"),
            Err(FetchError::InvalidResponse(_))
        ));
    }

    #[test]
    fn client_builds_from_config() {
        assert!(ApiFetcher::new(&FetchConfig::default()).is_ok());
    }
}
