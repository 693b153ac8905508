//! Offline access to a `pages-articles` XML dump (`.xml` or `.xml.bz2`).

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use bzip2::read::BzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{FetchError, ParseError};
use crate::fetch::Fetcher;
use crate::model::{normalize_headword, Article};
use crate::parser::Parser;

lazy_static! {
    static ref TITLE_PATTERN: Regex = Regex::new(r"<title>([^<]+)</title>").unwrap();
    static ref NS_PATTERN: Regex = Regex::new(r"<ns>(\d+)</ns>").unwrap();
    static ref TEXT_PATTERN: Regex = Regex::new(r"(?s)<text[^>]*>(.+?)</text>").unwrap();
    static ref REDIRECT_PATTERN: Regex = Regex::new(r#"<redirect\s+title="[^"]+""#).unwrap();
    static ref NUMERIC_ENTITY: Regex = Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").unwrap();

    // Pre-check before running the parser. Must accept every heading the parser accepts.
    static ref GERMAN_SECTION: Regex = Regex::new(
        r"(?m)^==[^=].*\{\{\s*Sprache\s*\|\s*Deutsch\s*[|}]|^==\s*Deutsch\s*==\s*$"
    )
    .unwrap();
}

const CHUNK_SIZE: usize = 1024 * 1024;
const READ_BUFFER: usize = 256 * 1024;

// ─────────────────────────────────────────────────────────────────────────────
// Page extraction
// ─────────────────────────────────────────────────────────────────────────────

/// One `<page>` element of the dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpPage {
    pub title: String,
    pub namespace: Option<u32>,
    pub redirect: bool,
    pub text: Option<String>,
}

impl DumpPage {
    /// Pull title, namespace, redirect flag and text out of a `<page>` element.
    /// `None` when the page has no title.
    pub fn from_xml(page_xml: &str) -> Option<Self> {
        let title = TITLE_PATTERN.captures(page_xml)?;
        Some(DumpPage {
            title: decode_entities(&title[1]).into_owned(),
            namespace: NS_PATTERN
                .captures(page_xml)
                .and_then(|cap| cap[1].parse().ok()),
            redirect: REDIRECT_PATTERN.is_match(page_xml),
            text: TEXT_PATTERN
                .captures(page_xml)
                .map(|cap| decode_entities(&cap[1]).into_owned()),
        })
    }

    pub fn is_article(&self) -> bool {
        self.namespace.unwrap_or(0) == 0
    }
}

/// Decode the XML entities the dump writer emits.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    let text = NUMERIC_ENTITY.replace_all(text, |cap: &regex::Captures| {
        let code = match cap[1].strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => cap[1].parse().ok(),
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| cap[0].to_string())
    });
    // &amp; last so "&amp;lt;" stays "&lt;"
    let text = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&");
    Cow::Owned(text)
}

/// Call `callback` with the raw XML of every `<page>` in order, until it
/// returns `false` or the input ends.
pub fn scan_pages(reader: impl BufRead, callback: impl FnMut(String) -> bool) -> io::Result<()> {
    scan_pages_chunked(reader, CHUNK_SIZE, callback)
}

fn scan_pages_chunked(
    mut reader: impl BufRead,
    chunk_size: usize,
    mut callback: impl FnMut(String) -> bool,
) -> io::Result<()> {
    let mut buffer = String::new();
    let mut pending: Vec<u8> = Vec::new();
    let mut chunk = vec![0u8; chunk_size];

    loop {
        let bytes_read = reader.read(&mut chunk)?;
        if bytes_read == 0 {
            break;
        }

        // A multi-byte character may be split across two reads
        pending.extend_from_slice(&chunk[..bytes_read]);
        let valid = match std::str::from_utf8(&pending) {
            Ok(_) => pending.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => pending.len(),
        };
        buffer.push_str(&String::from_utf8_lossy(&pending[..valid]));
        pending.drain(..valid);

        // Extract complete pages
        while let Some(start) = buffer.find("<page>") {
            if let Some(end_offset) = buffer[start..].find("</page>") {
                let end = start + end_offset + "</page>".len();
                let page_xml = buffer[start..end].to_string();
                buffer.drain(..end);

                if !callback(page_xml) {
                    return Ok(());
                }
            } else {
                buffer.drain(..start);
                break;
            }
        }

        if buffer.len() > 10 && !buffer.contains("<page>") {
            let mut keep_from = buffer.len() - 10;
            while !buffer.is_char_boundary(keep_from) {
                keep_from -= 1;
            }
            buffer.drain(..keep_from);
        }
    }

    Ok(())
}

/// Open a dump file, decompressing `.bz2` on the fly.
pub fn open_dump(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let reader: Box<dyn BufRead> = if path.to_string_lossy().ends_with(".bz2") {
        Box::new(BufReader::with_capacity(READ_BUFFER, BzDecoder::new(file)))
    } else {
        Box::new(BufReader::with_capacity(READ_BUFFER, file))
    };
    Ok(reader)
}

fn spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb
}

// ─────────────────────────────────────────────────────────────────────────────
// Dump fetcher
// ─────────────────────────────────────────────────────────────────────────────

/// Find the article page titled `word` in a dump stream.
pub fn find_page(reader: impl BufRead, word: &str, pb: &ProgressBar) -> io::Result<Option<Article>> {
    let mut found = None;
    let mut scanned = 0usize;

    scan_pages(reader, |page_xml| {
        scanned += 1;
        if scanned % 10_000 == 0 {
            pb.set_message(format!("Searching \"{}\" | Pages: {}", word, scanned));
        }
        let Some(page) = DumpPage::from_xml(&page_xml) else {
            return true;
        };
        if page.title != word || !page.is_article() || page.redirect {
            return true;
        }
        found = page.text.map(|text| Article::new(word, text));
        false
    })?;

    Ok(found)
}

/// Looks words up by scanning a local dump file from the start.
pub struct DumpFetcher {
    path: PathBuf,
    quiet: bool,
}

impl DumpFetcher {
    pub fn new(path: impl Into<PathBuf>, quiet: bool) -> Self {
        DumpFetcher {
            path: path.into(),
            quiet,
        }
    }
}

impl Fetcher for DumpFetcher {
    fn fetch(&self, word: &str) -> Result<Article, FetchError> {
        let word = normalize_headword(word);
        let reader = open_dump(&self.path)?;
        let pb = spinner(self.quiet);

        tracing::debug!(word = %word, dump = %self.path.display(), "scanning dump");
        let found = find_page(reader, &word, &pb)?;
        pb.finish_and_clear();

        found.ok_or(FetchError::NotFound { word })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Full dump scan
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Stop after this many entries have been written.
    pub limit: Option<usize>,
    /// Stop after this many pages have been read.
    pub page_limit: Option<usize>,
    pub quiet: bool,
}

#[derive(Debug, Default)]
pub struct ScanStats {
    pub pages_processed: usize,
    pub entries_written: usize,
    pub blocks_written: usize,
    pub special: usize,
    pub redirects: usize,
    pub non_german: usize,
    pub parse_failures: usize,
    pub skipped: usize,
    /// Blocks written per part of speech.
    pub by_pos: BTreeMap<String, usize>,
    pub elapsed: Duration,
}

/// Parse every German article of a dump, writing one JSON `WordEntry` per line.
pub fn run_scan(
    reader: impl BufRead,
    writer: &mut impl Write,
    parser: &Parser,
    options: &ScanOptions,
) -> io::Result<ScanStats> {
    let start_time = Instant::now();
    let mut stats = ScanStats::default();
    let pb = spinner(options.quiet);
    let mut limit_reached = false;
    let mut write_error: Option<io::Error> = None;

    scan_pages(reader, |page_xml| {
        if let Some(page_limit) = options.page_limit {
            if stats.pages_processed >= page_limit {
                return false;
            }
        }
        stats.pages_processed += 1;

        if stats.pages_processed % 1000 == 0 {
            let elapsed = start_time.elapsed().as_secs_f64();
            let rate = stats.pages_processed as f64 / elapsed;
            pb.set_message(format!(
                "Pages: {} | Entries: {} | Rate: {:.0} pg/s",
                stats.pages_processed, stats.entries_written, rate
            ));
        }

        let Some(page) = DumpPage::from_xml(&page_xml) else {
            stats.skipped += 1;
            return true;
        };
        if !page.is_article() {
            stats.special += 1;
            return true;
        }
        if page.redirect {
            stats.redirects += 1;
            return true;
        }
        let Some(text) = page.text else {
            stats.skipped += 1;
            return true;
        };
        if !GERMAN_SECTION.is_match(&text) {
            stats.non_german += 1;
            return true;
        }

        let article = Article::new(&page.title, text);
        let entry = match parser.parse(&article) {
            Ok(entry) => entry,
            Err(ParseError::LanguageNotPresent) => {
                stats.non_german += 1;
                return true;
            }
            Err(err) => {
                tracing::debug!(title = %page.title, error = %err, "page failed to parse");
                stats.parse_failures += 1;
                return true;
            }
        };

        let json = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(title = %page.title, error = %err, "failed to serialize entry");
                stats.skipped += 1;
                return true;
            }
        };
        if let Err(err) = writeln!(writer, "{}", json) {
            write_error = Some(err);
            return false;
        }

        stats.entries_written += 1;
        for block in &entry.blocks {
            stats.blocks_written += 1;
            *stats.by_pos.entry(block.pos.to_string()).or_default() += 1;
        }

        if let Some(limit) = options.limit {
            if stats.entries_written >= limit {
                limit_reached = true;
                return false;
            }
        }
        true
    })?;

    if let Some(err) = write_error {
        return Err(err);
    }
    writer.flush()?;

    match options.limit {
        Some(limit) if limit_reached => {
            pb.finish_with_message(format!("Reached limit of {} entries", limit));
        }
        _ => pb.finish_and_clear(),
    }

    stats.elapsed = start_time.elapsed();
    Ok(stats)
}

pub fn print_stats(stats: &ScanStats) {
    println!();
    println!("============================================================");
    println!("Pages processed: {}", stats.pages_processed);
    println!("Entries written: {}", stats.entries_written);
    println!("Blocks written: {}", stats.blocks_written);
    println!(
        "Avg blocks/entry: {:.2}",
        stats.blocks_written as f64 / stats.entries_written.max(1) as f64
    );
    println!("------------------------------------------------------------");
    println!("Parts of speech:");
    for (pos, count) in &stats.by_pos {
        println!("  {}: {}", pos, count);
    }
    println!("------------------------------------------------------------");
    println!("Special pages: {}", stats.special);
    println!("Redirects: {}", stats.redirects);
    println!("Non-German pages: {}", stats.non_german);
    println!("Parse failures: {}", stats.parse_failures);
    println!("Skipped: {}", stats.skipped);
    println!("Time: {}m {}s", stats.elapsed.as_secs() / 60, stats.elapsed.as_secs() % 60);
    println!(
        "Rate: {:.0} pages/sec",
        stats.pages_processed as f64 / stats.elapsed.as_secs_f64().max(f64::EPSILON)
    );
    println!("============================================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const DUMP: &str = r#"<mediawiki>
  <siteinfo><sitename>Wiktionary</sitename></siteinfo>
  <page>
    <title>Mann</title>
    <ns>0</ns>
    <revision><text bytes="120" xml:space="preserve">== Mann ({{Sprache|Deutsch}}) ==
=== {{Wortart|Substantiv|Deutsch}}, {{m}} ===
{{Bedeutungen}}
:[1] erwachsener &lt;b&gt;Mensch&lt;/b&gt; &amp; Gatte
</text></revision>
  </page>
  <page>
    <title>Hilfe:Formatvorlage</title>
    <ns>12</ns>
    <revision><text xml:space="preserve">== Deutsch ==</text></revision>
  </page>
  <page>
    <title>Männer</title>
    <ns>0</ns>
    <redirect title="Mann" />
    <revision><text xml:space="preserve">#WEITERLEITUNG [[Mann]]</text></revision>
  </page>
  <page>
    <title>man</title>
    <ns>0</ns>
    <revision><text xml:space="preserve">== man ({{Sprache|Englisch}}) ==
=== {{Wortart|Pronomen|Englisch}} ===
</text></revision>
  </page>
  <page>
    <title>Baum</title>
    <ns>0</ns>
    <revision><text xml:space="preserve">== Baum ({{Sprache|Deutsch}}) ==
=== {{Wortart|Substantiv|Deutsch}}, {{m}} ===
{{Bedeutungen}}
:[1] Holzgewächs
=== {{Wortart|Verb|Deutsch}} ===
{{Bedeutungen}}
:[1] sich aufbäumen
</text></revision>
  </page>
  <page>
    <title>Leer</title>
    <ns>0</ns>
    <revision><text xml:space="preserve">== Deutsch ==
nichts
</text></revision>
  </page>
</mediawiki>
"#;

    fn collect_pages(input: &str, chunk_size: usize) -> Vec<String> {
        let mut pages = Vec::new();
        scan_pages_chunked(Cursor::new(input.as_bytes()), chunk_size, |page| {
            pages.push(page);
            true
        })
        .unwrap();
        pages
    }

    #[test]
    fn extracts_all_pages() {
        let pages = collect_pages(DUMP, CHUNK_SIZE);
        assert_eq!(pages.len(), 6);
        assert!(pages[0].starts_with("<page>"));
        assert!(pages[0].ends_with("</page>"));
    }

    #[test]
    fn small_chunks_split_multibyte_text() {
        // Chunks of 7 bytes cut through "ä" in "Männer" at some point
        let pages = collect_pages(DUMP, 7);
        assert_eq!(pages, collect_pages(DUMP, CHUNK_SIZE));
        assert!(pages[2].contains("<title>Männer</title>"));
    }

    #[test]
    fn callback_can_stop_early() {
        let mut seen = 0;
        scan_pages(Cursor::new(DUMP.as_bytes()), |_| {
            seen += 1;
            seen < 2
        })
        .unwrap();
        assert_eq!(seen, 2);
    }

    #[test]
    fn page_fields() {
        let pages = collect_pages(DUMP, CHUNK_SIZE);
        let mann = DumpPage::from_xml(&pages[0]).unwrap();
        assert_eq!(mann.title, "Mann");
        assert_eq!(mann.namespace, Some(0));
        assert!(!mann.redirect);
        assert!(mann.text.unwrap().contains("erwachsener <b>Mensch</b> & Gatte"));

        let help = DumpPage::from_xml(&pages[1]).unwrap();
        assert!(!help.is_article());

        let redirect = DumpPage::from_xml(&pages[2]).unwrap();
        assert!(redirect.redirect);
    }

    #[test]
    fn entities() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;ref&gt;"), "<ref>");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
        assert_eq!(decode_entities("&#228;&#xE4;"), "ää");
        assert_eq!(decode_entities("&quot;x&apos;"), "\"x'");
        assert!(matches!(decode_entities("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn finds_page_by_title() {
        let pb = ProgressBar::hidden();
        let article = find_page(Cursor::new(DUMP.as_bytes()), "Baum", &pb)
            .unwrap()
            .unwrap();
        assert_eq!(article.headword(), "Baum");
        assert!(article.wikitext().contains("Holzgewächs"));

        // Redirects and other namespaces do not count as hits
        assert!(find_page(Cursor::new(DUMP.as_bytes()), "Männer", &pb).unwrap().is_none());
        assert!(find_page(Cursor::new(DUMP.as_bytes()), "Hilfe:Formatvorlage", &pb)
            .unwrap()
            .is_none());
        assert!(find_page(Cursor::new(DUMP.as_bytes()), "Frau", &pb).unwrap().is_none());
    }

    #[test]
    fn missing_dump_is_io_error() {
        let fetcher = DumpFetcher::new("/nonexistent/dewiktionary.xml.bz2", true);
        assert!(matches!(fetcher.fetch("Mann"), Err(FetchError::Io(_))));
    }

    #[test]
    fn scan_writes_german_entries() {
        let options = ScanOptions {
            quiet: true,
            ..Default::default()
        };
        let mut out = Vec::new();
        let stats = run_scan(Cursor::new(DUMP.as_bytes()), &mut out, &Parser::default(), &options).unwrap();

        assert_eq!(stats.pages_processed, 6);
        assert_eq!(stats.entries_written, 2);
        assert_eq!(stats.blocks_written, 3);
        assert_eq!(stats.special, 1);
        assert_eq!(stats.redirects, 1);
        assert_eq!(stats.non_german, 1);
        assert_eq!(stats.parse_failures, 1);
        assert_eq!(stats.by_pos.get("noun"), Some(&2));
        assert_eq!(stats.by_pos.get("verb"), Some(&1));

        let output = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["headword"], "Mann");
        assert_eq!(
            first["blocks"][0]["definitions"][0]["text"],
            "erwachsener Mensch & Gatte"
        );
    }

    #[test]
    fn scan_accepts_every_german_heading_the_parser_accepts() {
        let page = |title: &str, heading: &str| {
            format!(
                "<page><title>{title}</title><ns>0</ns><revision><text>{heading}\n=== Substantiv ===\n{{{{Bedeutungen}}}}\n:[1] x\n</text></revision></page>\n"
            )
        };
        let input = format!(
            "<mediawiki>\n{}{}{}</mediawiki>\n",
            page("Mann", "== Mann {{Sprache|Deutsch}} =="),
            page("X", "== X ({{Sprache|Deutsch}}) extra =="),
            page("Y", "== Y ({{ Sprache | Deutsch }}) =="),
        );
        let options = ScanOptions {
            quiet: true,
            ..Default::default()
        };
        let mut out = Vec::new();
        let stats = run_scan(Cursor::new(input.into_bytes()), &mut out, &Parser::default(), &options).unwrap();
        assert_eq!(stats.non_german, 0);
        assert_eq!(stats.entries_written, 3);
    }

    #[test]
    fn scan_limits() {
        let options = ScanOptions {
            limit: Some(1),
            quiet: true,
            ..Default::default()
        };
        let mut out = Vec::new();
        let stats = run_scan(Cursor::new(DUMP.as_bytes()), &mut out, &Parser::default(), &options).unwrap();
        assert_eq!(stats.entries_written, 1);
        assert_eq!(stats.pages_processed, 1);

        let options = ScanOptions {
            page_limit: Some(3),
            quiet: true,
            ..Default::default()
        };
        let mut out = Vec::new();
        let stats = run_scan(Cursor::new(DUMP.as_bytes()), &mut out, &Parser::default(), &options).unwrap();
        assert_eq!(stats.pages_processed, 3);
        assert_eq!(stats.entries_written, 1);
    }
}
