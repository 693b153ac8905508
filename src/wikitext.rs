//! Wikitext segmentation: headings, template invocations and inline markup.
//!
//! This is not a general MediaWiki engine. It understands just enough of the
//! syntax used by German Wiktionary entries: `== ... ==` headings, flat
//! `{{name|key=value|...}}` templates and `[[target|display]]` links.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::WikitextError;

lazy_static! {
    static ref HTML_COMMENT: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref REF_TAG: Regex = Regex::new(r"(?s)<ref[^>/]*/>|<ref[^>]*>.*?</ref>").unwrap();
    static ref HTML_TAG: Regex = Regex::new(r"</?[a-zA-Z][^>]*>").unwrap();
    static ref WIKILINK: Regex = Regex::new(r"\[\[([^\[\]]*)\]\]").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Headings this deep never start a new section; they stay in the parent body.
pub const MAX_SECTION_LEVEL: usize = 4;

/// Templates nested deeper than this are rejected instead of recursed into.
pub const MAX_TEMPLATE_DEPTH: usize = 64;

// ─────────────────────────────────────────────────────────────────────────────
// Headings and sections
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Number of `=` on the shorter side.
    pub level: usize,
    pub title: String,
    /// Byte offset of the first `=`.
    pub start: usize,
    /// Byte offset just past the heading line, newline included.
    pub end: usize,
}

/// A heading plus the text it governs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    pub level: usize,
    pub title: String,
    pub body: &'a str,
    /// Byte offset of the heading in the scanned text.
    pub offset: usize,
}

/// Parse a single line as a heading, e.g. `=== {{Wortart|Verb|Deutsch}} ===`.
pub fn parse_heading_line(line: &str) -> Option<(usize, &str)> {
    let line = line.trim_end();
    let leading = line.chars().take_while(|&c| c == '=').count();
    if leading < 2 {
        return None;
    }
    let trailing = line.chars().rev().take_while(|&c| c == '=').count();
    // "====" alone has no title between the runs
    if trailing == 0 || leading + trailing >= line.len() {
        return None;
    }
    let title = line[leading..line.len() - trailing].trim();
    Some((leading.min(trailing), title))
}

/// All headings of level 2 and deeper, in source order.
pub fn headings(text: &str) -> Vec<Heading> {
    let mut result = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if let Some((level, title)) = parse_heading_line(line) {
            result.push(Heading {
                level,
                title: title.to_string(),
                start: offset,
                end: offset + line.len(),
            });
        }
        offset += line.len();
    }
    result
}

/// Sections whose heading is exactly `level` deep.
///
/// Each body runs to the next heading of equal or lesser depth; headings
/// deeper than [`MAX_SECTION_LEVEL`] are never boundaries.
pub fn sections_at(text: &str, level: usize) -> Vec<Section<'_>> {
    let all = headings(text);
    let mut sections = Vec::new();

    for (i, heading) in all.iter().enumerate() {
        if heading.level != level {
            continue;
        }
        let end = all[i + 1..]
            .iter()
            .find(|h| h.level <= level && h.level <= MAX_SECTION_LEVEL)
            .map(|h| h.start)
            .unwrap_or(text.len());
        sections.push(Section {
            level,
            title: heading.title.clone(),
            body: &text[heading.end..end],
            offset: heading.start,
        });
    }

    sections
}

// ─────────────────────────────────────────────────────────────────────────────
// Templates
// ─────────────────────────────────────────────────────────────────────────────

/// One `|`-separated argument of a template invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateArg {
    /// `Some` for `key=value` arguments, `None` for positional ones.
    pub name: Option<String>,
    pub value: String,
}

/// A parsed `{{name|arg|key=value}}` invocation.
///
/// Nested templates inside an argument are kept verbatim as opaque text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub args: Vec<TemplateArg>,
    /// Byte offset of the opening `{{`.
    pub start: usize,
    /// Byte offset just past the closing `}}`.
    pub end: usize,
}

impl Template {
    pub fn positional(&self) -> impl Iterator<Item = &str> {
        self.args
            .iter()
            .filter(|a| a.name.is_none())
            .map(|a| a.value.as_str())
    }

    pub fn named(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|a| a.name.as_deref() == Some(name))
            .map(|a| a.value.as_str())
    }
}

/// Recursive descent tokenizer for template invocations.
/// Uses the call stack for nesting, capped at [`MAX_TEMPLATE_DEPTH`].
struct Tokenizer<'a> {
    text: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(text: &'a str, pos: usize) -> Self {
        Tokenizer { text, pos, depth: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn consume_char(&mut self) -> Option<char> {
        let c = self.rest().chars().next()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    // ─────────────────────────────────────────────────────────────
    // template ::= "{{" arg ("|" arg)* "}}"
    // ─────────────────────────────────────────────────────────────
    fn parse_template(&mut self) -> Result<Template, WikitextError> {
        let start = self.pos;
        if self.depth >= MAX_TEMPLATE_DEPTH {
            return Err(WikitextError::NestingTooDeep { offset: start });
        }
        self.depth += 1;
        let template = self.parse_template_body(start);
        self.depth -= 1;
        template
    }

    fn parse_template_body(&mut self, start: usize) -> Result<Template, WikitextError> {
        self.pos += 2; // consume "{{"

        let mut raw_args = Vec::new();
        loop {
            raw_args.push(self.parse_raw_arg(start)?);
            if self.starts_with("|") {
                self.pos += 1;
            } else if self.starts_with("}}") {
                self.pos += 2;
                break;
            } else {
                return Err(WikitextError::UnbalancedTemplate { offset: start });
            }
        }

        let mut raw_args = raw_args.into_iter();
        let name = raw_args.next().unwrap_or_default().trim().to_string();
        let args = raw_args.map(|raw| split_named_arg(&raw)).collect();

        Ok(Template {
            name,
            args,
            start,
            end: self.pos,
        })
    }

    // ─────────────────────────────────────────────────────────────
    // arg ::= (template | link | char)*  (terminated by "|" or "}}")
    // ─────────────────────────────────────────────────────────────
    fn parse_raw_arg(&mut self, template_start: usize) -> Result<String, WikitextError> {
        let mut result = String::new();
        while !self.at_end() && !self.starts_with("|") && !self.starts_with("}}") {
            if self.starts_with("{{") {
                let nested_start = self.pos;
                self.parse_template()?; // RECURSIVE - kept as opaque text
                result.push_str(&self.text[nested_start..self.pos]);
            } else if self.starts_with("[[") {
                match self.scan_link() {
                    Some(link) => result.push_str(link),
                    None => {
                        result.push_str("[[");
                        self.pos += 2;
                    }
                }
            } else if let Some(c) = self.consume_char() {
                result.push(c);
            }
        }
        if self.at_end() {
            return Err(WikitextError::UnbalancedTemplate {
                offset: template_start,
            });
        }
        Ok(result)
    }

    /// Consume a `[[...]]` link if it closes before the enclosing template does.
    fn scan_link(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let close = rest.find("]]")?;
        if rest[2..close].contains("}}") || rest[2..close].contains("[[") {
            return None;
        }
        let link = &rest[..close + 2];
        self.pos += close + 2;
        Some(link)
    }
}

/// Split `key = value` on the first `=` that is not inside nested markup.
fn split_named_arg(raw: &str) -> TemplateArg {
    if let Some(eq) = raw.find('=') {
        let key = &raw[..eq];
        if !key.contains("{{") && !key.contains("[[") {
            return TemplateArg {
                name: Some(key.trim().to_string()),
                value: raw[eq + 1..].trim().to_string(),
            };
        }
    }
    TemplateArg {
        name: None,
        value: raw.trim().to_string(),
    }
}

/// Every top-level template invocation in `text`, in order.
///
/// An opening `{{` with no matching `}}` is an error rather than being read as text.
pub fn find_templates(text: &str) -> Result<Vec<Template>, WikitextError> {
    let mut templates = Vec::new();
    let mut pos = 0;
    while let Some(found) = text[pos..].find("{{") {
        let mut tokenizer = Tokenizer::new(text, pos + found);
        let template = tokenizer.parse_template()?;
        pos = template.end;
        templates.push(template);
    }
    Ok(templates)
}

/// Parse the template whose `{{` starts at byte `offset` of `text`, ignoring
/// anything after its closing `}}`. `None` if `offset` is not at a `{{`.
pub fn template_at(text: &str, offset: usize) -> Result<Option<Template>, WikitextError> {
    if !text.get(offset..).is_some_and(|rest| rest.starts_with("{{")) {
        return Ok(None);
    }
    Tokenizer::new(text, offset).parse_template().map(Some)
}

/// Parse a single template that spans the whole of `text` (surrounding whitespace allowed).
pub fn parse_template(text: &str) -> Result<Option<Template>, WikitextError> {
    let trimmed = text.trim();
    if !trimmed.starts_with("{{") {
        return Ok(None);
    }
    let template = Tokenizer::new(trimmed, 0).parse_template()?;
    if template.end != trimmed.len() {
        return Ok(None);
    }
    Ok(Some(template))
}

// ─────────────────────────────────────────────────────────────────────────────
// Links and inline markup
// ─────────────────────────────────────────────────────────────────────────────

/// Parsed wikilink: [[target#anchor|display]]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wikilink {
    pub target: String,
    pub anchor: Option<String>,
    pub display: Option<String>,
}

impl Wikilink {
    /// Parse the inside of `[[...]]`.
    pub fn parse(inner: &str) -> Self {
        let (link, display) = match inner.split_once('|') {
            Some((link, display)) => (link, Some(display.trim().to_string())),
            None => (inner, None),
        };
        let (target, anchor) = match link.split_once('#') {
            Some((target, anchor)) => (target, Some(anchor.trim().to_string())),
            None => (link, None),
        };
        Wikilink {
            target: target.trim().trim_start_matches(':').to_string(),
            anchor,
            display: display.filter(|d| !d.is_empty()),
        }
    }

    /// Display text if present, otherwise the target without namespace prefix.
    pub fn text(&self) -> &str {
        match &self.display {
            Some(display) => display,
            None => self.target.rsplit(':').next().unwrap_or(&self.target),
        }
    }
}

/// All wikilinks in `text`, in order.
pub fn wikilinks(text: &str) -> Vec<Wikilink> {
    WIKILINK
        .captures_iter(text)
        .map(|cap| Wikilink::parse(&cap[1]))
        .collect()
}

/// Strip inline formatting: bold/italic quotes, links (keeping display text),
/// references, comments and HTML tags. Templates are left in place.
pub fn strip_markup(text: &str) -> String {
    let text = HTML_COMMENT.replace_all(text, "");
    let text = REF_TAG.replace_all(&text, "");
    let text = WIKILINK.replace_all(&text, |cap: &regex::Captures| {
        Wikilink::parse(&cap[1]).text().to_string()
    });
    let text = text.replace("'''", "").replace("''", "");
    let text = HTML_TAG.replace_all(&text, "");
    let text = text.replace("&nbsp;", " ");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod heading_tests {
    use super::*;

    #[test]
    fn heading_levels() {
        assert_eq!(parse_heading_line("== Deutsch =="), Some((2, "Deutsch")));
        assert_eq!(parse_heading_line("=== Substantiv ===\n"), Some((3, "Substantiv")));
        assert_eq!(
            parse_heading_line("==== {{Übersetzungen}} ===="),
            Some((4, "{{Übersetzungen}}"))
        );
    }

    #[test]
    fn uneven_runs_use_shorter_side() {
        assert_eq!(parse_heading_line("=== Verb =="), Some((2, "Verb")));
    }

    #[test]
    fn not_headings() {
        assert_eq!(parse_heading_line("= Titel ="), None);
        assert_eq!(parse_heading_line("===="), None);
        assert_eq!(parse_heading_line(":[1] a == b"), None);
        assert_eq!(parse_heading_line("== offen"), None);
    }

    #[test]
    fn heading_offsets_are_bytes() {
        let text = "ä\n== Deutsch ==\nText\n";
        let found = headings(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start, 3);
        assert_eq!(&text[found[0].end..], "Text\n");
    }

    #[test]
    fn sections_stop_at_same_or_higher_level() {
        let text = "== A ==\na\n=== B ===\nb\n== C ==\nc\n";
        let top = sections_at(text, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].title, "A");
        assert_eq!(top[0].body, "a\n=== B ===\nb\n");
        assert_eq!(top[1].body, "c\n");

        let sub = sections_at(text, 3);
        assert_eq!(sub.len(), 1);
        assert_eq!(sub[0].body, "b\n");
    }

    #[test]
    fn deep_headings_stay_in_parent() {
        let text = "=== A ===\na\n===== tief =====\nx\n=== B ===\nb";
        let sections = sections_at(text, 3);
        assert_eq!(sections.len(), 2);
        assert!(sections[0].body.contains("tief"));
        assert_eq!(sections[1].body, "b");
    }

    #[test]
    fn no_headings_no_sections() {
        assert!(sections_at("nur Text\n:[1] etwas", 2).is_empty());
        assert!(sections_at("", 2).is_empty());
    }
}

#[cfg(test)]
mod template_tests {
    use super::*;

    #[test]
    fn simple_named_params() {
        let templates = find_templates("{{Deklination|Nominativ Singular=Beispiel|Nominativ Plural=Beispiele}}").unwrap();
        assert_eq!(templates.len(), 1);
        let t = &templates[0];
        assert_eq!(t.name, "Deklination");
        assert_eq!(t.named("Nominativ Singular"), Some("Beispiel"));
        assert_eq!(t.named("Nominativ Plural"), Some("Beispiele"));
    }

    #[test]
    fn whitespace_trimmed_around_equals() {
        let text = "{{Deutsch Substantiv Übersicht\n|Genus = m\n|Nominativ Singular= Mann \n}}";
        let t = &find_templates(text).unwrap()[0];
        assert_eq!(t.name, "Deutsch Substantiv Übersicht");
        assert_eq!(t.named("Genus"), Some("m"));
        assert_eq!(t.named("Nominativ Singular"), Some("Mann"));
    }

    #[test]
    fn positional_params() {
        let t = &find_templates("{{Wortart|Substantiv|Deutsch}}").unwrap()[0];
        let positional: Vec<&str> = t.positional().collect();
        assert_eq!(positional, vec!["Substantiv", "Deutsch"]);
    }

    #[test]
    fn no_args() {
        let t = &find_templates("{{Bedeutungen}}").unwrap()[0];
        assert_eq!(t.name, "Bedeutungen");
        assert!(t.args.is_empty());
    }

    #[test]
    fn nested_template_kept_opaque() {
        let t = &find_templates("{{Ü|en|man {{m}}|x=a{{b|c}}d}}").unwrap()[0];
        assert_eq!(t.args[1].value, "man {{m}}");
        assert_eq!(t.named("x"), Some("a{{b|c}}d"));
    }

    #[test]
    fn pipe_inside_link_is_not_a_separator() {
        let t = &find_templates("{{K|[[Religion|religiös]]|ugs.}}").unwrap()[0];
        let positional: Vec<&str> = t.positional().collect();
        assert_eq!(positional, vec!["[[Religion|religiös]]", "ugs."]);
    }

    #[test]
    fn equals_inside_nested_value_is_positional() {
        let t = &find_templates("{{Ü|{{x|a=b}}}}").unwrap()[0];
        assert_eq!(t.args[0].name, None);
        assert_eq!(t.args[0].value, "{{x|a=b}}");
    }

    #[test]
    fn several_templates_in_order_with_offsets() {
        let text = "a {{m}}, {{Wortart|Verb|Deutsch}} b";
        let templates = find_templates(text).unwrap();
        let names: Vec<&str> = templates.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["m", "Wortart"]);
        assert_eq!(&text[templates[0].start..templates[0].end], "{{m}}");
    }

    #[test]
    fn unclosed_template() {
        let err = find_templates("x {{Deklination|Nominativ Singular=Beispiel").unwrap_err();
        assert_eq!(err, WikitextError::UnbalancedTemplate { offset: 2 });
    }

    #[test]
    fn unclosed_nested_template() {
        assert!(find_templates("{{a|{{b|c}}").is_err());
    }

    #[test]
    fn deep_nesting_is_an_error() {
        let text = "{{".repeat(200_000);
        assert_eq!(
            find_templates(&text).unwrap_err(),
            WikitextError::NestingTooDeep {
                offset: 2 * MAX_TEMPLATE_DEPTH
            }
        );

        let closed = format!("{}x{}", "{{a|".repeat(MAX_TEMPLATE_DEPTH), "}}".repeat(MAX_TEMPLATE_DEPTH));
        assert_eq!(find_templates(&closed).unwrap().len(), 1);
    }

    #[test]
    fn template_at_offset() {
        let text = "{{K|kaputt\n{{Deklination|Nominativ Singular=Beispiel}} {{a";
        let start = text.find("{{Deklination").unwrap();
        let t = template_at(text, start).unwrap().unwrap();
        assert_eq!(t.name, "Deklination");
        assert_eq!(t.named("Nominativ Singular"), Some("Beispiel"));
        assert!(template_at(text, 1).unwrap().is_none());
        assert!(template_at(text, 0).is_err());
    }

    #[test]
    fn stray_closing_braces_ignored() {
        assert!(find_templates("}} text ]]").unwrap().is_empty());
    }

    #[test]
    fn unclosed_link_inside_template_is_text() {
        let t = &find_templates("{{a|[[b}}").unwrap()[0];
        assert_eq!(t.args[0].value, "[[b");
    }

    #[test]
    fn multibyte_values() {
        let t = &find_templates("{{Deklination|Nominativ Plural=Bäume|Dativ Plural=Bäumen}}").unwrap()[0];
        assert_eq!(t.named("Nominativ Plural"), Some("Bäume"));
        assert_eq!(t.named("Dativ Plural"), Some("Bäumen"));
    }

    #[test]
    fn parse_whole_template() {
        assert!(parse_template("  {{Bedeutungen}} ").unwrap().is_some());
        assert!(parse_template("{{Bedeutungen}} mehr").unwrap().is_none());
        assert!(parse_template(":[1] x").unwrap().is_none());
        assert!(parse_template("{{Bedeutungen").is_err());
    }
}
