//! German Wiktionary entry parser.
//!
//! Page layout (see <https://de.wiktionary.org/wiki/Hilfe:Formatvorlage>):
//!
//! ```text
//! == Mann ({{Sprache|Deutsch}}) ==
//! === {{Wortart|Substantiv|Deutsch}}, {{m}} ===
//! {{Deutsch Substantiv Übersicht
//! |Genus=m
//! |Nominativ Singular=Mann
//! ...}}
//! {{Bedeutungen}}
//! :[1] erwachsener, männlicher Mensch
//! ==== {{Übersetzungen}} ====
//! *{{en}}: [1] {{Ü|en|man}}
//! ```
//!
//! The stages run in order: language section, part-of-speech blocks, then
//! definitions, inflection table, translations and form-of references per block.

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::{Mode, ParserConfig};
use crate::error::ParseError;
use crate::inflection::{Gender, InflectionFamily, InflectionTable};
use crate::model::{
    Article, Definition, DefinitionKind, Diagnostic, FormOf, LanguageSection, PartOfSpeech,
    PartOfSpeechBlock, Translation, WordEntry,
};
use crate::wikitext::{
    self, find_templates, parse_template, strip_markup, template_at, wikilinks, Template,
};

lazy_static! {
    /// `siehe Beispiel`, `→ Beispiel`, `siehe auch: Beispiel` after markup stripping.
    static ref REFERENCE_TEXT: Regex =
        Regex::new(r"(?i)^(?:siehe|→)\s*(?:auch)?\s*:?\s*(.+?)\s*[.;]?$").unwrap();
    /// `*{{en}}: [1] {{Ü|en|man}}`
    static ref TRANSLATION_LINE: Regex = Regex::new(r"^\*+\s*\{\{([a-z][a-z-]*)\}\}\s*:\s*(.*)$").unwrap();
    /// Sense marker `[1]` or `[1, 2]`. Matches inside `[[link]]` are filtered out by the caller.
    static ref SENSE_MARKER: Regex = Regex::new(r"\[([^\[\]]+)\]").unwrap();
    /// `* 1. Person Singular Präsens des Verbs '''[[gehen]]'''`
    static ref FORM_OF_LINE: Regex =
        Regex::new(r"^\*+\s*(.+?)\s*'''\s*\[\[([^\]|#]+)(?:[#|][^\]]*)?\]\]\s*'''").unwrap();
}

const DEFINITIONS_MARKER: &str = "Bedeutungen";
const TRANSLATIONS_MARKER: &str = "Übersetzungen";

/// Raw text of one part-of-speech block inside the German section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosSegment<'a> {
    pub pos: PartOfSpeech,
    pub categories: Vec<String>,
    pub genders: Vec<Gender>,
    pub heading: String,
    pub body: &'a str,
}

#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    pub fn new(config: ParserConfig) -> Self {
        Parser { config }
    }

    pub fn strict() -> Self {
        Parser::new(ParserConfig::strict())
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    fn is_strict(&self) -> bool {
        self.config.mode == Mode::Strict
    }

    /// The first German section of the page.
    pub fn locate_language_section<'a>(
        &self,
        article: &'a Article,
    ) -> Result<LanguageSection<'a>, ParseError> {
        german_sections(article.wikitext())
            .into_iter()
            .next()
            .ok_or(ParseError::LanguageNotPresent)
    }

    /// Split a German section at its level-3 part-of-speech headings.
    pub fn split_pos_blocks<'a>(
        &self,
        section: &LanguageSection<'a>,
    ) -> Result<Vec<PosSegment<'a>>, ParseError> {
        let mut segments = Vec::new();

        for sub in wikitext::sections_at(section.body, 3) {
            match classify_pos_heading(&sub.title) {
                Some((pos, categories, genders)) => segments.push(PosSegment {
                    pos,
                    categories,
                    genders,
                    heading: sub.title.clone(),
                    body: sub.body,
                }),
                None if self.is_strict() => {
                    return Err(ParseError::failure(
                        "split_pos_blocks",
                        format!("unrecognized heading \"{}\"", sub.title),
                    ));
                }
                None => {
                    tracing::warn!(heading = %sub.title, "skipping unrecognized heading");
                }
            }
        }

        if segments.is_empty() {
            return Err(ParseError::NoPartOfSpeechFound);
        }
        Ok(segments)
    }

    /// Numbered senses after the `{{Bedeutungen}}` marker, in source order.
    ///
    /// A malformed sense is skipped in lenient mode and fails the stage in strict mode.
    pub fn extract_definitions(&self, segment: &PosSegment<'_>) -> Result<Vec<Definition>, ParseError> {
        let (definitions, failures) = self.collect_definitions(segment);
        self.first_failure_if_strict(failures)?;
        Ok(definitions)
    }

    fn collect_definitions(&self, segment: &PosSegment<'_>) -> (Vec<Definition>, Vec<ParseError>) {
        let mut definitions = Vec::new();
        let mut failures = Vec::new();
        let mut in_list = false;

        for line in segment.body.lines() {
            let line = line.trim();
            if !in_list {
                in_list = is_marker_line(line, DEFINITIONS_MARKER);
                continue;
            }
            if line.starts_with("{{") || line.starts_with('=') {
                break;
            }
            let Some(item) = line.strip_prefix(':') else {
                continue;
            };
            let item = item.trim_start_matches(':').trim();
            let Some((number, rest)) = split_sense_number(item) else {
                continue;
            };
            match parse_definition(number, rest) {
                Ok(Some(definition)) => definitions.push(definition),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(sense = number, error = %e, "skipping malformed sense");
                    failures.push(e.at_stage("extract_definitions"));
                }
            }
        }

        (definitions, failures)
    }

    fn first_failure_if_strict(&self, failures: Vec<ParseError>) -> Result<(), ParseError> {
        match failures.into_iter().next() {
            Some(err) if self.is_strict() => Err(err),
            _ => Ok(()),
        }
    }

    /// The block's inflection table, or `None` when it has no inflection template.
    pub fn extract_inflection(
        &self,
        segment: &PosSegment<'_>,
    ) -> Result<Option<InflectionTable>, ParseError> {
        // Only the inflection template itself is tokenized, so broken markup
        // elsewhere in the block does not hide an intact table.
        let Some((start, template_family)) = segment.body.match_indices("{{").find_map(|(start, _)| {
            let rest = &segment.body[start + 2..];
            let name_end = rest.find(['|', '}', '{']).unwrap_or(rest.len());
            InflectionFamily::from_template_name(&rest[..name_end]).map(|family| (start, family))
        }) else {
            return Ok(None);
        };
        let Some(template) =
            template_at(segment.body, start).map_err(|e| e.at_stage("extract_inflection"))?
        else {
            return Ok(None);
        };

        let family = segment
            .pos
            .inflection_family()
            .or(template_family)
            .unwrap_or(InflectionFamily::Noun);
        let table = InflectionTable::from_template(&template, family);

        if self.is_strict() {
            if let Some(name) = table.unrecognized.first() {
                return Err(ParseError::failure(
                    "extract_inflection",
                    format!("unrecognized parameter \"{}\"", name),
                ));
            }
        }
        Ok(Some(table))
    }

    /// Translations from the `{{Übersetzungen}}` sub-section, filtered by language.
    pub fn extract_translations(&self, segment: &PosSegment<'_>) -> Result<Vec<Translation>, ParseError> {
        let (translations, failures) = self.collect_translations(segment);
        self.first_failure_if_strict(failures)?;
        Ok(translations)
    }

    fn collect_translations(&self, segment: &PosSegment<'_>) -> (Vec<Translation>, Vec<ParseError>) {
        let mut translations = Vec::new();
        let mut failures = Vec::new();

        for section in wikitext::sections_at(segment.body, 4) {
            if !section.title.contains(TRANSLATIONS_MARKER) {
                continue;
            }
            for line in section.body.lines() {
                let Some(cap) = TRANSLATION_LINE.captures(line.trim()) else {
                    continue;
                };
                let language = &cap[1];
                if !self.config.translation_languages.iter().any(|l| l == language) {
                    continue;
                }
                let rest = cap.get(2).map(|m| m.as_str()).unwrap_or_default();
                match translations_in_line(language, rest) {
                    Ok(found) => translations.extend(found),
                    Err(e) => {
                        tracing::warn!(language, error = %e, "skipping malformed translation line");
                        failures.push(e.at_stage("extract_translations"));
                    }
                }
            }
        }

        (translations, failures)
    }

    /// Lemma references of an inflected-form block.
    pub fn extract_form_of(&self, segment: &PosSegment<'_>) -> Vec<FormOf> {
        segment
            .body
            .lines()
            .filter_map(|line| FORM_OF_LINE.captures(line.trim()))
            .map(|cap| FormOf {
                description: strip_markup(&cap[1]),
                lemma: cap[2].trim().to_string(),
            })
            .collect()
    }

    /// Parse a whole page into a `WordEntry`.
    ///
    /// In lenient mode a failing stage inside one block is recorded as a
    /// diagnostic and the rest of the block is kept. The failure only
    /// propagates when nothing at all could be extracted.
    pub fn parse(&self, article: &Article) -> Result<WordEntry, ParseError> {
        let sections = german_sections(article.wikitext());
        if sections.is_empty() {
            tracing::debug!(word = article.headword(), "no German section");
            return Err(ParseError::LanguageNotPresent);
        }

        let mut entry = WordEntry {
            headword: article.headword().to_string(),
            lemma: sections.iter().find_map(|s| s.lemma.clone()),
            blocks: Vec::new(),
            diagnostics: Vec::new(),
        };
        let mut first_failure: Option<ParseError> = None;

        let mut segments = Vec::new();
        for section in &sections {
            match self.split_pos_blocks(section) {
                Ok(found) => segments.extend(found),
                Err(err) if self.is_strict() || sections.len() == 1 => return Err(err),
                Err(err) => {
                    tracing::warn!(heading = %section.heading, error = %err, "German section without blocks");
                    entry.diagnostics.push(Diagnostic {
                        stage: err.stage().to_string(),
                        reason: err.to_string(),
                        block: None,
                    });
                }
            }
        }
        if segments.is_empty() {
            return Err(ParseError::NoPartOfSpeechFound);
        }

        for segment in &segments {
            let index = entry.blocks.len();
            let mut block = PartOfSpeechBlock::new(segment.pos);
            block.categories = segment.categories.clone();
            block.genders = segment.genders.clone();

            let mut record = |err: ParseError, entry: &mut WordEntry| -> Result<(), ParseError> {
                if self.is_strict() {
                    return Err(err);
                }
                tracing::warn!(block = index, pos = %segment.pos, error = %err, "recovered stage failure");
                entry.diagnostics.push(Diagnostic {
                    stage: err.stage().to_string(),
                    reason: match &err {
                        ParseError::ParseFailure { reason, .. } => reason.clone(),
                        other => other.to_string(),
                    },
                    block: Some(index),
                });
                first_failure.get_or_insert(err);
                Ok(())
            };

            let (definitions, failures) = self.collect_definitions(segment);
            block.definitions = definitions;
            for err in failures {
                record(err, &mut entry)?;
            }
            match self.extract_inflection(segment) {
                Ok(inflection) => block.inflection = inflection,
                Err(err) => record(err, &mut entry)?,
            }
            let (translations, failures) = self.collect_translations(segment);
            block.translations = translations;
            for err in failures {
                record(err, &mut entry)?;
            }
            block.form_of = self.extract_form_of(segment);

            tracing::debug!(
                pos = %block.pos,
                definitions = block.definitions.len(),
                inflection = block.inflection.is_some(),
                "parsed block"
            );
            entry.blocks.push(block);
        }

        let extracted_anything = entry.blocks.iter().any(|b| {
            !b.definitions.is_empty()
                || b.inflection.is_some()
                || !b.translations.is_empty()
                || !b.form_of.is_empty()
        });
        if let Some(err) = first_failure {
            if !extracted_anything {
                return Err(err);
            }
        }

        Ok(entry)
    }
}

/// Parse with the default (lenient) configuration.
pub fn parse(article: &Article) -> Result<WordEntry, ParseError> {
    Parser::default().parse(article)
}

// ─────────────────────────────────────────────────────────────────────────────
// Stage helpers
// ─────────────────────────────────────────────────────────────────────────────

/// All German level-2 sections of a page, in page order.
fn german_sections(text: &str) -> Vec<LanguageSection<'_>> {
    wikitext::sections_at(text, 2)
        .into_iter()
        .filter_map(|section| {
            let lemma = german_heading_lemma(&section.title)?;
            Some(LanguageSection {
                heading: section.title,
                lemma,
                body: section.body,
            })
        })
        .collect()
}

/// `Some(lemma)` if the heading marks a German section. A bare `Deutsch`
/// heading names no lemma.
fn german_heading_lemma(title: &str) -> Option<Option<String>> {
    if title.trim() == "Deutsch" {
        return Some(None);
    }
    let templates = find_templates(title).ok()?;
    let sprache = templates
        .iter()
        .find(|t| t.name == "Sprache" && t.positional().next() == Some("Deutsch"))?;

    let before = title[..sprache.start].trim().trim_end_matches('(').trim();
    let lemma = strip_markup(before);
    Some(if lemma.is_empty() { None } else { Some(lemma) })
}

/// Part of speech, Wortart names and genders from a level-3 heading.
fn classify_pos_heading(title: &str) -> Option<(PartOfSpeech, Vec<String>, Vec<Gender>)> {
    let templates: Vec<Template> = find_templates(title).unwrap_or_default();

    let mut categories: Vec<String> = templates
        .iter()
        .filter(|t| t.name == "Wortart")
        .filter_map(|t| t.positional().next())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();

    if categories.is_empty() {
        // Bare headings such as `=== Substantiv ===`
        categories = strip_markup(title)
            .split(',')
            .map(str::trim)
            .filter(|name| PartOfSpeech::from_wortart(name).is_some())
            .map(str::to_string)
            .collect();
        if categories.is_empty() {
            return None;
        }
    }

    let pos = categories
        .iter()
        .find_map(|name| PartOfSpeech::from_wortart(name))
        .unwrap_or(PartOfSpeech::Other);
    let genders = templates
        .iter()
        .filter(|t| t.args.is_empty())
        .filter_map(|t| Gender::from_marker(&t.name))
        .collect();

    Some((pos, categories, genders))
}

/// True if the line is exactly the `{{name}}` marker template.
fn is_marker_line(line: &str, name: &str) -> bool {
    matches!(parse_template(line), Ok(Some(t)) if t.name == name)
}

/// Split `[1] text` into `("1", "text")`.
fn split_sense_number(item: &str) -> Option<(&str, &str)> {
    let rest = item.strip_prefix('[')?;
    let close = rest.find(']')?;
    let number = rest[..close].trim();
    if number.is_empty() {
        return None;
    }
    Some((number, rest[close + 1..].trim()))
}

/// Build a definition from one list item. Items that are empty after
/// stripping (placeholder senses) yield `None`.
fn parse_definition(
    number: &str,
    raw: &str,
) -> Result<Option<Definition>, crate::error::WikitextError> {
    let templates = find_templates(raw)?;

    let mut labels = Vec::new();
    let mut text = String::with_capacity(raw.len());
    let mut cursor = 0;
    for template in &templates {
        let Some(found) = label_template(template) else {
            continue;
        };
        labels.extend(found);
        text.push_str(&raw[cursor..template.start]);
        cursor = template.end;
    }
    text.push_str(&raw[cursor..]);

    let links = wikilinks(&text);
    let stripped = strip_markup(&text);
    let stripped = stripped.trim_start_matches(':').trim().to_string();
    if stripped.is_empty() {
        return Ok(None);
    }

    if let [link] = links.as_slice() {
        if let Some(cap) = REFERENCE_TEXT.captures(&stripped) {
            if cap[1].trim() == link.text() {
                return Ok(Some(Definition {
                    number: number.to_string(),
                    kind: DefinitionKind::Reference,
                    text: link.target.clone(),
                    labels,
                }));
            }
        }
    }

    Ok(Some(Definition {
        number: number.to_string(),
        kind: DefinitionKind::Gloss,
        text: stripped,
        labels,
    }))
}

/// Context labels carried by a template: `{{K|ugs.|Religion}}` or a bare
/// abbreviation such as `{{ugs.}}`. `None` for any other template.
fn label_template(template: &Template) -> Option<Vec<String>> {
    if template.name == "K" {
        return Some(
            template
                .positional()
                .map(strip_markup)
                .filter(|label| !label.is_empty())
                .collect(),
        );
    }
    if template.args.is_empty() && template.name.ends_with('.') && template.name.len() > 1 {
        return Some(vec![template.name.clone()]);
    }
    None
}

/// Translations in the remainder of one `*{{xx}}:` line.
fn translations_in_line(
    language: &str,
    rest: &str,
) -> Result<Vec<Translation>, crate::error::WikitextError> {
    // Adjacent markers such as `[1][2]` or `[1] [2]` apply together.
    let mut markers: Vec<(usize, usize, Vec<String>)> = Vec::new();
    for m in SENSE_MARKER.find_iter(rest) {
        let inside_link = rest[..m.start()].ends_with('[') || rest[m.end()..].starts_with(']');
        if inside_link {
            continue;
        }
        let senses: Vec<String> = rest[m.start() + 1..m.end() - 1]
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        match markers.last_mut() {
            Some((_, end, previous)) if rest[*end..m.start()].trim().is_empty() => {
                previous.extend(senses);
                *end = m.end();
            }
            _ => markers.push((m.start(), m.end(), senses)),
        }
    }

    let mut translations = Vec::new();
    for template in find_templates(rest)? {
        if template.name != "Ü" && template.name != "Üt" {
            continue;
        }
        let Some(term) = template.positional().nth(1).map(strip_markup) else {
            continue;
        };
        if term.is_empty() {
            continue;
        }
        let senses = markers
            .iter()
            .rev()
            .find(|(start, _, _)| *start < template.start)
            .map(|(_, _, senses)| senses.clone())
            .unwrap_or_default();
        translations.push(Translation {
            language: language.to_string(),
            senses,
            term,
        });
    }
    Ok(translations)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
