//! Parse results: what a German Wiktionary page says about a word.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::inflection::{Gender, InflectionFamily, InflectionTable};

/// Raw wikitext of one page plus the headword it was fetched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    headword: String,
    wikitext: String,
}

impl Article {
    pub fn new(headword: &str, wikitext: impl Into<String>) -> Self {
        Article {
            headword: normalize_headword(headword),
            wikitext: wikitext.into(),
        }
    }

    pub fn headword(&self) -> &str {
        &self.headword
    }

    pub fn wikitext(&self) -> &str {
        &self.wikitext
    }
}

/// NFC-normalize and trim a headword, so decomposed umlauts match page titles.
pub fn normalize_headword(word: &str) -> String {
    word.trim().nfc().collect()
}

/// The German part of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSection<'a> {
    pub heading: String,
    /// Word named in the heading: `Mann` for `== Mann ({{Sprache|Deutsch}}) ==`.
    pub lemma: Option<String>,
    pub body: &'a str,
}

/// Part of speech, normalized from the German `Wortart` names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartOfSpeech {
    Noun,
    ProperNoun,
    Verb,
    Adjective,
    Adverb,
    Pronoun,
    Article,
    Preposition,
    Conjunction,
    Particle,
    Interjection,
    Numeral,
    Abbreviation,
    InflectedForm,
    Phrase,
    Affix,
    Other,
}

/// Wortart names as they appear in `{{Wortart|...|Deutsch}}`.
static WORTART_MAP: Lazy<HashMap<&'static str, PartOfSpeech>> = Lazy::new(|| {
    use PartOfSpeech as P;
    [
        ("Substantiv", P::Noun),
        ("Eigenname", P::ProperNoun),
        ("Vorname", P::ProperNoun),
        ("Nachname", P::ProperNoun),
        ("Toponym", P::ProperNoun),
        ("Straßenname", P::ProperNoun),
        ("Verb", P::Verb),
        ("Hilfsverb", P::Verb),
        ("Modalverb", P::Verb),
        ("Adjektiv", P::Adjective),
        ("Adverb", P::Adverb),
        ("Temporaladverb", P::Adverb),
        ("Lokaladverb", P::Adverb),
        ("Modaladverb", P::Adverb),
        ("Kausaladverb", P::Adverb),
        ("Konjunktionaladverb", P::Adverb),
        ("Pronominaladverb", P::Adverb),
        ("Interrogativadverb", P::Adverb),
        ("Relativadverb", P::Adverb),
        ("Pronomen", P::Pronoun),
        ("Personalpronomen", P::Pronoun),
        ("Indefinitpronomen", P::Pronoun),
        ("Demonstrativpronomen", P::Pronoun),
        ("Reflexivpronomen", P::Pronoun),
        ("Relativpronomen", P::Pronoun),
        ("Interrogativpronomen", P::Pronoun),
        ("Possessivpronomen", P::Pronoun),
        ("Reziprokpronomen", P::Pronoun),
        ("Artikel", P::Article),
        ("Präposition", P::Preposition),
        ("Postposition", P::Preposition),
        ("Konjunktion", P::Conjunction),
        ("Subjunktion", P::Conjunction),
        ("Partikel", P::Particle),
        ("Antwortpartikel", P::Particle),
        ("Gradpartikel", P::Particle),
        ("Fokuspartikel", P::Particle),
        ("Modalpartikel", P::Particle),
        ("Negationspartikel", P::Particle),
        ("Interjektion", P::Interjection),
        ("Onomatopoetikum", P::Interjection),
        ("Grußformel", P::Interjection),
        ("Numerale", P::Numeral),
        ("Zahlzeichen", P::Numeral),
        ("Abkürzung", P::Abbreviation),
        ("Deklinierte Form", P::InflectedForm),
        ("Konjugierte Form", P::InflectedForm),
        ("Komparativ", P::InflectedForm),
        ("Superlativ", P::InflectedForm),
        ("Partizip I", P::InflectedForm),
        ("Partizip II", P::InflectedForm),
        ("Erweiterter Infinitiv", P::InflectedForm),
        ("Dekliniertes Gerundivum", P::InflectedForm),
        ("Redewendung", P::Phrase),
        ("Wortverbindung", P::Phrase),
        ("Sprichwort", P::Phrase),
        ("Präfix", P::Affix),
        ("Suffix", P::Affix),
        ("Kontraktion", P::Other),
        ("Buchstabe", P::Other),
    ]
    .into_iter()
    .collect()
});

impl PartOfSpeech {
    /// Map a German Wortart name; `None` for names outside the known set.
    pub fn from_wortart(name: &str) -> Option<Self> {
        WORTART_MAP.get(name.trim()).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PartOfSpeech::Noun => "noun",
            PartOfSpeech::ProperNoun => "proper_noun",
            PartOfSpeech::Verb => "verb",
            PartOfSpeech::Adjective => "adjective",
            PartOfSpeech::Adverb => "adverb",
            PartOfSpeech::Pronoun => "pronoun",
            PartOfSpeech::Article => "article",
            PartOfSpeech::Preposition => "preposition",
            PartOfSpeech::Conjunction => "conjunction",
            PartOfSpeech::Particle => "particle",
            PartOfSpeech::Interjection => "interjection",
            PartOfSpeech::Numeral => "numeral",
            PartOfSpeech::Abbreviation => "abbreviation",
            PartOfSpeech::InflectedForm => "inflected_form",
            PartOfSpeech::Phrase => "phrase",
            PartOfSpeech::Affix => "affix",
            PartOfSpeech::Other => "other",
        }
    }

    /// Lookup table used for this POS's inflection template, if it inflects.
    pub fn inflection_family(&self) -> Option<InflectionFamily> {
        match self {
            PartOfSpeech::Noun | PartOfSpeech::ProperNoun => Some(InflectionFamily::Noun),
            PartOfSpeech::Verb => Some(InflectionFamily::Verb),
            PartOfSpeech::Adjective => Some(InflectionFamily::Adjective),
            PartOfSpeech::Pronoun | PartOfSpeech::Article => Some(InflectionFamily::Pronoun),
            _ => None,
        }
    }
}

impl std::fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionKind {
    Gloss,
    /// "see <other word>": `text` holds the target headword.
    Reference,
}

/// One numbered sense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    /// Sense marker without brackets: `1`, `2a`, `1, 2`.
    pub number: String,
    pub kind: DefinitionKind,
    pub text: String,
    /// Context labels such as `ugs.` or `Religion`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

impl Definition {
    pub fn is_reference(&self) -> bool {
        self.kind == DefinitionKind::Reference
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    /// Language code: `en`, `fr`, ...
    pub language: String,
    /// Sense markers the translation applies to, as written (`1`, `2`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub senses: Vec<String>,
    pub term: String,
}

/// For inflected-form entries: which lemma the form belongs to and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormOf {
    /// Grammatical description, e.g. `1. Person Singular Präsens Indikativ`.
    pub description: String,
    pub lemma: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartOfSpeechBlock {
    pub pos: PartOfSpeech,
    /// German Wortart names from the heading, verbatim.
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genders: Vec<Gender>,
    pub definitions: Vec<Definition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inflection: Option<InflectionTable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub translations: Vec<Translation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub form_of: Vec<FormOf>,
}

impl PartOfSpeechBlock {
    pub fn new(pos: PartOfSpeech) -> Self {
        PartOfSpeechBlock {
            pos,
            categories: Vec::new(),
            genders: Vec::new(),
            definitions: Vec::new(),
            inflection: None,
            translations: Vec::new(),
            form_of: Vec::new(),
        }
    }

    /// Gloss texts only, in sense order.
    pub fn glosses(&self) -> Vec<&str> {
        self.definitions
            .iter()
            .filter(|d| !d.is_reference())
            .map(|d| d.text.as_str())
            .collect()
    }
}

/// A stage failure that was recovered locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub stage: String,
    pub reason: String,
    /// Index into `WordEntry::blocks` when the failure belongs to one block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub headword: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,
    pub blocks: Vec<PartOfSpeechBlock>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl WordEntry {
    pub fn has_inflection(&self) -> bool {
        self.blocks.iter().any(|b| b.inflection.is_some())
    }
}
