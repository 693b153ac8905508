//! Inflection tables: closed grammatical-feature keys and the static lookup
//! tables that map German template parameter names onto them.
//!
//! See <https://de.wiktionary.org/wiki/Hilfe:Flexionstabellen> for the
//! template formats. Parameter names that match no table entry are collected
//! in [`InflectionTable::unrecognized`] and otherwise ignored, so template
//! variants with extra parameters still parse.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::wikitext::{strip_markup, Template};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Case {
    Nominative,
    Genitive,
    Dative,
    Accusative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Number {
    Singular,
    Plural,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Masculine,
    Feminine,
    Neuter,
}

impl Gender {
    /// Parse the one-letter markers used in headings (`{{m}}`) and `Genus=` parameters.
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker.trim() {
            "m" => Some(Gender::Masculine),
            "f" => Some(Gender::Feminine),
            "n" => Some(Gender::Neuter),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Person {
    First,
    Second,
    Third,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tense {
    Present,
    Preterite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Indicative,
    Subjunctive,
    Imperative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Degree {
    Positive,
    Comparative,
    Superlative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonFinite {
    PresentParticiple,
    PastParticiple,
}

/// Grammatical feature tuple identifying one cell of an inflection table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormKey {
    /// Nouns, pronouns and articles. Gender is only set for gendered pronoun tables.
    Declined {
        case: Case,
        number: Number,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gender: Option<Gender>,
    },
    /// Adjective comparison.
    Compared { degree: Degree },
    /// Finite verb forms.
    Conjugated {
        person: Person,
        number: Number,
        tense: Tense,
        mood: Mood,
    },
    NonFinite { form: NonFinite },
}

impl FormKey {
    pub fn declined(case: Case, number: Number) -> Self {
        FormKey::Declined {
            case,
            number,
            gender: None,
        }
    }

    pub fn conjugated(person: Person, number: Number, tense: Tense, mood: Mood) -> Self {
        FormKey::Conjugated {
            person,
            number,
            tense,
            mood,
        }
    }
}

fn name_of<T: PartialEq + Copy>(table: &[(&'static str, T)], value: T) -> &'static str {
    table
        .iter()
        .find(|(_, v)| *v == value)
        .map(|(name, _)| *name)
        .unwrap_or("?")
}

/// Writes the German parameter name of the cell: `Nominativ Plural`, `Präsens_du`.
impl std::fmt::Display for FormKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            FormKey::Declined { case, number, gender } => {
                write!(f, "{} {}", name_of(&CASES, case), name_of(&NUMBERS, number))?;
                if let Some(gender) = gender {
                    write!(f, " {}", name_of(&GENDERS, gender))?;
                }
                Ok(())
            }
            FormKey::Compared { degree } => f.write_str(name_of(&DEGREES, degree)),
            FormKey::Conjugated { number, mood: Mood::Imperative, .. } => {
                write!(f, "Imperativ {}", name_of(&NUMBERS, number))
            }
            FormKey::Conjugated {
                person,
                number,
                tense,
                mood,
            } => {
                let paradigm = PARADIGMS
                    .iter()
                    .find(|(_, t, m)| *t == tense && *m == mood)
                    .map(|(name, _, _)| *name)
                    .unwrap_or("?");
                let pronoun = PRONOUNS
                    .iter()
                    .find(|(_, p, n)| *p == person && *n == number)
                    .map(|(name, _, _)| *name)
                    .unwrap_or("?");
                write!(f, "{}_{}", paradigm, pronoun)
            }
            FormKey::NonFinite { form } => f.write_str(match form {
                NonFinite::PresentParticiple => "Partizip I",
                NonFinite::PastParticiple => "Partizip II",
            }),
        }
    }
}

/// Which lookup table applies to a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InflectionFamily {
    Noun,
    Verb,
    Adjective,
    Pronoun,
}

impl InflectionFamily {
    /// Family implied by an inflection template name, if the name is one.
    ///
    /// `Deklination` is generic and yields `Some(None)`: it is an inflection
    /// template but the family has to come from the part of speech.
    pub fn from_template_name(name: &str) -> Option<Option<Self>> {
        let name = name.trim();
        match name {
            "Deklination" => return Some(None),
            "Konjugation" => return Some(Some(InflectionFamily::Verb)),
            "Steigerung" => return Some(Some(InflectionFamily::Adjective)),
            "Pronomina-Tabelle" => return Some(Some(InflectionFamily::Pronoun)),
            _ => {}
        }
        let subject = name.strip_prefix("Deutsch ")?;
        if !subject.contains("Übersicht") {
            return None;
        }
        let family = if subject.starts_with("Verb") {
            InflectionFamily::Verb
        } else if subject.starts_with("Adjektiv") {
            InflectionFamily::Adjective
        } else if subject.contains("pronomen") || subject.starts_with("Pronomen") {
            InflectionFamily::Pronoun
        } else {
            InflectionFamily::Noun
        };
        Some(Some(family))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Static lookup tables
// ─────────────────────────────────────────────────────────────────────────────

const CASES: [(&str, Case); 4] = [
    ("Nominativ", Case::Nominative),
    ("Genitiv", Case::Genitive),
    ("Dativ", Case::Dative),
    ("Akkusativ", Case::Accusative),
];

const NUMBERS: [(&str, Number); 2] = [("Singular", Number::Singular), ("Plural", Number::Plural)];

const GENDERS: [(&str, Gender); 3] = [
    ("m", Gender::Masculine),
    ("f", Gender::Feminine),
    ("n", Gender::Neuter),
];

const DEGREES: [(&str, Degree); 3] = [
    ("Positiv", Degree::Positive),
    ("Komparativ", Degree::Comparative),
    ("Superlativ", Degree::Superlative),
];

/// Verb paradigm prefixes: `Präsens_ich`, `Konjunktiv II_du`, ...
const PARADIGMS: [(&str, Tense, Mood); 4] = [
    ("Präsens", Tense::Present, Mood::Indicative),
    ("Präteritum", Tense::Preterite, Mood::Indicative),
    ("Konjunktiv I", Tense::Present, Mood::Subjunctive),
    ("Konjunktiv II", Tense::Preterite, Mood::Subjunctive),
];

const PRONOUNS: [(&str, Person, Number); 7] = [
    ("ich", Person::First, Number::Singular),
    ("du", Person::Second, Number::Singular),
    ("er, sie, es", Person::Third, Number::Singular),
    ("er", Person::Third, Number::Singular),
    ("wir", Person::First, Number::Plural),
    ("ihr", Person::Second, Number::Plural),
    ("sie", Person::Third, Number::Plural),
];

/// Parameters that are known but carry no inflected form (pictures, notes).
const IGNORED_PARAMS: [&str; 5] = [
    "Bild",
    "Unregelmäßig",
    "Weitere_Konjugationen",
    "Weitere Konjugationen",
    "Gebrauch",
];

static NOUN_PARAMS: Lazy<HashMap<String, FormKey>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for (case_name, case) in CASES {
        for (number_name, number) in NUMBERS {
            map.insert(
                format!("{} {}", case_name, number_name),
                FormKey::declined(case, number),
            );
        }
    }
    map
});

static PRONOUN_PARAMS: Lazy<HashMap<String, FormKey>> = Lazy::new(|| {
    let mut map = HashMap::clone(&NOUN_PARAMS);
    for (case_name, case) in CASES {
        for (number_name, number) in NUMBERS {
            for (gender_name, gender) in GENDERS {
                map.insert(
                    format!("{} {} {}", case_name, number_name, gender_name),
                    FormKey::Declined {
                        case,
                        number,
                        gender: Some(gender),
                    },
                );
            }
        }
    }
    map
});

static ADJECTIVE_PARAMS: Lazy<HashMap<String, FormKey>> = Lazy::new(|| {
    DEGREES
        .into_iter()
        .map(|(name, degree)| (name.to_string(), FormKey::Compared { degree }))
        .collect()
});

static VERB_PARAMS: Lazy<HashMap<String, FormKey>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for (paradigm, tense, mood) in PARADIGMS {
        for (pronoun, person, number) in PRONOUNS {
            map.insert(
                format!("{}_{}", paradigm, pronoun),
                FormKey::conjugated(person, number, tense, mood),
            );
        }
    }
    map.insert(
        "Imperativ Singular".to_string(),
        FormKey::conjugated(Person::Second, Number::Singular, Tense::Present, Mood::Imperative),
    );
    map.insert(
        "Imperativ Plural".to_string(),
        FormKey::conjugated(Person::Second, Number::Plural, Tense::Present, Mood::Imperative),
    );
    map.insert(
        "Partizip I".to_string(),
        FormKey::NonFinite {
            form: NonFinite::PresentParticiple,
        },
    );
    map.insert(
        "Partizip II".to_string(),
        FormKey::NonFinite {
            form: NonFinite::PastParticiple,
        },
    );
    map
});

fn lookup_table(family: InflectionFamily) -> &'static HashMap<String, FormKey> {
    match family {
        InflectionFamily::Noun => &NOUN_PARAMS,
        InflectionFamily::Verb => &VERB_PARAMS,
        InflectionFamily::Adjective => &ADJECTIVE_PARAMS,
        InflectionFamily::Pronoun => &PRONOUN_PARAMS,
    }
}

/// Strip alternative-form markers: `Genitiv Singular*` and `Nominativ Plural 2`
/// both resolve to the same cell as their unmarked name.
fn base_param_name(name: &str) -> &str {
    let base = name.trim().trim_end_matches('*').trim_end();
    match base.rsplit_once(' ') {
        Some((head, tail)) if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit()) => {
            head.trim_end()
        }
        _ => base,
    }
}

/// Resolve a parameter name for a family; `None` for unrecognized names.
pub fn lookup_param(family: InflectionFamily, name: &str) -> Option<FormKey> {
    lookup_table(family).get(base_param_name(name)).copied()
}

// ─────────────────────────────────────────────────────────────────────────────
// Inflection table
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InflectionTable {
    /// Name of the template the table was read from.
    pub template: String,
    pub family: InflectionFamily,
    #[serde(with = "keyed_entries")]
    pub forms: BTreeMap<FormKey, String>,
    #[serde(with = "keyed_entries", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variants: BTreeMap<FormKey, Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genders: Vec<Gender>,
    /// Auxiliary verbs for the perfect (`haben`, `sein`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auxiliaries: Vec<String>,
    /// Parameter names that matched no lookup entry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unrecognized: Vec<String>,
}

impl InflectionTable {
    pub fn new(template: &str, family: InflectionFamily) -> Self {
        InflectionTable {
            template: template.to_string(),
            family,
            forms: BTreeMap::new(),
            variants: BTreeMap::new(),
            genders: Vec::new(),
            auxiliaries: Vec::new(),
            unrecognized: Vec::new(),
        }
    }

    /// Build a table from a template invocation using the family's lookup table.
    pub fn from_template(template: &Template, family: InflectionFamily) -> Self {
        let mut table = InflectionTable::new(&template.name, family);

        for arg in &template.args {
            let Some(name) = arg.name.as_deref() else {
                continue;
            };
            let value = strip_markup(&arg.value);

            let base = base_param_name(name);
            if base == "Genus" {
                if let Some(gender) = Gender::from_marker(&value) {
                    if !table.genders.contains(&gender) {
                        table.genders.push(gender);
                    }
                }
                continue;
            }
            if base == "Hilfsverb" {
                if !value.is_empty() && !table.auxiliaries.contains(&value) {
                    table.auxiliaries.push(value);
                }
                continue;
            }

            match lookup_param(family, name) {
                Some(key) => table.insert(key, value),
                None if IGNORED_PARAMS.iter().any(|p| base.starts_with(p)) => {}
                None => {
                    tracing::debug!(param = name, template = %template.name, "unrecognized inflection parameter");
                    table.unrecognized.push(name.to_string());
                }
            }
        }

        table
    }

    /// Record a form. The first value for a cell is its primary form, later
    /// ones are variants. Empty values and dash placeholders ("no such form") are skipped.
    fn insert(&mut self, key: FormKey, value: String) {
        if value.is_empty() || matches!(value.as_str(), "—" | "–" | "-") {
            return;
        }
        match self.forms.get(&key) {
            None => {
                self.forms.insert(key, value);
            }
            Some(primary) if *primary == value => {}
            Some(_) => {
                let variants = self.variants.entry(key).or_default();
                if !variants.contains(&value) {
                    variants.push(value);
                }
            }
        }
    }

    pub fn get(&self, key: &FormKey) -> Option<&str> {
        self.forms.get(key).map(String::as_str)
    }

    pub fn declined(&self, case: Case, number: Number) -> Option<&str> {
        self.get(&FormKey::declined(case, number))
    }

    pub fn variants_of(&self, key: &FormKey) -> &[String] {
        self.variants.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

/// Serialize `FormKey` maps as ordered `[{ "key": ..., "value": ... }]` lists,
/// since JSON object keys must be strings.
mod keyed_entries {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::FormKey;

    #[derive(Serialize, Deserialize)]
    struct Entry<V> {
        key: FormKey,
        value: V,
    }

    pub fn serialize<V, S>(map: &BTreeMap<FormKey, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        V: Serialize,
        S: Serializer,
    {
        serializer.collect_seq(map.iter().map(|(key, value)| Entry { key: *key, value }))
    }

    pub fn deserialize<'de, V, D>(deserializer: D) -> Result<BTreeMap<FormKey, V>, D::Error>
    where
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let entries: Vec<Entry<V>> = Vec::deserialize(deserializer)?;
        Ok(entries.into_iter().map(|e| (e.key, e.value)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wikitext::find_templates;

    fn table(text: &str, family: InflectionFamily) -> InflectionTable {
        let templates = find_templates(text).unwrap();
        InflectionTable::from_template(&templates[0], family)
    }

    #[test]
    fn template_name_families() {
        assert_eq!(
            InflectionFamily::from_template_name("Deutsch Substantiv Übersicht"),
            Some(Some(InflectionFamily::Noun))
        );
        assert_eq!(
            InflectionFamily::from_template_name("Deutsch Verb Übersicht"),
            Some(Some(InflectionFamily::Verb))
        );
        assert_eq!(
            InflectionFamily::from_template_name("Deutsch Adjektiv Übersicht"),
            Some(Some(InflectionFamily::Adjective))
        );
        assert_eq!(
            InflectionFamily::from_template_name("Deutsch Indefinitpronomen Übersicht"),
            Some(Some(InflectionFamily::Pronoun))
        );
        assert_eq!(
            InflectionFamily::from_template_name("Pronomina-Tabelle"),
            Some(Some(InflectionFamily::Pronoun))
        );
        assert_eq!(InflectionFamily::from_template_name("Deklination"), Some(None));
        assert_eq!(InflectionFamily::from_template_name("Bedeutungen"), None);
        assert_eq!(InflectionFamily::from_template_name("Deutsch"), None);
    }

    #[test]
    fn variant_markers() {
        assert_eq!(base_param_name("Genitiv Singular"), "Genitiv Singular");
        assert_eq!(base_param_name("Genitiv Singular*"), "Genitiv Singular");
        assert_eq!(base_param_name("Nominativ Plural 1"), "Nominativ Plural");
        assert_eq!(base_param_name("Nominativ Plural 2*"), "Nominativ Plural");
        assert_eq!(base_param_name("Präsens_du*"), "Präsens_du");
        assert_eq!(base_param_name("Nominativ Singular m"), "Nominativ Singular m");
    }

    #[test]
    fn noun_lookup() {
        assert_eq!(
            lookup_param(InflectionFamily::Noun, "Akkusativ Plural"),
            Some(FormKey::declined(Case::Accusative, Number::Plural))
        );
        assert_eq!(lookup_param(InflectionFamily::Noun, "Nominativ Singular m"), None);
        assert_eq!(lookup_param(InflectionFamily::Noun, "Positiv"), None);
    }

    #[test]
    fn pronoun_lookup_has_gender() {
        assert_eq!(
            lookup_param(InflectionFamily::Pronoun, "Dativ Singular f"),
            Some(FormKey::Declined {
                case: Case::Dative,
                number: Number::Singular,
                gender: Some(Gender::Feminine)
            })
        );
    }

    #[test]
    fn verb_lookup() {
        assert_eq!(
            lookup_param(InflectionFamily::Verb, "Präsens_er, sie, es"),
            Some(FormKey::conjugated(Person::Third, Number::Singular, Tense::Present, Mood::Indicative))
        );
        assert_eq!(
            lookup_param(InflectionFamily::Verb, "Konjunktiv II_ich"),
            Some(FormKey::conjugated(Person::First, Number::Singular, Tense::Preterite, Mood::Subjunctive))
        );
        assert_eq!(
            lookup_param(InflectionFamily::Verb, "Partizip II*"),
            Some(FormKey::NonFinite { form: NonFinite::PastParticiple })
        );
    }

    #[test]
    fn synthetic_declination() {
        let t = table(
            "{{Deklination|Nominativ Singular=Beispiel|Nominativ Plural=Beispiele}}",
            InflectionFamily::Noun,
        );
        assert_eq!(t.declined(Case::Nominative, Number::Singular), Some("Beispiel"));
        assert_eq!(t.declined(Case::Nominative, Number::Plural), Some("Beispiele"));
        assert_eq!(t.forms.len(), 2);
        assert!(t.unrecognized.is_empty());
    }

    #[test]
    fn noun_overview_with_gender_and_variants() {
        let t = table(
            "{{Deutsch Substantiv Übersicht
|Genus=m
|Nominativ Singular=Mann
|Nominativ Plural=Männer
|Genitiv Singular=Mannes
|Genitiv Singular*=Manns
|Dativ Singular=Mann
|Dativ Singular*=Manne
|Dativ Plural=Männern
|Bild=Man.jpg
|Anmerkung=selten
}}",
            InflectionFamily::Noun,
        );
        assert_eq!(t.genders, vec![Gender::Masculine]);
        assert_eq!(t.declined(Case::Genitive, Number::Singular), Some("Mannes"));
        assert_eq!(
            t.variants_of(&FormKey::declined(Case::Genitive, Number::Singular)),
            ["Manns".to_string()]
        );
        assert_eq!(t.declined(Case::Dative, Number::Plural), Some("Männern"));
        assert_eq!(t.unrecognized, vec!["Anmerkung".to_string()]);
    }

    #[test]
    fn numbered_plurals_share_a_cell() {
        let t = table(
            "{{Deklination|Nominativ Plural 1=Banken|Nominativ Plural 2=Bänke}}",
            InflectionFamily::Noun,
        );
        assert_eq!(t.declined(Case::Nominative, Number::Plural), Some("Banken"));
        assert_eq!(
            t.variants_of(&FormKey::declined(Case::Nominative, Number::Plural)),
            ["Bänke".to_string()]
        );
    }

    #[test]
    fn star_form_without_primary_becomes_primary() {
        let t = table("{{Deklination|Genitiv Singular*=Manns}}", InflectionFamily::Noun);
        assert_eq!(t.declined(Case::Genitive, Number::Singular), Some("Manns"));
        assert!(t.variants.is_empty());
    }

    #[test]
    fn dash_means_no_form() {
        let t = table("{{Deklination|Nominativ Singular=Obst|Nominativ Plural=—}}", InflectionFamily::Noun);
        assert_eq!(t.declined(Case::Nominative, Number::Plural), None);
    }

    #[test]
    fn verb_overview() {
        let t = table(
            "{{Deutsch Verb Übersicht
|Präsens_ich=gehe
|Präsens_du=gehst
|Präsens_er, sie, es=geht
|Präteritum_ich=ging
|Partizip II=gegangen
|Konjunktiv II_ich=ginge
|Imperativ Singular=geh
|Imperativ Singular*=gehe
|Imperativ Plural=geht
|Hilfsverb=sein
}}",
            InflectionFamily::Verb,
        );
        assert_eq!(
            t.get(&FormKey::conjugated(Person::Second, Number::Singular, Tense::Present, Mood::Indicative)),
            Some("gehst")
        );
        assert_eq!(
            t.get(&FormKey::NonFinite { form: NonFinite::PastParticiple }),
            Some("gegangen")
        );
        let imperative = FormKey::conjugated(Person::Second, Number::Singular, Tense::Present, Mood::Imperative);
        assert_eq!(t.get(&imperative), Some("geh"));
        assert_eq!(t.variants_of(&imperative), ["gehe".to_string()]);
        assert_eq!(t.auxiliaries, vec!["sein".to_string()]);
        assert!(t.unrecognized.is_empty());
    }

    #[test]
    fn adjective_overview() {
        let t = table(
            "{{Deutsch Adjektiv Übersicht|Positiv=groß|Komparativ=größer|Superlativ=am [[größten]]}}",
            InflectionFamily::Adjective,
        );
        assert_eq!(t.get(&FormKey::Compared { degree: Degree::Comparative }), Some("größer"));
        assert_eq!(t.get(&FormKey::Compared { degree: Degree::Superlative }), Some("am größten"));
    }

    #[test]
    fn nested_template_value_is_opaque() {
        let t = table("{{Deklination|Nominativ Singular=Bank {{Ref|x}}}}", InflectionFamily::Noun);
        assert_eq!(t.declined(Case::Nominative, Number::Singular), Some("Bank {{Ref|x}}"));
    }

    #[test]
    fn serializes_forms_as_entry_list() {
        let t = table("{{Deklination|Nominativ Singular=Beispiel}}", InflectionFamily::Noun);
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["forms"][0]["key"]["kind"], "declined");
        assert_eq!(json["forms"][0]["key"]["case"], "nominative");
        assert_eq!(json["forms"][0]["value"], "Beispiel");

        let back: InflectionTable = serde_json::from_value(json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn display_uses_parameter_names() {
        for name in [
            "Nominativ Plural",
            "Dativ Singular f",
            "Komparativ",
            "Präsens_er, sie, es",
            "Konjunktiv II_wir",
            "Imperativ Plural",
            "Partizip II",
        ] {
            let key = [
                InflectionFamily::Pronoun,
                InflectionFamily::Adjective,
                InflectionFamily::Verb,
            ]
            .into_iter()
            .find_map(|family| lookup_param(family, name))
            .unwrap();
            assert_eq!(key.to_string(), name);
        }
    }
}
