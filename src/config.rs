//! Parser configuration: which language sections to read and how to tag
//! what comes out. Built in code or loaded from a YAML file such as
//! `schema/italian.yaml`.

use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Part-of-speech headings recognised inside a language section.
pub const DEFAULT_PART_OF_SPEECH: &str = "Noun|Verb|Adjective|Adverb|Pronoun|Conjunction|\
Interjection|Preposition|Proper noun|Article|Prepositional phrase|Acronym|Abbreviation|\
Initialism|Contraction|Prefix|Suffix|Symbol|Letter|Ligature|Idiom|Phrase|Noun phrase|\
Verb phrase|Numeral|Number|Cardinal number|Ordinal number|Particle|Determiner|Proverb|\
Participle|Interrogative pronoun|Personal pronoun";

/// Page title prefixes that never hold dictionary entries.
pub const DEFAULT_IGNORABLE_PREFIXES: &[&str] = &[
    "Wiktionary:",
    "Template:",
    "Appendix:",
    "Category:",
    "Index:",
    "MediaWiki:",
    "TransWiki:",
    "Citations:",
    "Concordance:",
    "Help:",
    "Reconstruction:",
    "Thesaurus:",
];

/// On-disk shape of a config file. Everything except the language names is
/// optional.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    /// Tag stored on every entry, e.g. `enwiktionary.italian`
    source_name: Option<String>,
    /// Found anywhere in the section heading
    language: String,
    /// Must match the whole heading; other matches get a `(lang)` prefix
    canonical_language: Option<String>,
    /// Language code used by templates, e.g. `it`
    language_code: String,
    part_of_speech: Option<String>,
    #[serde(default)]
    swap: bool,
    ignorable_title_prefixes: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct ParserConfig {
    pub source_name: String,
    pub language: Regex,
    pub canonical_language: Regex,
    pub language_code: Regex,
    pub part_of_speech: Regex,
    pub swap: bool,
    pub ignorable_title_prefixes: Vec<String>,
}

fn compile(field: &'static str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| Error::Regex { field, source })
}

/// Compiles `pattern` so it only matches a whole string.
fn compile_full(field: &'static str, pattern: &str) -> Result<Regex> {
    compile(field, &format!("^(?:{})$", pattern))
}

impl ParserConfig {
    pub fn new(
        source_name: &str,
        language: &str,
        canonical_language: &str,
        language_code: &str,
        part_of_speech: &str,
        swap: bool,
    ) -> Result<Self> {
        Ok(ParserConfig {
            source_name: source_name.to_string(),
            language: compile("language", language)?,
            canonical_language: compile_full("canonical_language", canonical_language)?,
            language_code: compile_full("language_code", language_code)?,
            part_of_speech: compile_full("part_of_speech", part_of_speech)?,
            swap,
            ignorable_title_prefixes: DEFAULT_IGNORABLE_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        })
    }

    /// Italian entries of the English Wiktionary
    pub fn italian() -> Result<Self> {
        Self::new(
            "enwiktionary.italian",
            "Italian",
            "Italian",
            "it",
            DEFAULT_PART_OF_SPEECH,
            false,
        )
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(yaml)?;
        let source_name = file
            .source_name
            .unwrap_or_else(|| format!("enwiktionary.{}", file.language_code));
        let canonical = file
            .canonical_language
            .unwrap_or_else(|| file.language.clone());
        let part_of_speech = file
            .part_of_speech
            .unwrap_or_else(|| DEFAULT_PART_OF_SPEECH.to_string());

        let mut config = Self::new(
            &source_name,
            &file.language,
            &canonical,
            &file.language_code,
            &part_of_speech,
            file.swap,
        )?;
        if let Some(prefixes) = file.ignorable_title_prefixes {
            config.ignorable_title_prefixes = prefixes;
        }
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn is_ignorable_title(&self, title: &str) -> bool {
        self.ignorable_title_prefixes
            .iter()
            .any(|prefix| title.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn italian_preset_patterns() {
        let config = ParserConfig::italian().unwrap();
        assert!(config.language.is_match("Old Italian"));
        assert!(config.canonical_language.is_match("Italian"));
        assert!(!config.canonical_language.is_match("Old Italian"));
        assert!(config.part_of_speech.is_match("Verb"));
        assert!(config.part_of_speech.is_match("Proper noun"));
        assert!(!config.part_of_speech.is_match("Verb form"));
        assert!(config.language_code.is_match("it"));
        assert!(!config.language_code.is_match("itx"));
    }

    #[test]
    fn yaml_with_defaults() {
        let config = ParserConfig::from_yaml_str(
            "language: \"Spanish\"\nlanguage_code: \"es\"\nswap: true\n",
        )
        .unwrap();
        assert_eq!(config.source_name, "enwiktionary.es");
        assert!(config.swap);
        assert!(config.canonical_language.is_match("Spanish"));
        assert!(config.is_ignorable_title("Template:es-noun"));
        assert!(!config.is_ignorable_title("casa"));
    }

    #[test]
    fn yaml_overrides() {
        let yaml = r#"
source_name: "wikt.de"
language: "German"
canonical_language: "German"
language_code: "de"
part_of_speech: "Noun|Verb"
ignorable_title_prefixes: ["Foo:"]
"#;
        let config = ParserConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.source_name, "wikt.de");
        assert!(!config.part_of_speech.is_match("Adjective"));
        assert!(config.is_ignorable_title("Foo:bar"));
        assert!(!config.is_ignorable_title("Template:bar"));
    }

    #[test]
    fn shipped_italian_schema_matches_preset() {
        let path = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/schema/italian.yaml"));
        let config = ParserConfig::from_yaml_file(path).unwrap();
        assert_eq!(config.source_name, "enwiktionary.italian");
        assert!(!config.swap);
        assert!(config.canonical_language.is_match("Italian"));
        assert!(!config.canonical_language.is_match("Old Italian"));
        assert!(config.language_code.is_match("it"));
        for pos in DEFAULT_PART_OF_SPEECH.split('|') {
            assert!(config.part_of_speech.is_match(pos), "{} not in schema", pos);
        }

        let raw: serde_yaml::Value = serde_yaml::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(raw["part_of_speech"].as_str(), Some(DEFAULT_PART_OF_SPEECH));
    }

    #[test]
    fn bad_pattern_reports_field() {
        let err = ParserConfig::new("s", "(", "x", "x", "x", false).unwrap_err();
        assert!(matches!(err, Error::Regex { field: "language", .. }));
    }

    #[test]
    fn missing_language_is_yaml_error() {
        let err = ParserConfig::from_yaml_str("language_code: it\n").unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }
}
