use serde::{Deserialize, Serialize};

/// Marks a pair side that produced no usable text.
pub const SENTINEL: &str = "--";

/// One English/foreign correspondence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub english: String,
    pub foreign: String,
    /// Display foreign text first. Does not change which field holds what.
    #[serde(default)]
    pub swapped: bool,
}

impl Pair {
    pub fn new(english: impl Into<String>, foreign: impl Into<String>, swapped: bool) -> Self {
        Pair {
            english: english.into(),
            foreign: foreign.into(),
            swapped,
        }
    }

    /// True when at least one side carries real text.
    pub fn has_text(&self) -> bool {
        self.english != SENTINEL || self.foreign != SENTINEL
    }

    /// Sides in display order
    pub fn display(&self) -> (&str, &str) {
        if self.swapped {
            (&self.foreign, &self.english)
        } else {
            (&self.english, &self.foreign)
        }
    }
}

/// Pairs built from one list section, all tagged with the dump they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairEntry {
    pub source: String,
    pub pairs: Vec<Pair>,
}

impl PairEntry {
    pub fn new(source: impl Into<String>) -> Self {
        PairEntry {
            source: source.into(),
            pairs: Vec::new(),
        }
    }
}

/// A frozen entry as stored in the indexes. Shared by `Rc` between every key
/// that points at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexedEntry {
    pub id: usize,
    #[serde(flatten)]
    pub entry: PairEntry,
}

/// Why a key points at an entry. Declaration order is lookup rank: exact
/// headwords sort before inflected forms, which sort before words that
/// merely occur in a definition or example.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryTypeName {
    TitleMulti,
    IsFormOfSomethingElse,
    InflectedFormMulti,
    EnglishDefWikiLink,
    EnglishDef,
    Example,
}

/// Which of the two language indexes a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexSide {
    English,
    Foreign,
}

/// Key collected while an entry is still being built. Flushed into the
/// index once the entry is frozen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingKey {
    pub side: IndexSide,
    pub key: String,
    pub entry_type: EntryTypeName,
}

/// Inflected forms collected for one part-of-speech block, in first-seen
/// order and without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordForms(Vec<String>);

impl WordForms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the form was already present or blank.
    pub fn insert(&mut self, form: &str) -> bool {
        let form = form.trim();
        if form.is_empty() || self.0.iter().any(|f| f == form) {
            return false;
        }
        self.0.push(form.to_string());
        true
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Extend<String> for WordForms {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        for form in iter {
            self.insert(&form);
        }
    }
}
