//! Append-and-index writer for inline wikitext.
//!
//! A [`MarkupWriter`] turns one fragment of wikitext (a definition line, an
//! example, the head line of a part-of-speech block) into display text and
//! at the same time collects the index keys that should point at the entry
//! being built. Keys are only collected here; they reach the index once the
//! entry is frozen (see `Dictionary::emit`).

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

use crate::conjugation::{self, Paradigm, SlotTable};
use crate::model::{EntryTypeName, IndexSide, PendingKey, WordForms, SENTINEL};
use crate::tokenizer::{Token, TokenizeError, WikiTokenizer};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("unexpected {kind} inside inline markup")]
    UnexpectedStructure { kind: &'static str },

    #[error("{0}")]
    Tokenize(TokenizeError),

    #[error("template '{template}' is missing argument {position}")]
    MissingArgument { template: String, position: usize },
}

/// Templates that say "this word is an inflection/variant of another".
const FORM_OF_TEMPLATES: &[&str] = &[
    "form of",
    "inflection of",
    "infl of",
    "plural of",
    "feminine of",
    "feminine singular of",
    "feminine plural of",
    "masculine plural of",
    "conjugation of",
    "past participle of",
    "present participle of",
    "gerund of",
    "alternative form of",
    "alt form",
    "alternative spelling of",
    "alt sp",
    "diminutive of",
    "augmentative of",
    "comparative of",
    "superlative of",
    "apocopic form of",
    "elided form of",
];

/// Named head-template arguments that are not inflected forms.
const NON_FORM_ARGS: &[&str] = &[
    "head", "g", "g2", "sort", "cat", "cat2", "id", "nolinkhead", "sc", "tr", "pos",
];

const GENDERS: &[&str] = &["m", "f", "n", "mf", "c", "p", "m-p", "f-p", "m-s", "f-s", "mfbysense"];

lazy_static! {
    // {{it-noun|...}}, {{it-verb|...}}, {{roa-opt-adj|...}}
    static ref LANGUAGE_HEAD_TEMPLATE: Regex = Regex::new(
        r"^([a-z]{2,3}(?:-[a-z]{2,3})?)-(noun|proper noun|verb|adj|adv|pron|prep|conj|intj|det|num|art|prefix|suffix|phrase|pp|plural noun|noun form|verb form|adj form|noun plural form|adj plural form)$"
    ).unwrap();
    static ref LINE_BREAK_TAG: Regex = Regex::new(r"(?i)^<br\s*/?>$").unwrap();
}

/// Collapses whitespace runs to one space and trims both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub struct MarkupWriter {
    title: String,
    language_code: Regex,
    text: String,
    keys: Vec<PendingKey>,
    target: Option<IndexSide>,
    entry_type: EntryTypeName,
    /// Keep `entry_type` for links too instead of switching to the
    /// wiki-link tag.
    entry_type_sticks: bool,
    title_appended: bool,
    form_of: bool,
    word_forms: WordForms,
}

impl MarkupWriter {
    pub fn new(title: &str, language_code: &Regex) -> Self {
        MarkupWriter {
            title: title.to_string(),
            language_code: language_code.clone(),
            text: String::new(),
            keys: Vec::new(),
            target: None,
            entry_type: EntryTypeName::EnglishDef,
            entry_type_sticks: false,
            title_appended: false,
            form_of: false,
            word_forms: WordForms::new(),
        }
    }

    /// Chooses where subsequent words are indexed. `None` appends without
    /// indexing.
    pub fn retarget(&mut self, target: Option<IndexSide>, entry_type: EntryTypeName, sticks: bool) {
        self.target = target;
        self.entry_type = entry_type;
        self.entry_type_sticks = sticks;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn take_text(&mut self) -> String {
        std::mem::take(&mut self.text)
    }

    pub fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// A head template already wrote the headword.
    pub fn title_appended(&self) -> bool {
        self.title_appended
    }

    /// A form-of template marked the text as an inflection of another word.
    pub fn is_form_of(&self) -> bool {
        self.form_of
    }

    pub fn word_forms(&self) -> &WordForms {
        &self.word_forms
    }

    pub fn take_word_forms(&mut self) -> WordForms {
        std::mem::take(&mut self.word_forms)
    }

    pub fn add_key(&mut self, side: IndexSide, key: &str, entry_type: EntryTypeName) {
        self.keys.push(PendingKey {
            side,
            key: key.to_string(),
            entry_type,
        });
    }

    pub fn keys(&self) -> &[PendingKey] {
        &self.keys
    }

    pub fn take_keys(&mut self) -> Vec<PendingKey> {
        std::mem::take(&mut self.keys)
    }

    // ─────────────────────────────────────────────────────────────
    // Dispatch
    // ─────────────────────────────────────────────────────────────

    /// Appends the display text of `wikitext`, collecting keys for the
    /// current target. Block structure inside the fragment, or brackets
    /// that never close, are errors.
    pub fn dispatch(&mut self, wikitext: &str) -> Result<(), MarkupError> {
        let mut tokenizer = WikiTokenizer::new(wikitext);
        while let Some(token) = tokenizer.next_token() {
            match token {
                Token::PlainText(text) => {
                    self.index_words(&text);
                    self.text.push_str(&text);
                }
                Token::WikiLink { target, text } => self.on_wiki_link(&target, &text),
                Token::Function {
                    name,
                    positional,
                    named,
                } => self.on_function(&name, &positional, &named)?,
                Token::Newline => self.text.push(' '),
                Token::Html(tag) => {
                    if LINE_BREAK_TAG.is_match(&tag) {
                        self.text.push(' ');
                    }
                }
                Token::Markup(_) | Token::Comment(_) => {}
                token @ (Token::Heading { .. } | Token::ListItem { .. }) => {
                    return Err(MarkupError::UnexpectedStructure { kind: token.kind() });
                }
            }
        }
        match tokenizer.errors().first() {
            Some(error) => Err(MarkupError::Tokenize(error.clone())),
            None => Ok(()),
        }
    }

    /// Formats one example side. Failures degrade to the sentinel, and so
    /// does an example with no text; keys from a failed attempt are dropped.
    pub fn format_example(&mut self, example: &str, target: Option<IndexSide>) -> String {
        let keys_before = self.keys.len();
        let saved = self.take_text();
        self.retarget(target, EntryTypeName::Example, true);

        let result = match self.dispatch(example) {
            Ok(()) => {
                let text = collapse_whitespace(&self.text);
                if text.is_empty() {
                    SENTINEL.to_string()
                } else {
                    text
                }
            }
            Err(e) => {
                log::debug!("Example degraded to sentinel ({}): {}", e, example);
                self.keys.truncate(keys_before);
                SENTINEL.to_string()
            }
        };
        self.text = saved;
        result
    }

    fn index_words(&mut self, text: &str) {
        let Some(side) = self.target else {
            return;
        };
        let entry_type = self.entry_type;
        for word in text.split(|c: char| !is_word_char(c)) {
            let word = word.trim_matches(|c: char| c == '\'' || c == '’' || c == '-');
            if word.is_empty() {
                continue;
            }
            let word: String = word.nfc().collect();
            self.add_key(side, &word, entry_type);
        }
    }

    fn on_wiki_link(&mut self, target: &str, text: &str) {
        let destination = target.trim_start_matches(':');
        let lowered = destination.to_lowercase();
        if lowered.starts_with("category:")
            || lowered.starts_with("file:")
            || lowered.starts_with("image:")
        {
            return;
        }
        self.text.push_str(text);

        let Some(side) = self.target else {
            return;
        };
        let destination = destination.split('#').next().unwrap_or_default().trim();
        if destination.is_empty() {
            return;
        }
        let entry_type = if !self.entry_type_sticks && self.entry_type == EntryTypeName::EnglishDef {
            EntryTypeName::EnglishDefWikiLink
        } else {
            self.entry_type
        };
        let key: String = destination.nfc().collect();
        self.add_key(side, &key, entry_type);
    }

    // ─────────────────────────────────────────────────────────────
    // Templates
    // ─────────────────────────────────────────────────────────────

    pub fn on_function(
        &mut self,
        name: &str,
        positional: &[String],
        named: &HashMap<String, String>,
    ) -> Result<(), MarkupError> {
        let name = name.trim();
        if let Some(paradigm) = conjugation::paradigm_for(name) {
            return self.on_conjugation(paradigm, positional, named);
        }
        match name {
            "l" | "ll" | "l-self" | "m" | "link" | "mention" | "term" => {
                self.on_link_template(positional, named)
            }
            "gloss" | "gl" => {
                if let Some(gloss) = positional.first() {
                    self.push_parenthetical(gloss);
                }
                Ok(())
            }
            "lb" | "lbl" | "label" | "context" | "cx" | "tlb" => {
                self.push_labels(positional.iter().skip(1));
                Ok(())
            }
            "q" | "qual" | "qualifier" | "i" | "sense" | "s" => {
                self.push_labels(positional.iter());
                Ok(())
            }
            "head" => {
                let lang = positional.first().map(String::as_str).unwrap_or_default();
                if self.language_code.is_match(lang.trim()) {
                    let rest = positional.get(2..).unwrap_or_default();
                    self.on_head(rest, named);
                }
                Ok(())
            }
            _ if FORM_OF_TEMPLATES.contains(&name) => {
                self.on_form_of(name, positional, named);
                Ok(())
            }
            _ => {
                match LANGUAGE_HEAD_TEMPLATE.captures(name) {
                    Some(cap) if self.language_code.is_match(&cap[1]) => {
                        self.on_language_head(positional, named)
                    }
                    _ => log::debug!("Ignoring template {{{{{}}}}} in {}", name, self.title),
                }
                Ok(())
            }
        }
    }

    /// `{{l|it|parola|alt|gloss}}`
    fn on_link_template(
        &mut self,
        positional: &[String],
        named: &HashMap<String, String>,
    ) -> Result<(), MarkupError> {
        let word = positional.get(1).map(String::as_str).unwrap_or_default();
        let display = match positional.get(2) {
            Some(alt) if !alt.is_empty() => alt.as_str(),
            _ => word,
        };
        self.dispatch(display)?;

        let gloss = positional
            .get(3)
            .filter(|g| !g.is_empty())
            .or_else(|| named.get("t"))
            .or_else(|| named.get("gloss"));
        if let Some(gloss) = gloss {
            self.push_parenthetical(&format!("\"{}\"", gloss));
        }
        Ok(())
    }

    /// `{{plural of|it|gatto}}`, `{{form of|it|past participle|fare}}`
    fn on_form_of(&mut self, name: &str, positional: &[String], named: &HashMap<String, String>) {
        self.form_of = true;
        // Old-style templates put the language in lang= and start with the lemma
        let args = if named.contains_key("lang") {
            positional
        } else {
            positional.get(1..).unwrap_or_default()
        };
        let (label, lemma) = if name == "form of" {
            (
                args.first().map(String::as_str).unwrap_or(name),
                args.get(1).map(String::as_str).unwrap_or_default(),
            )
        } else {
            (name, args.first().map(String::as_str).unwrap_or_default())
        };
        let lemma = lemma.split('#').next().unwrap_or_default().trim();
        self.text.push_str(label);
        if !lemma.is_empty() {
            self.text.push(' ');
            self.text.push_str(lemma);
        }
    }

    /// `{{head|it|noun|plural|gatti}}`: `rest` starts after the part of speech.
    fn on_head(&mut self, rest: &[String], named: &HashMap<String, String>) {
        self.push_headword(named);
        if let Some(gender) = named.get("g").filter(|g| !g.is_empty()) {
            self.text.push(' ');
            self.text.push_str(gender);
        }
        let mut parts = Vec::new();
        for chunk in rest.chunks(2) {
            let label = chunk[0].trim();
            match chunk.get(1).map(|f| f.trim()).filter(|f| !f.is_empty()) {
                Some(form) => {
                    self.word_forms.insert(form);
                    parts.push(format!("{} {}", label, form));
                }
                None if !label.is_empty() => parts.push(label.to_string()),
                None => {}
            }
        }
        if !parts.is_empty() {
            self.push_parenthetical(&parts.join(", "));
        }
    }

    /// `{{it-noun|gatt|m|o|i|f=gatta}}`: forms only come from named args,
    /// positional args are language-specific stems and endings.
    fn on_language_head(&mut self, positional: &[String], named: &HashMap<String, String>) {
        self.push_headword(named);
        if let Some(gender) = positional
            .iter()
            .chain(named.get("g"))
            .find(|arg| GENDERS.contains(&arg.as_str()))
        {
            self.text.push(' ');
            self.text.push_str(gender);
        }

        let mut form_args: Vec<(&String, &String)> = named
            .iter()
            .filter(|(key, value)| {
                !NON_FORM_ARGS.contains(&key.as_str())
                    && !value.is_empty()
                    && value.as_str() != "-"
            })
            .collect();
        form_args.sort();

        let mut parts = Vec::new();
        for (key, value) in form_args {
            self.word_forms.insert(value);
            parts.push(format!("{} {}", key, value));
        }
        if !parts.is_empty() {
            self.push_parenthetical(&parts.join(", "));
        }
    }

    /// `{{it-conj-are|parl|avere}}`: the table is not rendered, its forms
    /// become word forms of the block.
    fn on_conjugation(
        &mut self,
        paradigm: &Paradigm,
        positional: &[String],
        named: &HashMap<String, String>,
    ) -> Result<(), MarkupError> {
        let missing = |position: usize| MarkupError::MissingArgument {
            template: paradigm.template.to_string(),
            position,
        };
        let stem = positional
            .first()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| missing(1))?;
        let auxiliary = positional.get(1).ok_or_else(|| missing(2))?;

        let mut table: SlotTable = named.clone();
        paradigm.expand(stem, auxiliary, &mut table);
        for form in paradigm.forms(&table) {
            self.word_forms.insert(form);
        }
        Ok(())
    }

    fn push_headword(&mut self, named: &HashMap<String, String>) {
        let headword = named
            .get("head")
            .filter(|h| !h.is_empty())
            .cloned()
            .unwrap_or_else(|| self.title.clone());
        // head= may itself contain links
        let mut plain = String::new();
        let mut tokenizer = WikiTokenizer::new(&headword);
        while let Some(token) = tokenizer.next_token() {
            match token {
                Token::PlainText(text) | Token::WikiLink { text, .. } => plain.push_str(&text),
                _ => {}
            }
        }
        self.text.push_str(&plain);
        self.title_appended = true;
    }

    fn push_labels<'s>(&mut self, labels: impl Iterator<Item = &'s String>) {
        let labels: Vec<&str> = labels
            .map(|l| l.trim())
            .filter(|l| !l.is_empty() && *l != "_")
            .collect();
        if !labels.is_empty() {
            self.push_parenthetical(&labels.join(", "));
        }
    }

    fn push_parenthetical(&mut self, inner: &str) {
        if !self.text.is_empty() && !self.text.ends_with(char::is_whitespace) {
            self.text.push(' ');
        }
        self.text.push('(');
        self.text.push_str(inner);
        self.text.push(')');
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '\'' || c == '’' || c == '-'
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests for MarkupWriter
// ─────────────────────────────────────────────────────────────────────────────
