//! Foreign-language section parser.
//!
//! Walks the level-2 language sections of a page, finds the part-of-speech
//! blocks of the configured language and turns each of their definition
//! lists into [`PairEntry`](crate::model::PairEntry) records. The pair rules
//! themselves live in `pairs.rs`.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::ParserConfig;
use crate::diagnostics::{
    Counters, DiagnosticSink, FOREIGN_PART_OF_SPEECH, TEMPLATE_ERROR, TRANSLATIONS_NOT_IN_ENGLISH,
    UNEXPECTED_TOKEN,
};
use crate::index::Dictionary;
use crate::markup::MarkupWriter;
use crate::model::WordForms;
use crate::tokenizer::{Token, WikiTokenizer};

lazy_static! {
    static ref LANGUAGE_HEADING: Regex = Regex::new(r"(?m)^==[ \t]*([^=\n]+?)[ \t]*==[ \t]*$").unwrap();
}

/// One definition line and the list items nested under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSection {
    pub first_prefix: String,
    pub first_line: String,
    pub next_prefixes: Vec<String>,
    pub next_lines: Vec<String>,
}

impl ListSection {
    pub fn new(prefix: &str, line: &str) -> Self {
        ListSection {
            first_prefix: prefix.to_string(),
            first_line: line.to_string(),
            next_prefixes: Vec::new(),
            next_lines: Vec::new(),
        }
    }

    /// A list item belongs under this section when its prefix extends the
    /// section's own (`#` → `#:`, `#*`, `#::`).
    pub fn extends_prefix(&self, prefix: &str) -> bool {
        prefix.len() > self.first_prefix.len() && prefix.starts_with(self.first_prefix.as_str())
    }

    pub fn push_continuation(&mut self, prefix: &str, line: &str) {
        self.next_prefixes.push(prefix.to_string());
        self.next_lines.push(line.to_string());
    }

    pub fn continuations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.next_prefixes
            .iter()
            .map(String::as_str)
            .zip(self.next_lines.iter().map(String::as_str))
    }
}

impl fmt::Display for ListSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{{ {:?} }}", self.first_prefix, self.first_line, self.next_prefixes)
    }
}

/// How the part-of-speech loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockEnd {
    EndOfInput,
    /// A heading at or above the block's level; the tokenizer is rewound so
    /// the section loop sees it again.
    Heading,
}

struct PartOfSpeechBlock {
    lang: String,
    head: MarkupWriter,
    list_sections: Vec<ListSection>,
}

pub struct ForeignParser<D: DiagnosticSink = Counters> {
    config: ParserConfig,
    diagnostics: D,
    foreign_count: usize,
}

impl<D: DiagnosticSink> ForeignParser<D> {
    pub fn new(config: ParserConfig, diagnostics: D) -> Self {
        ForeignParser {
            config,
            diagnostics,
            foreign_count: 0,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> D {
        self.diagnostics
    }

    /// Part-of-speech blocks seen so far
    pub fn foreign_count(&self) -> usize {
        self.foreign_count
    }

    pub(crate) fn diagnostics_mut(&mut self) -> &mut D {
        &mut self.diagnostics
    }

    /// Parses every level-2 language section of a page.
    pub fn parse_page(&mut self, title: &str, text: &str, dict: &mut Dictionary) {
        if self.config.is_ignorable_title(title) {
            return;
        }
        let headings: Vec<(usize, usize, &str)> = LANGUAGE_HEADING
            .captures_iter(text)
            .filter_map(|cap| {
                let whole = cap.get(0)?;
                Some((whole.start(), whole.end(), whole.as_str()))
            })
            .collect();

        for (i, &(_, body_start, heading)) in headings.iter().enumerate() {
            let body_end = headings.get(i + 1).map(|h| h.0).unwrap_or(text.len());
            self.parse_section(title, heading, &text[body_start..body_end], dict);
        }
    }

    /// Parses the body of one language section. Sections of other languages
    /// are skipped.
    pub fn parse_section(&mut self, title: &str, heading: &str, text: &str, dict: &mut Dictionary) {
        if self.config.is_ignorable_title(title) {
            return;
        }
        let lang = heading.replace('=', "").trim().to_string();
        if !self.config.language.is_match(&lang) {
            return;
        }

        let mut tokenizer = WikiTokenizer::new(text);
        while let Some(token) = tokenizer.next_token() {
            let Token::Heading {
                depth,
                text: heading_name,
            } = token
            else {
                continue;
            };
            if heading_name == "Translations" {
                self.diagnostics
                    .warn(&format!("Translations not in English section: {}", title));
                self.diagnostics.increment(TRANSLATIONS_NOT_IN_ENGLISH);
            } else if heading_name == "Pronunciation" {
                log::trace!("Skipping pronunciation of {}", title);
            } else if self.config.part_of_speech.is_match(&heading_name) {
                self.parse_part_of_speech(title, &lang, &heading_name, depth, &mut tokenizer, dict);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Part-of-speech blocks
    // ─────────────────────────────────────────────────────────────

    fn parse_part_of_speech(
        &mut self,
        title: &str,
        lang: &str,
        pos: &str,
        pos_depth: usize,
        tokenizer: &mut WikiTokenizer<'_>,
        dict: &mut Dictionary,
    ) {
        self.foreign_count += 1;
        self.diagnostics.increment(FOREIGN_PART_OF_SPEECH);
        if self.foreign_count % 1000 == 0 {
            log::info!("***{}, {}, pos={}, foreignCount={}", title, lang, pos, self.foreign_count);
        }

        let mut block = PartOfSpeechBlock {
            lang: lang.to_string(),
            head: MarkupWriter::new(title, &self.config.language_code),
            list_sections: Vec::new(),
        };
        let end = self.collect_block(title, pos_depth, &mut block, tokenizer);
        log::trace!("{} ({}) ended at {:?}", title, pos, end);
        // Every way out of the loop ends up here
        self.finish_block(title, block, dict);
    }

    fn collect_block(
        &mut self,
        title: &str,
        pos_depth: usize,
        block: &mut PartOfSpeechBlock,
        tokenizer: &mut WikiTokenizer<'_>,
    ) -> BlockEnd {
        let mut current_depth = pos_depth;
        while let Some(token) = tokenizer.next_token() {
            if let Token::Heading { depth, .. } = token {
                current_depth = depth;
                if current_depth <= pos_depth {
                    tokenizer.return_to_line_start();
                    return BlockEnd::Heading;
                }
            }
            // Usage notes, synonyms and the like
            if current_depth > pos_depth {
                continue;
            }

            match token {
                Token::Function {
                    name,
                    positional,
                    named,
                } => {
                    if let Err(e) = block.head.on_function(&name, &positional, &named) {
                        self.diagnostics
                            .warn(&format!("Template error in {}: {}", title, e));
                        self.diagnostics.increment(TEMPLATE_ERROR);
                    }
                }
                Token::ListItem { prefix, text } => match block.list_sections.last_mut() {
                    Some(open) if open.extends_prefix(&prefix) => {
                        open.push_continuation(&prefix, &text)
                    }
                    _ => block.list_sections.push(ListSection::new(&prefix, &text)),
                },
                // Trailing text after the definitions is not part of the head
                _ if !block.list_sections.is_empty() => {}
                Token::WikiLink { text, .. } | Token::PlainText(text) => {
                    block.head.push_str(&text)
                }
                Token::Markup(_) | Token::Newline | Token::Comment(_) => {}
                other => {
                    self.diagnostics
                        .warn(&format!("Unexpected token in {}: {:?}", title, other));
                    self.diagnostics.increment(UNEXPECTED_TOKEN);
                }
            }
        }
        BlockEnd::EndOfInput
    }

    fn finish_block(&mut self, title: &str, block: PartOfSpeechBlock, dict: &mut Dictionary) {
        let PartOfSpeechBlock {
            lang,
            mut head,
            list_sections,
        } = block;

        let mut foreign = head.text().trim().to_string();
        if !head.title_appended() && !foreign.to_lowercase().starts_with(&title.to_lowercase()) {
            foreign = format!("{} {}", title, foreign);
        }
        if !self.config.canonical_language.is_match(&lang) {
            foreign = format!("({}) {}", lang, foreign);
        }
        let foreign = foreign.trim();
        let word_forms: WordForms = head.take_word_forms();

        for section in &list_sections {
            self.build_list_section(title, foreign, &word_forms, section, dict);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests for ForeignParser
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod foreign_parser_tests {
    use super::*;
    use crate::diagnostics::{PREFIX_TOO_LONG, UNPARSEABLE_DEFINITION};
    use crate::model::{EntryTypeName, Pair, SENTINEL};

    fn parse(title: &str, page: &str) -> (Dictionary, Counters) {
        let mut parser = ForeignParser::new(ParserConfig::italian().unwrap(), Counters::new());
        let mut dict = Dictionary::new("en", "it");
        parser.parse_page(title, page, &mut dict);
        (dict, parser.into_diagnostics())
    }

    fn pairs(dict: &Dictionary) -> Vec<Vec<(&str, &str)>> {
        dict.entries()
            .iter()
            .map(|e| {
                e.entry
                    .pairs
                    .iter()
                    .map(|p| (p.english.as_str(), p.foreign.as_str()))
                    .collect()
            })
            .collect()
    }

    const FARE: &str = "\
==Italian==

===Etymology===
From Latin facere.

===Verb===
'''fare'''

# to [[do]]
#: Faccio i compiti. — I do my homework.
# to [[make]]

====Conjugation====
{{it-conj-are|f|avere}}

===Anagrams===
* [[fera]]

==Spanish==

===Verb===
'''fare'''
# not Italian
";

    // ─────────────────────────────────────────────────────────────
    // ListSection
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn list_section_prefix_nesting() {
        let section = ListSection::new("#", "to do");
        assert!(section.extends_prefix("#:"));
        assert!(section.extends_prefix("#*:"));
        assert!(!section.extends_prefix("#"));
        assert!(!section.extends_prefix("*:"));
    }

    #[test]
    fn list_section_display() {
        let mut section = ListSection::new("#", "to do");
        section.push_continuation("#:", "x");
        assert_eq!(section.to_string(), "#to do{ [\"#:\"] }");
    }

    // ─────────────────────────────────────────────────────────────
    // Pages
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn fare_end_to_end() {
        let (dict, counters) = parse("fare", FARE);
        assert_eq!(
            pairs(&dict),
            vec![
                vec![
                    ("to do", "fare"),
                    ("I do my homework.", "Faccio i compiti."),
                ],
                vec![("to make", "fare")],
            ]
        );
        assert_eq!(counters.get(FOREIGN_PART_OF_SPEECH), 1);
        assert_eq!(counters.warnings(), 0);
        assert!(dict.entries().iter().all(|e| e.entry.source == "enwiktionary.italian"));

        let title_rows = dict.foreign.lookup("fare");
        assert_eq!(title_rows.len(), 2);
        assert!(title_rows.iter().all(|r| r.entry_type == EntryTypeName::TitleMulti));

        let do_rows = dict.english.lookup("do");
        assert_eq!(do_rows[0].entry_type, EntryTypeName::EnglishDefWikiLink);
        assert_eq!(do_rows[0].entry.id, 0);
        assert!(dict.foreign.lookup("compiti")[0].entry_type == EntryTypeName::Example);
        assert!(dict.english.lookup("homework")[0].entry_type == EntryTypeName::Example);
    }

    #[test]
    fn other_languages_ignored() {
        let (dict, _) = parse("fare", FARE);
        assert!(dict.english.lookup("Italian").is_empty());
        assert!(dict.entries().iter().all(|e| e.entry.pairs[0].english != "not Italian"));
    }

    #[test]
    fn ignorable_title_skipped() {
        let (dict, counters) = parse("Template:it-noun", FARE);
        assert!(dict.entries().is_empty());
        assert_eq!(counters.get(FOREIGN_PART_OF_SPEECH), 0);
    }

    #[test]
    fn heading_ends_block_and_is_reprocessed() {
        let page = "\
==Italian==
===Noun===
{{it-noun|amic|m|o|i|f=amica}}
# [[friend]]
===Adjective===
'''amico'''
# [[friendly]]
";
        let (dict, counters) = parse("amico", page);
        assert_eq!(counters.get(FOREIGN_PART_OF_SPEECH), 2);
        assert_eq!(
            pairs(&dict),
            vec![
                vec![("friend", "amico m (f amica)")],
                vec![("friendly", "amico")],
            ]
        );
        // the noun's forms do not leak into the adjective
        let amica = dict.foreign.lookup("amica");
        assert_eq!(amica.len(), 1);
        assert_eq!(amica[0].entry_type, EntryTypeName::InflectedFormMulti);
        assert_eq!(amica[0].entry.id, 0);
    }

    #[test]
    fn conjugation_forms_registered_once_per_entry() {
        let page = "\
==Italian==
===Verb===
{{it-verb}}
# to [[speak]]
# to [[talk]]
{{it-conj-are|parl|avere}}
";
        let (dict, counters) = parse("parlare", page);
        assert_eq!(counters.get(TEMPLATE_ERROR), 0);
        assert_eq!(dict.entries().len(), 2);
        let rows = dict.foreign.lookup("parlo");
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.entry_type == EntryTypeName::InflectedFormMulti));
        // the infinitive is the title, ranked first
        let title = dict.foreign.lookup("parlare");
        assert_eq!(title[0].entry_type, EntryTypeName::TitleMulti);
    }

    #[test]
    fn non_canonical_language_prefixed() {
        let page = "==Old Italian==\n===Noun===\n'''cosa'''\n# thing\n";
        let (dict, _) = parse("cosa", page);
        assert_eq!(pairs(&dict), vec![vec![("thing", "(Old Italian) cosa")]]);
    }

    #[test]
    fn title_prepended_when_missing() {
        let page = "==Italian==\n===Noun===\n''m''\n# thing\n";
        let (dict, _) = parse("cosa", page);
        assert_eq!(pairs(&dict), vec![vec![("thing", "cosa m")]]);
    }

    #[test]
    fn head_text_trimmed_not_collapsed() {
        let page = "==Italian==\n===Noun===\n'''casa'''  ''f''  \n# house\n";
        let (dict, _) = parse("casa", page);
        assert_eq!(pairs(&dict), vec![vec![("house", "casa  f")]]);
    }

    #[test]
    fn multibyte_tag_does_not_abort_page() {
        let page = "==Italian==\n===Noun===\n'''casa''' <noè>\n# house\n";
        let (dict, counters) = parse("casa", page);
        assert_eq!(pairs(&dict), vec![vec![("house", "casa")]]);
        assert_eq!(counters.get(UNEXPECTED_TOKEN), 1);
    }

    #[test]
    fn form_of_definition_tagged() {
        let page = "==Italian==\n===Noun===\n{{head|it|noun form}}\n# {{plural of|it|gatto}}\n";
        let (dict, _) = parse("gatti", page);
        assert_eq!(pairs(&dict), vec![vec![("plural of gatto", "gatti")]]);
        let rows = dict.foreign.lookup("gatti");
        assert_eq!(rows[0].entry_type, EntryTypeName::IsFormOfSomethingElse);
    }

    #[test]
    fn translations_heading_warns() {
        let page = "==Italian==\n===Noun===\n'''casa'''\n# house\n===Translations===\n* xyz\n";
        let (dict, counters) = parse("casa", page);
        assert_eq!(counters.get(TRANSLATIONS_NOT_IN_ENGLISH), 1);
        assert_eq!(dict.entries().len(), 1);
    }

    #[test]
    fn html_in_head_is_unexpected() {
        let page = "==Italian==\n===Noun===\n'''casa''' <span>x</span>\n# house\n";
        let (dict, counters) = parse("casa", page);
        assert_eq!(counters.get(UNEXPECTED_TOKEN), 2);
        assert_eq!(pairs(&dict), vec![vec![("house", "casa x")]]);
    }

    #[test]
    fn template_error_is_counted() {
        let page = "==Italian==\n===Verb===\n'''fare'''\n{{it-conj-are}}\n# to do\n";
        let (dict, counters) = parse("fare", page);
        assert_eq!(counters.get(TEMPLATE_ERROR), 1);
        assert_eq!(pairs(&dict), vec![vec![("to do", "fare")]]);
    }

    #[test]
    fn prefix_too_long_section_dropped() {
        let page = "==Italian==\n===Noun===\n'''casa'''\n## house\n# home\n";
        let (dict, counters) = parse("casa", page);
        assert_eq!(counters.get(PREFIX_TOO_LONG), 1);
        assert_eq!(pairs(&dict), vec![vec![("home", "casa")]]);
    }

    #[test]
    fn unparseable_definition_skipped() {
        let page = "==Italian==\n===Noun===\n'''casa'''\n# a [[house\n";
        let (dict, counters) = parse("casa", page);
        assert_eq!(counters.get(UNPARSEABLE_DEFINITION), 1);
        assert!(dict.entries().is_empty());
    }

    #[test]
    fn empty_definition_keeps_examples() {
        let page = "==Italian==\n===Noun===\n'''casa'''\n# <!-- rfdef -->\n#: La casa è grande.\n";
        let (dict, _) = parse("casa", page);
        assert_eq!(pairs(&dict), vec![vec![(SENTINEL, "La casa è grande.")]]);
        // no definition, so no title key
        assert!(dict.foreign.lookup("casa").iter().all(|r| r.entry_type == EntryTypeName::Example));
    }

    #[test]
    fn swap_flag_carried_to_pairs() {
        let mut config = ParserConfig::italian().unwrap();
        config.swap = true;
        let mut parser = ForeignParser::new(config, Counters::new());
        let mut dict = Dictionary::new("en", "it");
        parser.parse_page("casa", "==Italian==\n===Noun===\n# house\n", &mut dict);
        assert_eq!(dict.entries()[0].entry.pairs, vec![Pair::new("house", "casa", true)]);
    }
}
