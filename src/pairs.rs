//! Turns one definition list section into a [`PairEntry`].
//!
//! The primary line becomes the definition pair. Nested lines are examples
//! and quotations whose prefix decides which side they belong to:
//!
//! | prefix          | meaning                                         |
//! |-----------------|-------------------------------------------------|
//! | `#:` with dash  | `foreign — english` on one line                 |
//! | `#:`            | foreign example, translation may follow          |
//! | `#::` / `#**`   | English translation of the preceding example     |
//! | `#*`            | foreign quotation                               |
//! | anything else   | foreign text, not indexed                       |

use crate::diagnostics::{
    DiagnosticSink, ENGLISH_EXAMPLE_WITHOUT_FOREIGN, PREFIX_TOO_LONG, UNPARSEABLE_DEFINITION,
};
use crate::foreign::{ForeignParser, ListSection};
use crate::index::Dictionary;
use crate::markup::{collapse_whitespace, MarkupWriter};
use crate::model::{EntryTypeName, IndexSide, Pair, PairEntry, WordForms, SENTINEL};

/// Checked in this order; the first one found splits the line.
const SEPARATORS: &[&str] = &["&mdash;", "—", " - "];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation<'a> {
    PairedExample { foreign: &'a str, english: &'a str },
    ForeignExample,
    EnglishTranslation,
    Quotation,
    Other,
}

pub fn classify_continuation<'a>(prefix: &str, line: &'a str) -> Continuation<'a> {
    match prefix {
        "#:" | "##:" => match split_at_separator(line) {
            Some((foreign, english)) => Continuation::PairedExample { foreign, english },
            None => Continuation::ForeignExample,
        },
        "#::" | "#**" => Continuation::EnglishTranslation,
        "#*" => Continuation::Quotation,
        _ => Continuation::Other,
    }
}

fn split_at_separator(line: &str) -> Option<(&str, &str)> {
    SEPARATORS.iter().find_map(|sep| {
        line.find(sep)
            .map(|at| (&line[..at], &line[at + sep.len()..]))
    })
}

/// The foreign line most recently recorded, waiting for a translation.
struct PendingForeign {
    line: String,
    /// Position of its pair in the entry, if it was kept
    pair_index: Option<usize>,
}

/// Appends `pair` when it carries any text and returns its position.
fn push_if_text(entry: &mut PairEntry, pair: Pair) -> Option<usize> {
    if !pair.has_text() {
        return None;
    }
    entry.pairs.push(pair);
    Some(entry.pairs.len() - 1)
}

impl<D: DiagnosticSink> ForeignParser<D> {
    pub(crate) fn build_list_section(
        &mut self,
        title: &str,
        foreign_text: &str,
        word_forms: &WordForms,
        section: &ListSection,
        dict: &mut Dictionary,
    ) {
        if section.first_prefix.chars().count() > 1 {
            let diagnostics = self.diagnostics_mut();
            diagnostics.warn(&format!("Prefix too long in {}: {}", title, section));
            diagnostics.increment(PREFIX_TOO_LONG);
            return;
        }

        let swap = self.config().swap;
        let mut entry = PairEntry::new(self.config().source_name.clone());
        let mut writer = MarkupWriter::new(title, &self.config().language_code);

        writer.retarget(Some(IndexSide::English), EntryTypeName::EnglishDef, false);
        if let Err(e) = writer.dispatch(&section.first_line) {
            let diagnostics = self.diagnostics_mut();
            diagnostics.warn(&format!(
                "Unparseable definition in {}: {} ({})",
                title, section.first_line, e
            ));
            diagnostics.increment(UNPARSEABLE_DEFINITION);
            return;
        }

        let english = collapse_whitespace(&writer.take_text());
        if !english.is_empty() {
            entry.pairs.push(Pair::new(english, foreign_text.trim(), swap));
            let title_type = if writer.is_form_of() {
                EntryTypeName::IsFormOfSomethingElse
            } else {
                EntryTypeName::TitleMulti
            };
            writer.add_key(IndexSide::Foreign, title, title_type);
            for form in word_forms.iter() {
                writer.add_key(IndexSide::Foreign, form, EntryTypeName::InflectedFormMulti);
            }
        }

        let mut pending: Option<PendingForeign> = None;
        for (prefix, line) in section.continuations() {
            match classify_continuation(prefix, line) {
                Continuation::PairedExample { foreign, english } => {
                    let english = writer.format_example(english, Some(IndexSide::English));
                    let foreign = writer.format_example(foreign, Some(IndexSide::Foreign));
                    push_if_text(&mut entry, Pair::new(english, foreign, swap));
                    pending = None;
                }
                Continuation::ForeignExample => {
                    let foreign = writer.format_example(line, Some(IndexSide::Foreign));
                    let pair_index = push_if_text(&mut entry, Pair::new(SENTINEL, foreign, swap));
                    pending = Some(PendingForeign {
                        line: line.to_string(),
                        pair_index,
                    });
                }
                Continuation::EnglishTranslation => {
                    match pending.take() {
                        Some(foreign_line) if !entry.pairs.is_empty() => {
                            // the foreign-only pair is replaced, wherever it sits
                            if let Some(index) = foreign_line.pair_index {
                                entry.pairs.remove(index);
                            }
                            let english = writer.format_example(line, Some(IndexSide::English));
                            // already indexed when it was first seen
                            let foreign = writer.format_example(&foreign_line.line, None);
                            push_if_text(&mut entry, Pair::new(english, foreign, swap));
                        }
                        unmatched => {
                            pending = unmatched;
                            let diagnostics = self.diagnostics_mut();
                            diagnostics.warn(&format!(
                                "English example with no foreign in {}: {}",
                                title, line
                            ));
                            diagnostics.increment(ENGLISH_EXAMPLE_WITHOUT_FOREIGN);
                            let english = writer.format_example(line, Some(IndexSide::English));
                            push_if_text(&mut entry, Pair::new(english, SENTINEL, swap));
                        }
                    }
                }
                Continuation::Quotation => {
                    let foreign = writer.format_example(line, None);
                    let pair_index = push_if_text(&mut entry, Pair::new(SENTINEL, foreign, swap));
                    pending = Some(PendingForeign {
                        line: line.to_string(),
                        pair_index,
                    });
                }
                Continuation::Other => {
                    let foreign = writer.format_example(line, None);
                    push_if_text(&mut entry, Pair::new(SENTINEL, foreign, swap));
                }
            }
        }

        if entry.pairs.is_empty() {
            log::debug!("No pairs in {}: {}", title, section);
            return;
        }
        dict.emit(entry, writer.take_keys());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests for the pair rules
// ─────────────────────────────────────────────────────────────────────────────
