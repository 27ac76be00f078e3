//! Warning and counter sink shared by the parser stages.

use std::collections::BTreeMap;

pub const TRANSLATIONS_NOT_IN_ENGLISH: &str = "WARNING: Translations not in English section";
pub const PREFIX_TOO_LONG: &str = "WARNING: Prefix too long";
pub const ENGLISH_EXAMPLE_WITHOUT_FOREIGN: &str = "WARNING: English example with no foreign";
pub const UNEXPECTED_TOKEN: &str = "WARNING: Unexpected token";
pub const UNPARSEABLE_DEFINITION: &str = "WARNING: Unparseable definition";
pub const TEMPLATE_ERROR: &str = "WARNING: Template error";
pub const FOREIGN_PART_OF_SPEECH: &str = "Foreign part of speech";

/// Where the parser reports low-confidence matches.
///
/// Warnings never abort parsing; they are paired with a named counter so a
/// run can be summarised at the end.
pub trait DiagnosticSink {
    fn warn(&mut self, message: &str);
    fn increment(&mut self, counter: &str);
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for &mut T {
    fn warn(&mut self, message: &str) {
        (**self).warn(message)
    }

    fn increment(&mut self, counter: &str) {
        (**self).increment(counter)
    }
}

/// Default sink: forwards warnings to the `log` facade and keeps counts.
#[derive(Debug, Default)]
pub struct Counters {
    counts: BTreeMap<String, usize>,
    warnings: usize,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, counter: &str) -> usize {
        self.counts.get(counter).copied().unwrap_or(0)
    }

    pub fn warnings(&self) -> usize {
        self.warnings
    }

    /// Counters in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl DiagnosticSink for Counters {
    fn warn(&mut self, message: &str) {
        self.warnings += 1;
        log::warn!("{}", message);
    }

    fn increment(&mut self, counter: &str) {
        *self.counts.entry(counter.to_string()).or_insert(0) += 1;
    }
}

#[cfg(test)]
mod diagnostics_tests {
    use super::*;

    #[test]
    fn counts_accumulate_per_name() {
        let mut counters = Counters::new();
        counters.increment(PREFIX_TOO_LONG);
        counters.increment(PREFIX_TOO_LONG);
        counters.increment(UNEXPECTED_TOKEN);
        assert_eq!(counters.get(PREFIX_TOO_LONG), 2);
        assert_eq!(counters.get(UNEXPECTED_TOKEN), 1);
        assert_eq!(counters.get(TEMPLATE_ERROR), 0);
    }

    fn report<D: DiagnosticSink>(mut sink: D) {
        sink.warn("first");
        sink.warn("second");
        sink.increment(UNEXPECTED_TOKEN);
    }

    #[test]
    fn warnings_counted_through_mut_ref() {
        let mut counters = Counters::new();
        report(&mut counters);
        assert_eq!(counters.warnings(), 2);
        assert_eq!(
            counters.iter().collect::<Vec<_>>(),
            vec![(UNEXPECTED_TOKEN, 1)]
        );
    }
}
