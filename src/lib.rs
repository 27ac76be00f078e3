//! Bilingual dictionary extraction from English Wiktionary dumps.
//!
//! Pages are split into language sections, the part-of-speech blocks of one
//! configured foreign language are read, and every definition list becomes
//! an entry of English/foreign pairs filed under both language indexes.

pub mod config;
pub mod conjugation;
pub mod diagnostics;
pub mod dump;
pub mod error;
pub mod foreign;
pub mod index;
pub mod markup;
pub mod model;
mod pairs;
pub mod tokenizer;

pub use config::ParserConfig;
pub use diagnostics::{Counters, DiagnosticSink};
pub use error::{Error, Result};
pub use foreign::{ForeignParser, ListSection};
pub use index::{Dictionary, IndexBuilder, IndexRow};
pub use markup::{MarkupError, MarkupWriter};
pub use model::{EntryTypeName, IndexSide, IndexedEntry, Pair, PairEntry, SENTINEL};
pub use pairs::{classify_continuation, Continuation};
