//! Append-only key → entry indexes, one per language side.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::rc::Rc;

use serde::Serialize;

use crate::model::{EntryTypeName, IndexSide, IndexedEntry, PairEntry, PendingKey};

#[derive(Debug, Clone)]
pub struct IndexRow {
    pub entry: Rc<IndexedEntry>,
    pub entry_type: EntryTypeName,
}

/// Flat row shape for JSON Lines export
#[derive(Serialize)]
struct IndexRecord<'a> {
    index: &'a str,
    key: &'a str,
    #[serde(rename = "type")]
    entry_type: EntryTypeName,
    entry: usize,
}

#[derive(Debug)]
pub struct IndexBuilder {
    name: String,
    rows: BTreeMap<String, Vec<IndexRow>>,
    row_count: usize,
}

impl IndexBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        IndexBuilder {
            name: name.into(),
            rows: BTreeMap::new(),
            row_count: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Files `entry` under `key`. Keys are case-sensitive; repeated keys
    /// keep insertion order. Blank keys are dropped.
    pub fn add_entry_with_string(
        &mut self,
        entry: &Rc<IndexedEntry>,
        key: &str,
        entry_type: EntryTypeName,
    ) {
        let key = key.trim();
        if key.is_empty() {
            return;
        }
        self.rows.entry(key.to_string()).or_default().push(IndexRow {
            entry: Rc::clone(entry),
            entry_type,
        });
        self.row_count += 1;
    }

    /// Rows for `key` in insertion order
    pub fn rows_for(&self, key: &str) -> &[IndexRow] {
        self.rows.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rows for `key` ranked by entry type, insertion order within a rank.
    pub fn lookup(&self, key: &str) -> Vec<&IndexRow> {
        let mut rows: Vec<&IndexRow> = self.rows_for(key).iter().collect();
        rows.sort_by_key(|row| row.entry_type);
        rows
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn key_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// One JSON object per row, keys in sorted order.
    pub fn write_jsonl<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for (key, rows) in &self.rows {
            for row in rows {
                let record = IndexRecord {
                    index: &self.name,
                    key,
                    entry_type: row.entry_type,
                    entry: row.entry.id,
                };
                serde_json::to_writer(&mut *writer, &record)?;
                writeln!(writer)?;
            }
        }
        Ok(())
    }
}

/// The two indexes of a bilingual dictionary plus every entry emitted into
/// them.
#[derive(Debug)]
pub struct Dictionary {
    pub english: IndexBuilder,
    pub foreign: IndexBuilder,
    entries: Vec<Rc<IndexedEntry>>,
}

impl Dictionary {
    pub fn new(english_name: impl Into<String>, foreign_name: impl Into<String>) -> Self {
        Dictionary {
            english: IndexBuilder::new(english_name),
            foreign: IndexBuilder::new(foreign_name),
            entries: Vec::new(),
        }
    }

    pub fn index(&mut self, side: IndexSide) -> &mut IndexBuilder {
        match side {
            IndexSide::English => &mut self.english,
            IndexSide::Foreign => &mut self.foreign,
        }
    }

    /// Freezes a finished entry and files it under every collected key.
    pub fn emit(&mut self, entry: PairEntry, keys: Vec<PendingKey>) -> Rc<IndexedEntry> {
        let indexed = Rc::new(IndexedEntry {
            id: self.entries.len(),
            entry,
        });
        for pending in keys {
            self.index(pending.side)
                .add_entry_with_string(&indexed, &pending.key, pending.entry_type);
        }
        self.entries.push(Rc::clone(&indexed));
        indexed
    }

    pub fn entries(&self) -> &[Rc<IndexedEntry>] {
        &self.entries
    }

    pub fn write_entries_jsonl<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for entry in &self.entries {
            serde_json::to_writer(&mut *writer, entry.as_ref())?;
            writeln!(writer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod index_tests {
    use super::*;
    use crate::model::Pair;

    fn entry(id: usize, english: &str) -> Rc<IndexedEntry> {
        let mut pair_entry = PairEntry::new("test");
        pair_entry.pairs.push(Pair::new(english, "x", false));
        Rc::new(IndexedEntry { id, entry: pair_entry })
    }

    #[test]
    fn same_key_keeps_insertion_order() {
        let mut index = IndexBuilder::new("it");
        let a = entry(0, "a");
        let b = entry(1, "b");
        index.add_entry_with_string(&a, "fare", EntryTypeName::Example);
        index.add_entry_with_string(&b, "fare", EntryTypeName::Example);
        let ids: Vec<usize> = index.rows_for("fare").iter().map(|r| r.entry.id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn keys_are_case_sensitive_and_trimmed() {
        let mut index = IndexBuilder::new("it");
        let a = entry(0, "a");
        index.add_entry_with_string(&a, " Fare ", EntryTypeName::TitleMulti);
        index.add_entry_with_string(&a, "   ", EntryTypeName::TitleMulti);
        assert_eq!(index.rows_for("Fare").len(), 1);
        assert!(index.rows_for("fare").is_empty());
        assert_eq!(index.row_count(), 1);
    }

    #[test]
    fn lookup_ranks_headword_first() {
        let mut index = IndexBuilder::new("it");
        let form = entry(0, "form");
        let head = entry(1, "head");
        index.add_entry_with_string(&form, "fa", EntryTypeName::InflectedFormMulti);
        index.add_entry_with_string(&head, "fa", EntryTypeName::TitleMulti);
        let ranked: Vec<usize> = index.lookup("fa").iter().map(|r| r.entry.id).collect();
        assert_eq!(ranked, vec![1, 0]);
    }

    #[test]
    fn emit_shares_one_entry_across_keys() {
        let mut dict = Dictionary::new("en", "it");
        let mut pair_entry = PairEntry::new("test");
        pair_entry.pairs.push(Pair::new("cat", "gatto", false));
        let keys = vec![
            PendingKey {
                side: IndexSide::Foreign,
                key: "gatto".to_string(),
                entry_type: EntryTypeName::TitleMulti,
            },
            PendingKey {
                side: IndexSide::Foreign,
                key: "gatti".to_string(),
                entry_type: EntryTypeName::InflectedFormMulti,
            },
            PendingKey {
                side: IndexSide::English,
                key: "cat".to_string(),
                entry_type: EntryTypeName::EnglishDef,
            },
        ];
        let emitted = dict.emit(pair_entry, keys);
        assert!(Rc::ptr_eq(&dict.foreign.rows_for("gatto")[0].entry, &emitted));
        assert!(Rc::ptr_eq(&dict.foreign.rows_for("gatti")[0].entry, &emitted));
        assert!(Rc::ptr_eq(&dict.english.rows_for("cat")[0].entry, &emitted));
        assert_eq!(dict.entries().len(), 1);
    }

    #[test]
    fn index_rows_export_as_jsonl() {
        let mut index = IndexBuilder::new("it");
        index.add_entry_with_string(&entry(3, "a"), "fare", EntryTypeName::TitleMulti);
        let mut out = Vec::new();
        index.write_jsonl(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"index\":\"it\",\"key\":\"fare\",\"type\":\"title_multi\",\"entry\":3}\n"
        );
    }
}
