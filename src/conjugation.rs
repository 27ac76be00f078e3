//! Regular verb paradigms used to fill conjugation tables.
//!
//! A conjugation template such as `{{it-conj-are|parl|avere}}` names a stem
//! and an auxiliary. Every slot the template does not set explicitly is
//! derived as `stem + suffix`; explicit values (irregular forms) win.

use std::collections::HashMap;

/// Named conjugation slots, e.g. `pres1s → parlo`. Same shape as a template's
/// named arguments so those can be expanded in place.
pub type SlotTable = HashMap<String, String>;

/// Slot that receives the auxiliary verb rather than a derived form.
pub const AUX_SLOT: &str = "aux";

pub struct Paradigm {
    /// Template name that selects this paradigm
    pub template: &'static str,
    /// `(slot, suffix)` in table order
    pub suffixes: &'static [(&'static str, &'static str)],
    /// Hook for stems that deviate further than explicit overrides cover.
    pub irregular: fn(&str, &mut SlotTable),
}

fn no_irregular_forms(_stem: &str, _table: &mut SlotTable) {}

/// Italian first conjugation (parlare)
static IT_ARE: &[(&str, &str)] = &[
    ("inf", "are"),
    ("ger", "ando"),
    ("presp", "ante"),
    ("pastp", "ato"),
    // Present
    ("pres1s", "o"),
    ("pres2s", "i"),
    ("pres3s", "a"),
    ("pres1p", "iamo"),
    ("pres2p", "ate"),
    ("pres3p", "ano"),
    // Imperfect
    ("imperf1s", "avo"),
    ("imperf2s", "avi"),
    ("imperf3s", "ava"),
    ("imperf1p", "avamo"),
    ("imperf2p", "avate"),
    ("imperf3p", "avano"),
    // Passato remoto
    ("prem1s", "ai"),
    ("prem2s", "asti"),
    ("prem3s", "ò"),
    ("prem1p", "ammo"),
    ("prem2p", "aste"),
    ("prem3p", "arono"),
    // Future
    ("fut1s", "erò"),
    ("fut2s", "erai"),
    ("fut3s", "erà"),
    ("fut1p", "eremo"),
    ("fut2p", "erete"),
    ("fut3p", "eranno"),
    // Conditional
    ("cond1s", "erei"),
    ("cond2s", "eresti"),
    ("cond3s", "erebbe"),
    ("cond1p", "eremmo"),
    ("cond2p", "ereste"),
    ("cond3p", "erebbero"),
    // Subjunctive
    ("sub123s", "i"),
    ("sub1p", "iamo"),
    ("sub2p", "iate"),
    ("sub3p", "ino"),
    // Imperfect subjunctive
    ("impsub12s", "assi"),
    ("impsub3s", "asse"),
    ("impsub1p", "assimo"),
    ("impsub2p", "aste"),
    ("impsub3p", "assero"),
    // Imperative
    ("imp2s", "a"),
    ("imp3s", "i"),
    ("imp1p", "iamo"),
    ("imp2p", "ate"),
    ("imp3p", "ino"),
];

/// Italian second conjugation (credere)
static IT_ERE: &[(&str, &str)] = &[
    ("inf", "ere"),
    ("ger", "endo"),
    ("presp", "ente"),
    ("pastp", "uto"),
    ("pres1s", "o"),
    ("pres2s", "i"),
    ("pres3s", "e"),
    ("pres1p", "iamo"),
    ("pres2p", "ete"),
    ("pres3p", "ono"),
    ("imperf1s", "evo"),
    ("imperf2s", "evi"),
    ("imperf3s", "eva"),
    ("imperf1p", "evamo"),
    ("imperf2p", "evate"),
    ("imperf3p", "evano"),
    ("prem1s", "ei"),
    ("prem2s", "esti"),
    ("prem3s", "é"),
    ("prem1p", "emmo"),
    ("prem2p", "este"),
    ("prem3p", "erono"),
    ("fut1s", "erò"),
    ("fut2s", "erai"),
    ("fut3s", "erà"),
    ("fut1p", "eremo"),
    ("fut2p", "erete"),
    ("fut3p", "eranno"),
    ("cond1s", "erei"),
    ("cond2s", "eresti"),
    ("cond3s", "erebbe"),
    ("cond1p", "eremmo"),
    ("cond2p", "ereste"),
    ("cond3p", "erebbero"),
    ("sub123s", "a"),
    ("sub1p", "iamo"),
    ("sub2p", "iate"),
    ("sub3p", "ano"),
    ("impsub12s", "essi"),
    ("impsub3s", "esse"),
    ("impsub1p", "essimo"),
    ("impsub2p", "este"),
    ("impsub3p", "essero"),
    ("imp2s", "i"),
    ("imp3s", "a"),
    ("imp1p", "iamo"),
    ("imp2p", "ete"),
    ("imp3p", "ano"),
];

/// Italian third conjugation without -isc- (dormire)
static IT_IRE: &[(&str, &str)] = &[
    ("inf", "ire"),
    ("ger", "endo"),
    ("presp", "ente"),
    ("pastp", "ito"),
    ("pres1s", "o"),
    ("pres2s", "i"),
    ("pres3s", "e"),
    ("pres1p", "iamo"),
    ("pres2p", "ite"),
    ("pres3p", "ono"),
    ("imperf1s", "ivo"),
    ("imperf2s", "ivi"),
    ("imperf3s", "iva"),
    ("imperf1p", "ivamo"),
    ("imperf2p", "ivate"),
    ("imperf3p", "ivano"),
    ("prem1s", "ii"),
    ("prem2s", "isti"),
    ("prem3s", "ì"),
    ("prem1p", "immo"),
    ("prem2p", "iste"),
    ("prem3p", "irono"),
    ("fut1s", "irò"),
    ("fut2s", "irai"),
    ("fut3s", "irà"),
    ("fut1p", "iremo"),
    ("fut2p", "irete"),
    ("fut3p", "iranno"),
    ("cond1s", "irei"),
    ("cond2s", "iresti"),
    ("cond3s", "irebbe"),
    ("cond1p", "iremmo"),
    ("cond2p", "ireste"),
    ("cond3p", "irebbero"),
    ("sub123s", "a"),
    ("sub1p", "iamo"),
    ("sub2p", "iate"),
    ("sub3p", "ano"),
    ("impsub12s", "issi"),
    ("impsub3s", "isse"),
    ("impsub1p", "issimo"),
    ("impsub2p", "iste"),
    ("impsub3p", "issero"),
    ("imp2s", "i"),
    ("imp3s", "a"),
    ("imp1p", "iamo"),
    ("imp2p", "ite"),
    ("imp3p", "ano"),
];

static PARADIGMS: &[Paradigm] = &[
    Paradigm {
        template: "it-conj-are",
        suffixes: IT_ARE,
        irregular: no_irregular_forms,
    },
    Paradigm {
        template: "it-conj-ere",
        suffixes: IT_ERE,
        irregular: no_irregular_forms,
    },
    Paradigm {
        template: "it-conj-ire",
        suffixes: IT_IRE,
        irregular: no_irregular_forms,
    },
];

/// Paradigm selected by a conjugation template name, if any.
pub fn paradigm_for(template: &str) -> Option<&'static Paradigm> {
    PARADIGMS.iter().find(|p| p.template == template)
}

impl Paradigm {
    /// Slot names in table order, `aux` included.
    pub fn slots(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(AUX_SLOT).chain(self.suffixes.iter().map(|(slot, _)| *slot))
    }

    /// Fills every empty slot of `table` from `stem` and `auxiliary`, then
    /// applies the irregular hook. Slots that already hold a value are left
    /// untouched, except `''` which marks a form that does not exist.
    pub fn expand(&self, stem: &str, auxiliary: &str, table: &mut SlotTable) {
        put_if_missing(table, AUX_SLOT, auxiliary);
        for (slot, suffix) in self.suffixes {
            let form = format!("{}{}", stem, suffix);
            put_if_missing(table, slot, &form);
            // a '' marker empties the slot
            put_or_nullify(table, slot, &form);
        }
        (self.irregular)(stem, table);
    }

    /// Derived forms in table order, `aux` excluded. Empty slots (explicitly
    /// nullified ones) are skipped.
    pub fn forms<'t>(&self, table: &'t SlotTable) -> Vec<&'t str> {
        self.suffixes
            .iter()
            .filter_map(|(slot, _)| table.get(*slot))
            .map(String::as_str)
            .filter(|form| !form.is_empty())
            .collect()
    }
}

/// Sets `key` unless it already holds a non-empty value.
pub fn put_if_missing(table: &mut SlotTable, key: &str, value: &str) {
    match table.get(key) {
        Some(old) if !old.is_empty() => {}
        _ => {
            table.insert(key.to_string(), value.to_string());
        }
    }
}

/// Sets `key` when absent; an explicit `''` marks the slot as intentionally
/// empty.
pub fn put_or_nullify(table: &mut SlotTable, key: &str, value: &str) {
    match table.get(key).map(String::as_str) {
        None => {
            table.insert(key.to_string(), value.to_string());
        }
        Some("''") => {
            table.insert(key.to_string(), String::new());
        }
        Some(_) => {}
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests for conjugation expansion
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod conjugation_tests {
    use super::*;

    fn expanded(template: &str, stem: &str, aux: &str) -> SlotTable {
        let mut table = SlotTable::new();
        paradigm_for(template).unwrap().expand(stem, aux, &mut table);
        table
    }

    #[test]
    fn parlare_regular_slots() {
        let table = expanded("it-conj-are", "parl", "avere");
        assert_eq!(table["pres1s"], "parlo");
        assert_eq!(table["inf"], "parlare");
        assert_eq!(table["fut3s"], "parlerà");
        assert_eq!(table["aux"], "avere");
        assert_eq!(table["impsub3p"], "parlassero");
    }

    #[test]
    fn are_table_has_every_slot() {
        let paradigm = paradigm_for("it-conj-are").unwrap();
        let table = expanded("it-conj-are", "parl", "avere");
        assert_eq!(paradigm.slots().count(), 49);
        assert_eq!(table.len(), 49);
    }

    #[test]
    fn explicit_slots_win() {
        let mut table = SlotTable::new();
        table.insert("pres1s".to_string(), "vado".to_string());
        table.insert("pres2s".to_string(), String::new());
        paradigm_for("it-conj-are")
            .unwrap()
            .expand("and", "essere", &mut table);
        assert_eq!(table["pres1s"], "vado");
        // empty counts as missing
        assert_eq!(table["pres2s"], "andi");
        assert_eq!(table["aux"], "essere");
    }

    #[test]
    fn ere_and_ire_paradigms() {
        let credere = expanded("it-conj-ere", "cred", "avere");
        assert_eq!(credere["pastp"], "creduto");
        assert_eq!(credere["pres3p"], "credono");
        let dormire = expanded("it-conj-ire", "dorm", "avere");
        assert_eq!(dormire["prem3s"], "dormì");
        assert_eq!(dormire["imperf1s"], "dormivo");
    }

    #[test]
    fn unknown_template_has_no_paradigm() {
        assert!(paradigm_for("it-noun").is_none());
    }

    #[test]
    fn forms_skip_aux_and_nullified() {
        let paradigm = paradigm_for("it-conj-are").unwrap();
        let mut table = SlotTable::new();
        table.insert("imp2s".to_string(), "''".to_string());
        paradigm.expand("parl", "avere", &mut table);
        let forms = paradigm.forms(&table);
        assert!(!forms.contains(&"avere"));
        assert_eq!(forms[0], "parlare");
        // imp2s stays empty, nothing else produced "parla" except pres3s
        assert_eq!(forms.iter().filter(|f| **f == "parla").count(), 1);
        assert_eq!(table["imp2s"], "");
    }

    #[test]
    fn put_or_nullify_keeps_existing() {
        let mut table = SlotTable::new();
        put_or_nullify(&mut table, "inf", "fare");
        put_or_nullify(&mut table, "inf", "dire");
        assert_eq!(table["inf"], "fare");
    }
}
