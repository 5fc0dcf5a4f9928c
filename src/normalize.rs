use std::collections::HashMap;
use std::fmt;

use crate::languages::{ENGLISH, SPANISH, same_lang};
use crate::rows::NormalizedRow;
use crate::tatoeba::{RawRecord, Variant, collect_variants};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    MissingSpanish,
    MissingEnglish,
    EmptyText,
    MissingId,
    Malformed,
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DiscardReason::MissingSpanish => "no Spanish variant",
            DiscardReason::MissingEnglish => "no English variant",
            DiscardReason::EmptyText => "empty sentence text",
            DiscardReason::MissingId => "no identifier",
            DiscardReason::Malformed => "not a record object",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscardStats {
    pub missing_spanish: usize,
    pub missing_english: usize,
    pub empty_text: usize,
    pub missing_id: usize,
    pub malformed: usize,
}

impl DiscardStats {
    pub fn record(&mut self, reason: DiscardReason) {
        match reason {
            DiscardReason::MissingSpanish => self.missing_spanish += 1,
            DiscardReason::MissingEnglish => self.missing_english += 1,
            DiscardReason::EmptyText => self.empty_text += 1,
            DiscardReason::MissingId => self.missing_id += 1,
            DiscardReason::Malformed => self.malformed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.missing_spanish
            + self.missing_english
            + self.empty_text
            + self.missing_id
            + self.malformed
    }
}

/// Picks the Spanish and English sentences out of a record.
///
/// The identifier prefers the Spanish variant, then the English one, then the
/// record itself. A row may come back without an identifier; [`RowSet`]
/// refuses those.
pub fn try_normalize(record: &RawRecord) -> Result<NormalizedRow, DiscardReason> {
    let variants = collect_variants(record);
    let spanish = find_lang(&variants, SPANISH).ok_or(DiscardReason::MissingSpanish)?;
    let english = find_lang(&variants, ENGLISH).ok_or(DiscardReason::MissingEnglish)?;

    let tatoeba_id = spanish
        .id
        .or(english.id)
        .or_else(|| record.record_id());
    NormalizedRow::new(tatoeba_id, &spanish.text, &english.text).ok_or(DiscardReason::EmptyText)
}

pub fn normalize(record: &RawRecord) -> Option<NormalizedRow> {
    try_normalize(record).ok()
}

fn find_lang<'a>(variants: &'a [Variant], lang: &str) -> Option<&'a Variant> {
    variants
        .iter()
        .find(|variant| same_lang(&variant.lang, lang))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Added,
    Replaced,
    Full,
    MissingId,
}

/// Rows keyed by Tatoeba id for one fetch session.
///
/// A repeated id overwrites the earlier row in place; new ids are refused
/// once `capacity` rows are held.
#[derive(Debug)]
pub struct RowSet {
    capacity: usize,
    index: HashMap<i64, usize>,
    rows: Vec<NormalizedRow>,
}

impl RowSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            index: HashMap::new(),
            rows: Vec::new(),
        }
    }

    pub fn insert(&mut self, row: NormalizedRow) -> InsertOutcome {
        let Some(id) = row.tatoeba_id else {
            return InsertOutcome::MissingId;
        };
        if let Some(&position) = self.index.get(&id) {
            self.rows[position] = row;
            return InsertOutcome::Replaced;
        }
        if self.is_full() {
            return InsertOutcome::Full;
        }
        self.index.insert(id, self.rows.len());
        self.rows.push(row);
        InsertOutcome::Added
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.rows.len() >= self.capacity
    }

    pub fn into_rows(self) -> Vec<NormalizedRow> {
        self.rows
    }
}

/// Deduplicates rows read from a JSON file and keeps at most `limit`.
///
/// Rows carrying an id follow the same last-wins rule as a fetch session;
/// rows without one are kept as they are.
pub fn dedupe_input_rows(rows: Vec<NormalizedRow>, limit: usize) -> Vec<NormalizedRow> {
    let mut index: HashMap<i64, usize> = HashMap::new();
    let mut out: Vec<NormalizedRow> = Vec::new();
    for row in rows {
        if let Some(id) = row.tatoeba_id {
            if let Some(&position) = index.get(&id) {
                out[position] = row;
                continue;
            }
            if out.len() >= limit {
                continue;
            }
            index.insert(id, out.len());
        } else if out.len() >= limit {
            continue;
        }
        out.push(row);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::Difficulty;
    use serde_json::{Value, json};

    fn record(value: Value) -> RawRecord {
        serde_json::from_value(value).expect("record")
    }

    #[test]
    fn english_record_with_direct_spanish_translation() {
        let row = normalize(&record(json!({
            "id": 1,
            "text": "Hello",
            "lang": "eng",
            "directTranslations": [{"id": 2, "text": "Hola", "lang": "spa"}]
        })))
        .expect("row");
        assert_eq!(
            row,
            NormalizedRow {
                tatoeba_id: Some(2),
                spanish: "Hola".to_string(),
                english: "Hello".to_string(),
                source: "tatoeba".to_string(),
                difficulty: Difficulty::Easy,
            }
        );
    }

    #[test]
    fn two_letter_codes_are_matched() {
        let row = normalize(&record(json!({
            "id": 1,
            "text": " Good morning ",
            "lang": "EN",
            "translations": [{"id": 5, "text": " Buenos días ", "lang": "es"}]
        })))
        .expect("row");
        assert_eq!(row.spanish, "Buenos días");
        assert_eq!(row.english, "Good morning");
        assert_eq!(row.tatoeba_id, Some(5));
    }

    #[test]
    fn first_matching_variant_wins() {
        let row = normalize(&record(json!({
            "id": 1,
            "text": "Hello",
            "lang": "eng",
            "translations": {"spa": [
                {"id": 2, "text": "Hola", "lang": "spa"},
                {"id": 3, "text": "Buenas", "lang": "spa"}
            ]}
        })))
        .expect("row");
        assert_eq!(row.spanish, "Hola");
        assert_eq!(row.tatoeba_id, Some(2));
    }

    #[test]
    fn identifier_falls_back_to_english_then_record() {
        let spanish_self = record(json!({
            "text": "Hola",
            "lang": "spa",
            "directTranslations": [{"id": 8, "text": "Hello", "lang": "eng"}]
        }));
        assert_eq!(try_normalize(&spanish_self).unwrap().tatoeba_id, Some(8));

        let spanish_self_with_id = record(json!({
            "id": "4",
            "text": "Hola",
            "lang": "spa",
            "directTranslations": [{"id": 8, "text": "Hello", "lang": "eng"}]
        }));
        assert_eq!(
            try_normalize(&spanish_self_with_id).unwrap().tatoeba_id,
            Some(4)
        );
    }

    #[test]
    fn missing_languages_yield_nothing() {
        let only_english = record(json!({"id": 1, "text": "Hello", "lang": "eng"}));
        assert_eq!(
            try_normalize(&only_english),
            Err(DiscardReason::MissingSpanish)
        );

        let only_spanish = record(json!({
            "id": 1,
            "text": "Hola",
            "lang": "spa",
            "translations": [{"id": 2, "text": "Salut", "lang": "fra"}]
        }));
        assert_eq!(
            try_normalize(&only_spanish),
            Err(DiscardReason::MissingEnglish)
        );
    }

    #[test]
    fn blank_self_text_is_rejected() {
        let blank = record(json!({
            "id": 1,
            "text": "   ",
            "lang": "eng",
            "directTranslations": [{"id": 2, "text": "Hola", "lang": "spa"}]
        }));
        assert_eq!(try_normalize(&blank), Err(DiscardReason::EmptyText));
        assert!(normalize(&blank).is_none());
    }

    #[test]
    fn row_set_keeps_last_row_per_id() {
        let mut set = RowSet::with_capacity(10);
        let first = record(json!({
            "id": 1, "text": "Hello", "lang": "eng",
            "directTranslations": [{"id": 2, "text": "Hola", "lang": "spa"}]
        }));
        let second = record(json!({
            "id": 9, "text": "Hello", "lang": "eng",
            "directTranslations": [{"id": 2, "text": "¡Hola!", "lang": "spa"}]
        }));

        assert_eq!(set.insert(normalize(&first).unwrap()), InsertOutcome::Added);
        assert_eq!(
            set.insert(normalize(&second).unwrap()),
            InsertOutcome::Replaced
        );
        let rows = set.into_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].spanish, "¡Hola!");
    }

    #[test]
    fn row_set_refuses_new_ids_when_full() {
        let mut set = RowSet::with_capacity(1);
        let row = |id| NormalizedRow::new(Some(id), "Hola", "Hello").unwrap();
        assert_eq!(set.insert(row(1)), InsertOutcome::Added);
        assert!(set.is_full());
        assert_eq!(set.insert(row(2)), InsertOutcome::Full);
        assert_eq!(set.insert(row(1)), InsertOutcome::Replaced);
        assert_eq!(
            set.insert(NormalizedRow::new(None, "Hola", "Hello").unwrap()),
            InsertOutcome::MissingId
        );
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn discard_stats_count_reasons() {
        let mut stats = DiscardStats::default();
        stats.record(DiscardReason::MissingSpanish);
        stats.record(DiscardReason::MissingSpanish);
        stats.record(DiscardReason::EmptyText);
        stats.record(DiscardReason::Malformed);
        assert_eq!(stats.missing_spanish, 2);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.total(), 4);
    }

    #[test]
    fn input_rows_dedupe_by_id_and_respect_limit() {
        let row = |id: Option<i64>, spanish: &str| NormalizedRow::new(id, spanish, "x").unwrap();
        let rows = dedupe_input_rows(
            vec![
                row(Some(1), "uno"),
                row(None, "sin id"),
                row(Some(1), "uno bis"),
                row(Some(2), "dos"),
                row(Some(3), "tres"),
            ],
            3,
        );
        let spanish: Vec<_> = rows.iter().map(|row| row.spanish.as_str()).collect();
        assert_eq!(spanish, vec!["uno bis", "sin id", "dos"]);
    }
}
