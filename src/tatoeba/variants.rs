use serde_json::{Map, Value};

use super::RawRecord;

/// A candidate sentence pulled out of a record or its translation data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub id: Option<i64>,
    pub text: String,
    pub lang: String,
}

/// The shapes the `translations` field has been observed in.
#[derive(Debug, Clone, Copy)]
pub enum Translations<'a> {
    /// `{"spa": [entry, ...], "fra": [...]}`
    ByLanguage(&'a Map<String, Value>),
    /// `[entry, ...]`
    Flat(&'a [Value]),
    /// `[[entry, ...], [entry, ...]]`
    Nested(&'a [Value]),
}

impl<'a> Translations<'a> {
    pub fn classify(value: &'a Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Translations::ByLanguage(map)),
            Value::Array(items) if items.iter().any(Value::is_array) => {
                Some(Translations::Nested(items))
            }
            Value::Array(items) => Some(Translations::Flat(items)),
            _ => None,
        }
    }

    /// Flattens every shape into the same list of raw entries.
    pub fn entries(self) -> Vec<&'a Value> {
        match self {
            Translations::ByLanguage(map) => map.values().flat_map(flatten_one).collect(),
            Translations::Flat(items) => items.iter().collect(),
            Translations::Nested(items) => items.iter().flat_map(flatten_one).collect(),
        }
    }
}

fn flatten_one(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

pub fn collect_variants(record: &RawRecord) -> Vec<Variant> {
    let mut variants = vec![Variant {
        id: record.record_id(),
        text: record.text().unwrap_or_default().to_string(),
        lang: record.lang().unwrap_or_default().to_string(),
    }];

    let direct = record.direct_translations.as_ref();
    if let Some(shape) = direct.and_then(Translations::classify) {
        variants.extend(shape.entries().into_iter().filter_map(coerce_entry));
    }

    let translations = record.translations.as_ref();
    if let Some(shape) = translations.and_then(Translations::classify) {
        variants.extend(shape.entries().into_iter().filter_map(coerce_entry));
    }

    if variants.len() == 1
        && let Some(Value::Array(groups)) = translations
    {
        variants.extend(rescan_nested(groups));
    }

    variants
}

// Some query modes wrap each translation group in one more array.
fn rescan_nested(groups: &[Value]) -> Vec<Variant> {
    groups
        .iter()
        .filter_map(Value::as_array)
        .flatten()
        .flat_map(flatten_one)
        .filter_map(coerce_entry)
        .collect()
}

/// Turns one raw translation entry into a [`Variant`].
///
/// Fields may sit at the top level or under a `sentence` object, and the
/// language may be called `lang` or `lang_code`. Entries missing any of id,
/// text or language are rejected.
pub fn coerce_entry(value: &Value) -> Option<Variant> {
    let entry = value.as_object()?;
    let sentence = entry.get("sentence").and_then(Value::as_object);

    let id = field(entry, sentence, &["id"]).and_then(coerce_id)?;
    let text = field(entry, sentence, &["text"])
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())?;
    let lang = field(entry, sentence, &["lang", "lang_code"])
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|lang| !lang.is_empty())?;

    Some(Variant {
        id: Some(id),
        text: text.to_string(),
        lang: lang.to_string(),
    })
}

fn field<'a>(
    entry: &'a Map<String, Value>,
    sentence: Option<&'a Map<String, Value>>,
    keys: &[&str],
) -> Option<&'a Value> {
    let lookup = |map: &'a Map<String, Value>| {
        keys.iter()
            .filter_map(|key| map.get(*key))
            .find(|value| !value.is_null())
    };
    lookup(entry).or_else(|| sentence.and_then(lookup))
}

pub(crate) fn coerce_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
