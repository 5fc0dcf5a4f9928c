use serde::Deserialize;
use serde_json::Value;

mod client;
mod variants;

pub use client::{
    DEFAULT_PAGE_DELAY, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, FetchOptions,
    FetchOutcome, fetch_rows, max_pages_for, search_url,
};
pub(crate) use variants::coerce_id;
pub use variants::{Translations, Variant, coerce_entry, collect_variants};

pub const DEFAULT_BASE_URL: &str = "https://tatoeba.org/en/api_v0/search";

/// One item of the search `results` array.
///
/// Every field is kept as raw JSON: the API changes shapes between query
/// modes, and a record with odd field types must be dropped on its own rather
/// than failing the page. [`collect_variants`] does the coercion.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    pub id: Option<Value>,
    pub lang: Option<Value>,
    pub text: Option<Value>,
    #[serde(rename = "directTranslations", alias = "direct_translations")]
    pub direct_translations: Option<Value>,
    pub translations: Option<Value>,
}

impl RawRecord {
    pub fn record_id(&self) -> Option<i64> {
        self.id.as_ref().and_then(coerce_id)
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_ref().and_then(Value::as_str)
    }

    pub fn lang(&self) -> Option<&str> {
        self.lang.as_ref().and_then(Value::as_str)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SearchResponse {
    pub(crate) results: Vec<Value>,
}
