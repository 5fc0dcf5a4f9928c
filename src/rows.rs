use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

pub const SOURCE_TATOEBA: &str = "tatoeba";

const EASY_MAX_CHARS: usize = 40;
const MEDIUM_MAX_CHARS: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Buckets a Spanish sentence by its character count.
    pub fn for_text(spanish: &str) -> Self {
        let len = spanish.trim().chars().count();
        if len <= EASY_MAX_CHARS {
            Difficulty::Easy
        } else if len <= MEDIUM_MAX_CHARS {
            Difficulty::Medium
        } else {
            Difficulty::Hard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sentence pair ready to be written to the seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRow {
    pub tatoeba_id: Option<i64>,
    pub spanish: String,
    pub english: String,
    pub source: String,
    pub difficulty: Difficulty,
}

impl NormalizedRow {
    /// Builds a row from untrimmed text, or `None` if either side is blank.
    pub fn new(tatoeba_id: Option<i64>, spanish: &str, english: &str) -> Option<Self> {
        let spanish = spanish.trim();
        let english = english.trim();
        if spanish.is_empty() || english.is_empty() {
            return None;
        }
        Some(Self {
            tatoeba_id,
            spanish: spanish.to_string(),
            english: english.to_string(),
            source: SOURCE_TATOEBA.to_string(),
            difficulty: Difficulty::for_text(spanish),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct InputRow {
    tatoeba_id: Option<Value>,
    spanish: Option<String>,
    english: Option<String>,
    source: Option<String>,
    difficulty: Option<Difficulty>,
}

/// Parses pre-normalized rows, skipping entries without both texts.
pub fn parse_input_rows(content: &str) -> Result<Vec<NormalizedRow>> {
    let items: Vec<Value> =
        serde_json::from_str(content).with_context(|| "input JSON must be an array of rows")?;
    let mut rows = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let input: InputRow = match serde_json::from_value(item) {
            Ok(input) => input,
            Err(err) => {
                debug!("skipping input row {}: {}", index, err);
                continue;
            }
        };
        let tatoeba_id = input
            .tatoeba_id
            .as_ref()
            .and_then(crate::tatoeba::coerce_id);
        let Some(mut row) = NormalizedRow::new(
            tatoeba_id,
            input.spanish.as_deref().unwrap_or_default(),
            input.english.as_deref().unwrap_or_default(),
        ) else {
            debug!("skipping input row {}: missing spanish or english", index);
            continue;
        };
        if let Some(source) = input.source.filter(|source| !source.trim().is_empty()) {
            row.source = source.trim().to_string();
        }
        if let Some(difficulty) = input.difficulty {
            row.difficulty = difficulty;
        }
        rows.push(row);
    }
    Ok(rows)
}

pub fn load_input_rows(path: &Path) -> Result<Vec<NormalizedRow>> {
    if !path.exists() {
        return Err(anyhow!("input file not found: {}", path.display()));
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read input: {}", path.display()))?;
    parse_input_rows(&content).with_context(|| format!("failed to parse input: {}", path.display()))
}

pub fn write_rows_json(path: &Path, rows: &[NormalizedRow]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output dir: {}", dir.display()))?;
    }
    let content = serde_json::to_string_pretty(rows)?;
    fs::write(path, content)
        .with_context(|| format!("failed to write JSON output: {}", path.display()))?;
    Ok(())
}
