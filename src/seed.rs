use anyhow::{Context, Result, anyhow};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::rows::NormalizedRow;

pub const DEFAULT_TABLE: &str = "sentences";
pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const BEGIN_MARKER: &str = "BEGIN TRANSACTION;";
pub const COMMIT_MARKER: &str = "COMMIT;";

#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub table: String,
    pub batch_size: usize,
    /// Leave off when the apply tool opens its own transaction.
    pub wrap_transaction: bool,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            wrap_transaction: false,
        }
    }
}

/// Renders rows as batched upserts keyed on `tatoeba_id`.
pub fn build_seed_sql(rows: &[NormalizedRow], options: &SeedOptions) -> Result<String> {
    if rows.is_empty() {
        return Err(anyhow!("no rows to write to the seed file"));
    }
    if options.batch_size == 0 {
        return Err(anyhow!("batch size must be greater than zero"));
    }
    validate_table_name(&options.table)?;

    let statements: Vec<String> = rows
        .chunks(options.batch_size)
        .map(|batch| insert_statement(&options.table, batch))
        .collect();

    let mut out = String::new();
    if options.wrap_transaction {
        out.push_str(BEGIN_MARKER);
        out.push_str("\n\n");
    }
    out.push_str(&statements.join("\n\n"));
    out.push('\n');
    if options.wrap_transaction {
        out.push('\n');
        out.push_str(COMMIT_MARKER);
        out.push('\n');
    }
    Ok(out)
}

fn insert_statement(table: &str, batch: &[NormalizedRow]) -> String {
    let mut sql = String::new();
    let _ = writeln!(
        sql,
        "INSERT INTO {} (tatoeba_id, spanish, english, source, difficulty)",
        table
    );
    sql.push_str("VALUES\n");
    let values: Vec<String> = batch.iter().map(values_tuple).collect();
    sql.push_str(&values.join(",\n"));
    sql.push('\n');
    sql.push_str("ON CONFLICT (tatoeba_id) DO UPDATE SET\n");
    sql.push_str("  spanish = excluded.spanish,\n");
    sql.push_str("  english = excluded.english,\n");
    sql.push_str("  source = excluded.source,\n");
    sql.push_str("  difficulty = excluded.difficulty,\n");
    sql.push_str("  updated_at = CURRENT_TIMESTAMP;");
    sql
}

fn values_tuple(row: &NormalizedRow) -> String {
    let id = row
        .tatoeba_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "NULL".to_string());
    format!(
        "  ({}, {}, {}, {}, {})",
        id,
        quote(&row.spanish),
        quote(&row.english),
        quote(&row.source),
        quote(row.difficulty.as_str())
    )
}

pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn validate_table_name(table: &str) -> Result<()> {
    let mut chars = table.chars();
    let valid_start = chars
        .next()
        .map(|ch| ch.is_ascii_alphabetic() || ch == '_')
        .unwrap_or(false);
    if !valid_start || !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err(anyhow!("invalid table name: {:?}", table));
    }
    Ok(())
}

pub fn write_seed_file(path: &Path, sql: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output dir: {}", dir.display()))?;
    }
    fs::write(path, sql).with_context(|| format!("failed to write seed: {}", path.display()))
}
