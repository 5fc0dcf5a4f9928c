use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub mod languages;
pub mod logging;
pub mod normalize;
pub mod rows;
pub mod seed;
pub mod settings;
pub mod tatoeba;

pub use normalize::{DiscardStats, RowSet, normalize, try_normalize};
pub use rows::{Difficulty, NormalizedRow};
pub use seed::{SeedOptions, build_seed_sql};
pub use tatoeba::{FetchOptions, RawRecord, fetch_rows};

#[derive(Debug, Clone)]
pub struct Config {
    pub limit: usize,
    pub batch_size: Option<usize>,
    pub source_lang: String,
    pub target_lang: String,
    pub input: Option<PathBuf>,
    pub output: PathBuf,
    pub json_output: Option<PathBuf>,
    pub max_pages: Option<usize>,
    pub wrap_transaction: bool,
    pub settings_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub rows: usize,
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
    pub pages_fetched: Option<usize>,
    pub discarded: DiscardStats,
    pub output: PathBuf,
    pub json_output: Option<PathBuf>,
}

pub async fn run(config: Config) -> Result<RunSummary> {
    if config.limit == 0 {
        return Err(anyhow!("limit must be greater than zero"));
    }
    if config.batch_size == Some(0) {
        return Err(anyhow!("batch size must be greater than zero"));
    }
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;

    let (rows, pages_fetched, discarded) = match config.input.as_deref() {
        Some(path) => {
            let rows = rows::load_input_rows(path)?;
            info!("read {} rows from {}", rows.len(), path.display());
            let rows = normalize::dedupe_input_rows(rows, config.limit);
            (rows, None, DiscardStats::default())
        }
        None => {
            check_lang_pair(&config.source_lang, &config.target_lang);
            let options = FetchOptions {
                base_url: settings.base_url.clone(),
                source_lang: config.source_lang.clone(),
                target_lang: config.target_lang.clone(),
                target: config.limit,
                page_size: settings.page_size,
                max_pages: config.max_pages,
                page_delay: settings.page_delay,
                timeout: settings.timeout,
                user_agent: settings.user_agent.clone(),
            };
            let outcome = fetch_rows(&options).await?;
            (outcome.rows, Some(outcome.pages_fetched), outcome.discarded)
        }
    };

    if rows.is_empty() {
        return Err(anyhow!("no sentence pairs collected; nothing to seed"));
    }

    let seed_options = SeedOptions {
        table: settings.table.clone(),
        batch_size: config.batch_size.unwrap_or(settings.batch_size),
        wrap_transaction: config.wrap_transaction,
    };
    let sql = build_seed_sql(&rows, &seed_options)?;
    seed::write_seed_file(&config.output, &sql)?;
    info!("wrote {} rows to {}", rows.len(), config.output.display());

    if let Some(path) = config.json_output.as_deref() {
        rows::write_rows_json(path, &rows)?;
        info!("wrote JSON rows to {}", path.display());
    }

    let count = |difficulty: Difficulty| {
        rows.iter()
            .filter(|row| row.difficulty == difficulty)
            .count()
    };
    Ok(RunSummary {
        rows: rows.len(),
        easy: count(Difficulty::Easy),
        medium: count(Difficulty::Medium),
        hard: count(Difficulty::Hard),
        pages_fetched,
        discarded,
        output: config.output,
        json_output: config.json_output,
    })
}

// Selection always looks for a Spanish/English pair; other flags only change
// the query and will mostly produce discarded records.
fn check_lang_pair(source: &str, target: &str) {
    if !is_english_spanish(source, target) {
        warn!(
            "languages {}/{} are not an English/Spanish pair; most records will be dropped",
            source, target
        );
    }
}

fn is_english_spanish(source: &str, target: &str) -> bool {
    use languages::{ENGLISH, SPANISH, same_lang};
    (same_lang(source, ENGLISH) && same_lang(target, SPANISH))
        || (same_lang(source, SPANISH) && same_lang(target, ENGLISH))
}

pub fn format_summary(summary: &RunSummary) -> String {
    let mut parts = vec![format!(
        "wrote {} rows to {} (easy={}, medium={}, hard={})",
        summary.rows,
        summary.output.display(),
        summary.easy,
        summary.medium,
        summary.hard
    )];
    if let Some(pages) = summary.pages_fetched {
        parts.push(format!(
            "pages: {}, discarded: {}",
            pages,
            summary.discarded.total()
        ));
    }
    if let Some(path) = &summary.json_output {
        parts.push(format!("json: {}", path.display()));
    }
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_spanish_pairs_in_either_direction() {
        assert!(is_english_spanish("eng", "spa"));
        assert!(is_english_spanish("ES", "en"));
        assert!(is_english_spanish("english", "spanish"));
        assert!(!is_english_spanish("eng", "fra"));
        assert!(!is_english_spanish("spa", "spa"));
    }

    #[test]
    fn summary_lists_fetch_details_only_for_fetched_runs() {
        let mut summary = RunSummary {
            rows: 3,
            easy: 2,
            medium: 1,
            hard: 0,
            pages_fetched: None,
            discarded: DiscardStats::default(),
            output: PathBuf::from("seed.sql"),
            json_output: None,
        };
        assert_eq!(
            format_summary(&summary),
            "wrote 3 rows to seed.sql (easy=2, medium=1, hard=0)"
        );

        summary.pages_fetched = Some(2);
        summary.discarded.missing_spanish = 4;
        summary.json_output = Some(PathBuf::from("rows.json"));
        assert_eq!(
            format_summary(&summary),
            "wrote 3 rows to seed.sql (easy=2, medium=1, hard=0)\npages: 2, discarded: 4\njson: rows.json"
        );
    }
}
