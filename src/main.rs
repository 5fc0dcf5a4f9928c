use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "tatoeba-seeder",
    version,
    about = "Build a SQL seed of Spanish/English sentence pairs from Tatoeba"
)]
struct Cli {
    /// Number of sentence pairs to collect
    #[arg(short = 'n', long = "limit", default_value_t = 500)]
    limit: usize,

    /// Rows per INSERT statement (default from settings, 100)
    #[arg(short = 'b', long = "batch-size")]
    batch_size: Option<usize>,

    /// Language of the searched sentences
    #[arg(short = 's', long = "source-lang", default_value = "eng")]
    source_lang: String,

    /// Language the translations must be in
    #[arg(short = 't', long = "target-lang", default_value = "spa")]
    target_lang: String,

    /// Read pre-normalized rows from a JSON file instead of calling the API
    #[arg(short = 'i', long = "input")]
    input: Option<PathBuf>,

    /// Where to write the SQL seed
    #[arg(short = 'o', long = "output", default_value = "seed.sql")]
    output: PathBuf,

    /// Also dump the normalized rows as JSON
    #[arg(short = 'j', long = "json")]
    json: Option<PathBuf>,

    /// Stop after this many pages (default: six times the minimum, at least 5)
    #[arg(long = "max-pages")]
    max_pages: Option<usize>,

    /// Wrap the statements in BEGIN TRANSACTION / COMMIT
    #[arg(long = "transaction")]
    transaction: bool,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tatoeba_seeder::logging::init(cli.verbose)?;

    let summary = tatoeba_seeder::run(tatoeba_seeder::Config {
        limit: cli.limit,
        batch_size: cli.batch_size,
        source_lang: cli.source_lang,
        target_lang: cli.target_lang,
        input: cli.input,
        output: cli.output,
        json_output: cli.json,
        max_pages: cli.max_pages,
        wrap_transaction: cli.transaction,
        settings_path: cli.read_settings,
    })
    .await?;

    println!("{}", tatoeba_seeder::format_summary(&summary));
    Ok(())
}
