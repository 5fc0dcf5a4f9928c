use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::seed::{DEFAULT_BATCH_SIZE, DEFAULT_TABLE};
use crate::tatoeba::{
    DEFAULT_BASE_URL, DEFAULT_PAGE_DELAY, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT,
};

pub const BASE_URL_ENV: &str = "TATOEBA_BASE_URL";

#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub page_size: usize,
    pub page_delay: Duration,
    pub timeout: Duration,
    pub user_agent: String,
    pub table: String,
    pub batch_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            page_delay: DEFAULT_PAGE_DELAY,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            table: DEFAULT_TABLE.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    tatoeba: Option<TatoebaSettings>,
    seed: Option<SeedSettings>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TatoebaSettings {
    base_url: Option<String>,
    page_size: Option<usize>,
    page_delay_ms: Option<u64>,
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedSettings {
    table: Option<String>,
    batch_size: Option<usize>,
}

/// Loads `seeder.toml` and `seeder.local.toml` from the working directory,
/// then the `TATOEBA_BASE_URL` override, then `extra_path`. Each layer
/// overrides the previous one, so an explicit settings file beats the
/// environment.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    load_layers(extra_path, std::env::var(BASE_URL_ENV).ok())
}

fn load_layers(extra_path: Option<&Path>, env_base_url: Option<String>) -> Result<Settings> {
    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
    }

    let mut settings = Settings::default();
    for path in [Path::new("seeder.toml"), Path::new("seeder.local.toml")] {
        if path.exists() {
            settings.merge_file(path)?;
        }
    }

    if let Some(base_url) = env_base_url {
        if !base_url.trim().is_empty() {
            settings.base_url = base_url.trim().to_string();
        }
    }

    if let Some(extra) = extra_path {
        settings.merge_file(extra)?;
    }

    Ok(settings)
}

impl Settings {
    fn merge_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings: {}", path.display()))?;
        self.merge_str(&content)
            .with_context(|| format!("failed to parse settings: {}", path.display()))
    }

    pub fn merge_str(&mut self, content: &str) -> Result<()> {
        let parsed: SettingsFile = toml::from_str(content)?;
        self.merge(parsed);
        Ok(())
    }

    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(tatoeba) = incoming.tatoeba {
            if let Some(url) = tatoeba.base_url {
                if !url.trim().is_empty() {
                    self.base_url = url.trim().to_string();
                }
            }
            if let Some(size) = tatoeba.page_size {
                if size > 0 {
                    self.page_size = size;
                }
            }
            if let Some(delay) = tatoeba.page_delay_ms {
                self.page_delay = Duration::from_millis(delay);
            }
            if let Some(timeout) = tatoeba.timeout_secs {
                if timeout > 0 {
                    self.timeout = Duration::from_secs(timeout);
                }
            }
            if let Some(agent) = tatoeba.user_agent {
                if !agent.trim().is_empty() {
                    self.user_agent = agent;
                }
            }
        }
        if let Some(seed) = incoming.seed {
            if let Some(table) = seed.table {
                if !table.trim().is_empty() {
                    self.table = table.trim().to_string();
                }
            }
            if let Some(size) = seed.batch_size {
                if size > 0 {
                    self.batch_size = size;
                }
            }
        }
    }
}
