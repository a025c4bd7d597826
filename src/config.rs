use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "rinkscrape";
const ENV_PREFIX: &str = "RINK";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: PathBuf,
    pub browser: BrowserSettings,
    pub crawl: CrawlSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowserSettings {
    pub chrome_path: Option<String>,
    pub headless: bool,
    /// Wait after each navigation for client-side tables to render.
    pub load_wait_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrawlSettings {
    /// Randomized pause between fetches, inclusive bounds.
    pub pause_min_ms: u64,
    pub pause_max_ms: u64,
    /// Settle delay after a pager or "load more" click.
    pub settle_ms: u64,
    pub max_expansions: usize,
}

impl CrawlSettings {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            pause_min_ms: 1000,
            pause_max_ms: 5000,
            settle_ms: 1000,
            max_expansions: 200,
        }
    }
}

fn with_defaults() -> Result<ConfigBuilder<DefaultState>> {
    let crawl = CrawlSettings::default();
    Ok(Config::builder()
        .set_default("database", "data/hockey-stats.sqlite")?
        .set_default("browser.headless", true)?
        .set_default("browser.load_wait_ms", 1500)?
        .set_default("crawl.pause_min_ms", crawl.pause_min_ms as i64)?
        .set_default("crawl.pause_max_ms", crawl.pause_max_ms as i64)?
        .set_default("crawl.settle_ms", crawl.settle_ms as i64)?
        .set_default("crawl.max_expansions", crawl.max_expansions as i64)?)
}

/// Defaults, then `rinkscrape.toml` if present, then `RINK_*` variables
/// (`RINK_DATABASE`, `RINK_CRAWL__SETTLE_MS`, ...).
pub fn load() -> Result<Settings> {
    with_defaults()?
        .add_source(File::with_name(CONFIG_FILE).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .context("Failed to read settings")?
        .try_deserialize()
        .context("Invalid settings")
}
