//! Runtime settings loaded from an optional YAML file.
//!
//! Every field has a default, so an empty file (or no file) yields a working
//! configuration pointed at the AP News search page.
//!
//! ```yaml
//! site_url: https://apnews.com/
//! output_dir: ./output
//! images_dir: news_images
//! headless: true
//! catalog_match: exact        # or: uppercase
//! missing_date: fabricate_now # or: drop
//! timeouts:
//!   navigation_secs: 100
//! delays:
//!   toggle_settle_ms: 500
//! ```

use serde::Deserialize;
use std::error::Error;
use std::time::Duration;
use tracing::{info, instrument};

/// How requested category names are compared to the site's catalog keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogMatch {
    /// Uppercased request against catalog keys as the site exposes them.
    #[default]
    Exact,
    /// Uppercased request against uppercased catalog keys.
    Uppercase,
}

/// What to do with an article whose timestamp cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDatePolicy {
    /// Keep the article, dated "now".
    #[default]
    FabricateNow,
    /// Exclude the article from the results.
    Drop,
}

/// Bounded waits, in seconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub ready_state_secs: u64,
    pub results_secs: u64,
    pub navigation_secs: u64,
    pub sort_refresh_secs: u64,
    pub categories_refresh_secs: u64,
    pub checkbox_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            ready_state_secs: 10,
            results_secs: 10,
            navigation_secs: 100,
            sort_refresh_secs: 5,
            categories_refresh_secs: 5,
            checkbox_secs: 10,
        }
    }
}

/// Fixed settling delays, in milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Delays {
    pub toggle_settle_ms: u64,
    pub page_settle_ms: u64,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            toggle_settle_ms: 500,
            page_settle_ms: 1000,
        }
    }
}

/// Application settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Site root; the search page is `{site_url}search?q=...`.
    pub site_url: String,
    /// Where the JSON, Markdown and images are written.
    pub output_dir: String,
    /// Image directory name, relative to `output_dir`.
    pub images_dir: String,
    pub headless: bool,
    pub catalog_match: CatalogMatch,
    pub missing_date: MissingDatePolicy,
    /// Parallel picture downloads.
    pub download_concurrency: usize,
    pub timeouts: Timeouts,
    pub delays: Delays,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            site_url: "https://apnews.com/".to_string(),
            output_dir: "./output".to_string(),
            images_dir: "news_images".to_string(),
            headless: true,
            catalog_match: CatalogMatch::default(),
            missing_date: MissingDatePolicy::default(),
            download_concurrency: 4,
            timeouts: Timeouts::default(),
            delays: Delays::default(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or defaults when no path is given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let Some(path) = path else {
            info!("No config file given; using default settings");
            return Ok(Self::default());
        };
        let raw = tokio::fs::read_to_string(path).await?;
        let settings = Self::from_yaml(&raw)?;
        info!(site_url = %settings.site_url, output_dir = %settings.output_dir, "Loaded settings");
        Ok(settings)
    }

    /// Parse settings from YAML text. An empty document yields the defaults.
    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }
}

impl Timeouts {
    pub fn ready_state(&self) -> Duration {
        Duration::from_secs(self.ready_state_secs)
    }

    pub fn results(&self) -> Duration {
        Duration::from_secs(self.results_secs)
    }

    pub fn navigation(&self) -> Duration {
        Duration::from_secs(self.navigation_secs)
    }

    pub fn sort_refresh(&self) -> Duration {
        Duration::from_secs(self.sort_refresh_secs)
    }

    pub fn categories_refresh(&self) -> Duration {
        Duration::from_secs(self.categories_refresh_secs)
    }

    pub fn checkbox(&self) -> Duration {
        Duration::from_secs(self.checkbox_secs)
    }
}

impl Delays {
    pub fn toggle_settle(&self) -> Duration {
        Duration::from_millis(self.toggle_settle_ms)
    }

    pub fn page_settle(&self) -> Duration {
        Duration::from_millis(self.page_settle_ms)
    }
}
