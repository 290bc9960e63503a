//! Command-line interface definitions for News Window.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! The search arguments can also be provided via environment variables.

use crate::utils::parse_categories;
use clap::Parser;

/// Command-line arguments for the News Window application.
///
/// # Examples
///
/// ```sh
/// # Everything about "politics" from this month and the previous one
/// news_window -p politics -m 2
///
/// # Restricted to two categories, with a custom config
/// news_window -p "climate change" -c "Stories,Videos" --config ./settings.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Search phrase; also counted in every article
    #[arg(short, long, env = "PHRASE", default_value = "")]
    pub phrase: String,

    /// Comma-separated category names to filter by
    #[arg(short, long, env = "CATEGORIES", default_value = "")]
    pub categories: String,

    /// Number of calendar months to collect, including the current one
    #[arg(short, long, env = "MONTHS", default_value_t = 1)]
    pub months: u32,

    /// Optional path to a YAML settings file
    #[arg(long)]
    pub config: Option<String>,

    /// Output directory (overrides the settings file)
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headful: bool,
}

impl Cli {
    /// The requested categories, blank entries removed.
    pub fn category_list(&self) -> Vec<String> {
        parse_categories(&self.categories)
    }

    /// The month window, clamped to at least one month.
    pub fn window_months(&self) -> u32 {
        self.months.max(1)
    }
}
