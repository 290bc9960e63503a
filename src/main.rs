//! # News Window
//!
//! Extracts every article of a news site's search results published within a
//! rolling window of calendar months, optionally restricted to categories,
//! and writes them out as a spreadsheet, JSON, a Markdown report, and zipped
//! pictures.
//!
//! ## Usage
//!
//! ```sh
//! news_window -p politics -c "Stories" -m 2 -o ./output
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Search**: Open the site's search page in headless Chromium
//! 2. **Sort & filter**: Sort by newest and tick the requested categories
//! 3. **Extract**: Walk result pages until the date window is left
//! 4. **Output**: Write spreadsheet, JSON and Markdown files, download and zip pictures

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod download;
mod driver;
mod error;
mod models;
mod outputs;
mod scrapers;
mod utils;

use cli::Cli;
use config::Settings;
use driver::PageDriver;
use driver::chrome::ChromeDriver;
use models::SearchParams;
use outputs::{FileSink, ResultSink};
use scrapers::boundary::cutoff_for;
use scrapers::controller::Controller;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_window starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut settings = Settings::load(args.config.as_deref()).await?;
    if let Some(dir) = &args.output_dir {
        settings.output_dir = dir.clone();
    }
    if args.headful {
        settings.headless = false;
    }

    if args.months < 1 {
        warn!(months = args.months, "Month window below 1; using 1");
    }
    let params = SearchParams::new(args.phrase.clone(), args.category_list(), args.window_months());
    info!(
        phrase = %params.phrase(),
        categories = ?params.categories(),
        months = params.window_months(),
        "Search parameters"
    );

    // ---- Extract ----
    let driver = ChromeDriver::launch(settings.headless).await?;
    let controller = Controller::new(driver, settings.clone());
    let outcome = controller.run(&params).await;

    if let Err(e) = controller.into_driver().shutdown().await {
        warn!(error = %e, "Browser did not shut down cleanly");
    }

    let records = match outcome {
        Ok(records) => records,
        Err(e) => {
            error!(error = %e, fatal = e.is_fatal(), "Extraction failed");
            return Err(e.into());
        }
    };
    info!(count = records.len(), "Articles extracted");

    // ---- Output ----
    let now = Local::now();
    let cutoff = cutoff_for(now, params.window_months());
    let sink = FileSink::new(&settings, params.phrase(), cutoff, now);
    if let Err(e) = sink.consume(&records).await {
        error!(error = %e, "Failed to write results");
        return Err(e);
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
