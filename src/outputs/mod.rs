//! Output generation for extracted articles.
//!
//! [`ResultSink`] is what an extraction run hands its records to. The
//! file-backed [`FileSink`] writes everything under one output directory.
//!
//! # Submodules
//!
//! - [`xlsx`]: Writes the `Articles` spreadsheet
//! - [`json`]: Writes the records to a JSON file
//! - [`markdown`]: Renders the records as a Markdown report table
//! - [`images`]: Downloads each article's picture
//! - [`archive`]: Zips the picture folder
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── news_search_politics_04-01-2024_to_05-20-2024.xlsx
//! ├── news_search_politics_04-01-2024_to_05-20-2024.json
//! ├── news_search_politics_04-01-2024_to_05-20-2024.md
//! ├── news_images.zip
//! └── news_images/
//!     ├── Senate_floor.jpg
//!     └── Capitol_at_dusk.png
//! ```

pub mod archive;
pub mod images;
pub mod json;
pub mod markdown;
pub mod xlsx;

use crate::config::Settings;
use crate::models::ArticleRecord;
use crate::utils::{ensure_writable_dir, sanitize_filename};
use chrono::{DateTime, Local};
use reqwest::Client;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument};

/// Consumer of the records produced by one run.
pub trait ResultSink {
    async fn consume(&self, records: &[ArticleRecord]) -> Result<(), Box<dyn Error>>;
}

/// Writes the spreadsheet, JSON, Markdown report, pictures and their archive.
#[derive(Debug)]
pub struct FileSink {
    output_dir: String,
    images_dir: String,
    phrase: String,
    from: DateTime<Local>,
    to: DateTime<Local>,
    download_concurrency: usize,
    client: Client,
}

impl FileSink {
    /// A sink for the search `phrase` covering `from..=to`.
    pub fn new(settings: &Settings, phrase: &str, from: DateTime<Local>, to: DateTime<Local>) -> Self {
        Self {
            output_dir: settings.output_dir.clone(),
            images_dir: settings.images_dir.clone(),
            phrase: phrase.to_string(),
            from,
            to,
            download_concurrency: settings.download_concurrency.max(1),
            client: Client::new(),
        }
    }

    /// File stem shared by the spreadsheet, JSON and Markdown outputs.
    pub fn report_stem(&self) -> String {
        format!(
            "news_search_{}_{}_to_{}",
            sanitize_filename(&self.phrase),
            self.from.format("%m-%d-%Y"),
            self.to.format("%m-%d-%Y")
        )
    }

    fn report_title(&self) -> String {
        format!(
            "News search \"{}\" from {} to {}",
            self.phrase,
            self.from.format("%m-%d-%Y"),
            self.to.format("%m-%d-%Y")
        )
    }

    fn output_path(&self, extension: &str) -> PathBuf {
        PathBuf::from(&self.output_dir).join(format!("{}.{extension}", self.report_stem()))
    }

    fn images_path(&self) -> PathBuf {
        PathBuf::from(&self.output_dir).join(&self.images_dir)
    }
}

impl ResultSink for FileSink {
    #[instrument(level = "info", skip_all, fields(output_dir = %self.output_dir, count = records.len()))]
    async fn consume(&self, records: &[ArticleRecord]) -> Result<(), Box<dyn Error>> {
        ensure_writable_dir(&self.output_dir).await?;

        let xlsx_path = self.output_path("xlsx");
        if let Err(e) = xlsx::write_workbook(records, &xlsx_path).await {
            error!(path = %xlsx_path.display(), error = %e, "Failed to write spreadsheet");
            return Err(e);
        }

        let json_path = self.output_path("json");
        if let Err(e) = json::write_records(records, &json_path).await {
            error!(path = %json_path.display(), error = %e, "Failed to write JSON");
            return Err(e);
        }

        let md = markdown::records_to_markdown(&self.report_title(), records);
        let md_path = self.output_path("md");
        info!(path = %md_path.display(), "Writing Markdown");
        if let Err(e) = tokio::fs::write(&md_path, md).await {
            error!(path = %md_path.display(), error = %e, "Failed writing Markdown");
            return Err(e.into());
        }
        info!(path = %md_path.display(), "Wrote Markdown report");

        let images_path = self.images_path();
        let saved = images::download_pictures(
            &self.client,
            records,
            &images_path,
            self.download_concurrency,
        )
        .await?;
        info!(saved, path = %images_path.display(), "Pictures saved");

        archive::zip_folder(&images_path, Path::new(&self.output_dir)).await?;
        Ok(())
    }
}
