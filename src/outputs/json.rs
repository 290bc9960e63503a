//! JSON output of the extracted records.

use crate::models::ArticleRecord;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Write `records` as a pretty-printed JSON array to `path`.
///
/// The parent directory must already exist.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn write_records(records: &[ArticleRecord], path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(records)?;
    info!("Writing JSON");
    fs::write(path, json).await?;
    info!("Wrote JSON file");
    Ok(())
}
