//! Picture downloads for extracted articles.
//!
//! Each record with both an image filename and a picture URL yields one file,
//! `{dir}/{image_filename}.{ext}`. Records sharing a filename are downloaded
//! once. Downloads run a bounded number at a time; a failed download is
//! logged and skipped.

use crate::download::download_with_backoff;
use crate::models::ArticleRecord;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use reqwest::Client;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};
use url::Url;

const DEFAULT_EXTENSION: &str = "jpg";

/// Download every distinct picture referenced by `records` into `dir`.
///
/// Returns the number of pictures saved.
#[instrument(level = "info", skip_all, fields(dir = %dir.display(), concurrency = concurrency))]
pub async fn download_pictures(
    client: &Client,
    records: &[ArticleRecord],
    dir: &Path,
    concurrency: usize,
) -> Result<usize, Box<dyn Error>> {
    fs::create_dir_all(dir).await?;

    let jobs = picture_jobs(records);
    info!(count = jobs.len(), "Downloading pictures");

    let saved: Vec<bool> = stream::iter(jobs)
        .map(|(name, url)| async move {
            match save_picture(client, dir, name, url).await {
                Ok(path) => {
                    info!(path = %path.display(), "Saved picture");
                    true
                }
                Err(e) => {
                    warn!(%name, %url, error = %e, "Failed to download picture; skipping");
                    false
                }
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    Ok(saved.into_iter().filter(|ok| *ok).count())
}

/// `(filename, url)` pairs to download, first occurrence of each filename.
fn picture_jobs(records: &[ArticleRecord]) -> Vec<(&str, &str)> {
    records
        .iter()
        .filter_map(|r| Some((r.image_filename.as_deref()?, r.picture_url.as_deref()?)))
        .filter(|(name, _)| !name.is_empty())
        .unique_by(|(name, _)| *name)
        .collect()
}

async fn save_picture(
    client: &Client,
    dir: &Path,
    name: &str,
    url: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let fetched = download_with_backoff(client, url).await?;
    let extension = extension_for(fetched.content_type.as_deref(), url);
    let path = dir.join(format!("{name}.{extension}"));
    fs::write(&path, &fetched.bytes).await?;
    Ok(path)
}

/// File extension for a picture: from its content type, else from the URL
/// path, else `jpg`.
pub fn extension_for(content_type: Option<&str>, url: &str) -> String {
    let from_mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|mime| mime.trim().to_ascii_lowercase())
        .and_then(|mime| match mime.as_str() {
            "image/jpeg" | "image/jpg" => Some("jpg"),
            "image/png" => Some("png"),
            "image/webp" => Some("webp"),
            "image/gif" => Some("gif"),
            "image/avif" => Some("avif"),
            _ => None,
        });
    if let Some(ext) = from_mime {
        return ext.to_string();
    }

    Url::parse(url)
        .ok()
        .and_then(|u| {
            let last = u.path_segments()?.next_back()?.to_string();
            let (_, ext) = last.rsplit_once('.')?;
            let valid = (1..=5).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric());
            valid.then(|| ext.to_ascii_lowercase())
        })
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
