//! Utility functions for string handling, URLs, and file system operations.
//!
//! This module provides helper functions used throughout the application:
//! - String truncation for logging and filename sanitization
//! - Search URL construction and CLI list parsing
//! - File system validation for output directories

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Phrase searched when the caller gives none; the site rejects an empty query.
pub const EMPTY_PHRASE_QUERY: &str = "...";

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9\s]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s").unwrap());

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary)
/// with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Make a string safe to use as a file name stem.
///
/// Every character that is not an ASCII letter, ASCII digit, or whitespace
/// becomes `_`, then every whitespace character becomes `_`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(sanitize_filename("Senate, floor vote!"), "Senate__floor_vote_");
/// ```
pub fn sanitize_filename(s: &str) -> String {
    let replaced = NON_WORD.replace_all(s, "_");
    WHITESPACE.replace_all(&replaced, "_").into_owned()
}

/// Build the search page URL for `phrase` on `site_url`.
///
/// Produces `{site_url}search?q={phrase}&s=0`; an empty phrase searches
/// [`EMPTY_PHRASE_QUERY`].
///
/// # Errors
///
/// Returns an error if `site_url` is not an absolute URL.
pub fn search_url(site_url: &str, phrase: &str) -> Result<String, url::ParseError> {
    let base = if site_url.ends_with('/') {
        Url::parse(site_url)?
    } else {
        Url::parse(&format!("{site_url}/"))?
    };
    let mut url = base.join("search")?;
    let query = if phrase.trim().is_empty() {
        EMPTY_PHRASE_QUERY
    } else {
        phrase
    };
    url.query_pairs_mut()
        .append_pair("q", query)
        .append_pair("s", "0");
    Ok(url.into())
}

/// Split a comma-separated category list, dropping blank entries.
pub fn parse_categories(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Sync probe write; simpler error surface than the async API
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
