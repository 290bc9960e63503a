//! Turning one result item into an [`ArticleRecord`].
//!
//! Every field is read independently. A field that cannot be read gets its
//! default and a warning; it never fails the record, let alone the page.

use super::locators;
use crate::driver::PageDriver;
use crate::models::ArticleRecord;
use crate::utils::{sanitize_filename, truncate_for_log};
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

pub const MISSING_TITLE: &str = "Article without tittle";
pub const MISSING_DESCRIPTION: &str = "Article without description";

static MONEY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\$\d+(?:\.\d+)?",
        r"(?i)\$\d{1,3}(?:,\d{3})+(?:\.\d{2})",
        r"(?i)\b\d+\s+dollars\b",
        r"(?i)\b\d+\s+USD\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Extract a record from `item`, counting `phrase` in its text.
///
/// A missing timestamp falls back to the current time and sets
/// [`ArticleRecord::date_is_fallback`]; the caller decides whether to keep it.
pub async fn extract_record<D: PageDriver>(
    driver: &D,
    item: &D::Item,
    phrase: &str,
) -> ArticleRecord {
    let title = match sub_text(driver, item, locators::PROMO_TITLE).await {
        Some(title) => title,
        None => {
            warn!("{MISSING_TITLE}");
            MISSING_TITLE.to_string()
        }
    };

    let (published_at, date_is_fallback) = match published_at(driver, item).await {
        Some(date) => (date, false),
        None => {
            warn!(%title, "Article without date");
            (Local::now(), true)
        }
    };

    let description = match sub_text(driver, item, locators::PROMO_DESCRIPTION).await {
        Some(description) => description,
        None => {
            warn!(%title, "{MISSING_DESCRIPTION}");
            MISSING_DESCRIPTION.to_string()
        }
    };

    let image_filename = image_label(driver, item).await.map(|l| sanitize_filename(&l));
    if image_filename.is_none() {
        warn!(%title, "Article without image name");
    }

    let picture_url = picture_url(driver, item).await;
    if picture_url.is_none() {
        warn!(%title, "Article without image");
    }

    let text = match driver.read_text(item).await {
        Ok(text) => text,
        Err(e) => {
            warn!(%title, error = %e, "Could not read article text");
            String::new()
        }
    };
    debug!(text = %truncate_for_log(&text, 160), "Article text");

    ArticleRecord {
        search_count: count_occurrences(&text, phrase),
        contains_money: contains_money(&text),
        title,
        published_at,
        description,
        image_filename,
        picture_url,
        date_is_fallback,
    }
}

/// Publication time of `item`, if its timestamp can be read.
pub async fn published_at<D: PageDriver>(driver: &D, item: &D::Item) -> Option<DateTime<Local>> {
    let stamp = driver.find_in(item, locators::TIMESTAMP).await.ok()??;
    let raw = driver
        .read_attribute(&stamp, locators::ATTR_TIMESTAMP)
        .await
        .ok()??;
    parse_epoch_millis(&raw)
}

/// Parse an epoch-millisecond timestamp into local time.
pub fn parse_epoch_millis(raw: &str) -> Option<DateTime<Local>> {
    let millis: i64 = raw.trim().parse().ok()?;
    DateTime::from_timestamp_millis(millis).map(|utc| utc.with_timezone(&Local))
}

/// Case-insensitive, non-overlapping occurrences of `phrase` in `text`.
///
/// An empty phrase matches at every position between characters.
pub fn count_occurrences(text: &str, phrase: &str) -> usize {
    let text = text.to_lowercase();
    if phrase.is_empty() {
        return text.chars().count() + 1;
    }
    text.matches(&phrase.to_lowercase()).count()
}

/// Whether `text` mentions a monetary amount such as `$12.50`, `$1,234.56`,
/// `11 dollars` or `5 USD`.
pub fn contains_money(text: &str) -> bool {
    MONEY_PATTERNS.iter().any(|p| p.is_match(text))
}

async fn sub_text<D: PageDriver>(driver: &D, item: &D::Item, selector: &str) -> Option<String> {
    let found = driver.find_in(item, selector).await.ok()??;
    let text = driver.read_text(&found).await.ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

async fn image_label<D: PageDriver>(driver: &D, item: &D::Item) -> Option<String> {
    let media = driver.find_in(item, locators::PROMO_MEDIA).await.ok()??;
    let link = driver.find_in(&media, locators::MEDIA_LINK).await.ok()??;
    driver
        .read_attribute(&link, locators::ATTR_ARIA_LABEL)
        .await
        .ok()?
        .filter(|l| !l.trim().is_empty())
}

async fn picture_url<D: PageDriver>(driver: &D, item: &D::Item) -> Option<String> {
    let media = driver.find_in(item, locators::PROMO_MEDIA).await.ok()??;
    let image = driver.find_in(&media, locators::MEDIA_IMAGE).await.ok()??;
    driver
        .read_attribute(&image, locators::ATTR_SRC)
        .await
        .ok()?
        .filter(|src| !src.is_empty())
}
