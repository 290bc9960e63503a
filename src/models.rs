//! Data models for search parameters, category filters, and extracted articles.
//!
//! This module defines the core data structures used throughout the application:
//! - [`SearchParams`]: What the caller asked for (phrase, categories, window)
//! - [`CategoryCatalog`]: Filter options exposed by the live results page
//! - [`CategorySelection`]: The requested categories resolved against a catalog
//! - [`ArticleRecord`]: One structured article extracted from a results page

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters for a single extraction run.
///
/// Immutable once constructed. `window_months` is never below 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    phrase: String,
    categories: Vec<String>,
    window_months: u32,
}

impl SearchParams {
    /// Build search parameters, clamping a zero month window to 1.
    pub fn new(phrase: impl Into<String>, categories: Vec<String>, window_months: u32) -> Self {
        Self {
            phrase: phrase.into(),
            categories,
            window_months: window_months.max(1),
        }
    }

    /// The search phrase, also used for the per-article occurrence count.
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Requested category display names, in the order given.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Rolling window in months; 1 means "the current month only".
    pub fn window_months(&self) -> u32 {
        self.window_months
    }
}

/// Category display name (as the site shows it) to opaque filter value.
pub type CategoryCatalog = HashMap<String, String>;

/// Requested categories resolved against a [`CategoryCatalog`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySelection {
    /// Filter values to toggle, in request order.
    pub resolved_values: Vec<String>,
    /// True iff at least one requested name resolved.
    pub matched: bool,
    /// Requested names (normalized) with no catalog entry.
    pub unmatched: Vec<String>,
}

impl CategorySelection {
    /// A selection that applies no category filter.
    pub fn none() -> Self {
        Self::default()
    }
}

/// A structured article extracted from one result item.
///
/// The serialized form is what the result sink writes to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// The headline, or `"Article without tittle"` when the page has none.
    pub title: String,
    /// Publication time with millisecond precision.
    pub published_at: DateTime<Local>,
    /// The teaser text, or `"Article without description"`.
    pub description: String,
    /// Sanitized accessible label of the media link, used as image file stem.
    pub image_filename: Option<String>,
    /// Case-insensitive occurrences of the search phrase in the item text.
    pub search_count: usize,
    /// Whether the item text mentions a monetary amount.
    pub contains_money: bool,
    /// Source URL of the article picture.
    pub picture_url: Option<String>,
    /// Set when `published_at` is the wall-clock fallback, not a site timestamp.
    #[serde(skip)]
    pub date_is_fallback: bool,
}
