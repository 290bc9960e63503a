//! Error taxonomy for the extraction engine.
//!
//! Two layers:
//! - [`DriverError`]: what the page-automation surface reports (a click that
//!   was intercepted, a selector that matched nothing, a wait that ran out).
//! - [`ScrapeError`]: what the extraction run reports to its caller. Only
//!   [`ScrapeError::SortFailure`] and [`ScrapeError::NoArticlesFound`] abort a
//!   run; everything else is absorbed into partial results by the controller.
//!
//! [`FetchError`] covers picture downloads, outside the run.

use std::time::Duration;
use thiserror::Error;

/// Failures raised by a [`crate::driver::PageDriver`] implementation.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The element exists but another element (usually an overlay) receives
    /// the pointer event, or the element has no visible box.
    #[error("element not interactable: {0}")]
    NotInteractable(String),

    #[error("element not found: {0}")]
    NotFound(String),

    #[error("timed out after {waited:?} waiting for {condition}")]
    Timeout { waited: Duration, condition: String },

    #[error("script evaluation failed: {0}")]
    Script(String),

    #[error("browser error: {0}")]
    Browser(String),
}

/// Failures surfaced by an extraction run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Sorting by newest is a precondition for boundary detection.
    #[error("could not sort results by newest: {0}")]
    SortFailure(#[source] DriverError),

    #[error("no articles found on the results page")]
    NoArticlesFound,

    /// An interaction stayed blocked after the overlay path was exhausted.
    #[error("action `{action}` obstructed: {source}")]
    Obstructed {
        action: String,
        #[source]
        source: DriverError,
    },

    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Failures of a picture download.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

impl FetchError {
    /// Whether another attempt could succeed: connection trouble, timeouts,
    /// `429` and `5xx` answers. Other `4xx` answers are final.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            FetchError::Request(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
        }
    }
}

impl ScrapeError {
    /// Whether this error aborts the whole run instead of degrading it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScrapeError::SortFailure(_) | ScrapeError::NoArticlesFound)
    }
}
