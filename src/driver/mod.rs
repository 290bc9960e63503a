//! The page-automation surface the extraction engine drives.
//!
//! [`PageDriver`] is the only way the engine touches a page. It is passed
//! explicitly to every step and is owned by exactly one
//! [`crate::scrapers::controller::Controller`] for the length of a run.
//!
//! Item handles ([`PageDriver::Item`]) are only valid until the next
//! navigation, refresh, or page change. Nothing in the engine keeps one across
//! a page transition.
//!
//! # Implementations
//!
//! | Driver | Module | Backing |
//! |--------|--------|---------|
//! | Chromium | [`chrome`] | `chromiumoxide` over the DevTools protocol |
//! | HTML fixtures | `fixture` (tests only) | `scraper` documents |

pub mod chrome;
#[cfg(test)]
pub mod fixture;

use crate::error::DriverError;
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// Interval between polls in [`PageDriver::wait_for`].
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A condition [`PageDriver::wait_for`] can wait on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitCondition {
    /// `document.readyState == "complete"`.
    ReadyStateComplete,
    /// At least one element matches the CSS selector.
    Present(String),
}

impl std::fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaitCondition::ReadyStateComplete => write!(f, "document ready state"),
            WaitCondition::Present(selector) => write!(f, "element `{selector}`"),
        }
    }
}

/// Async page-automation capability.
///
/// Implementors provide the primitives; [`wait_for`](PageDriver::wait_for) and
/// [`find`](PageDriver::find) are built on top of them.
pub trait PageDriver {
    /// Handle to one element of the current page.
    type Item;

    /// Navigate to `url` and wait for the navigation to commit.
    async fn open_url(&self, url: &str) -> Result<(), DriverError>;

    /// All elements of the current page matching a CSS selector, in document order.
    async fn find_all(&self, selector: &str) -> Result<Vec<Self::Item>, DriverError>;

    /// First descendant of `scope` matching a CSS selector.
    async fn find_in(
        &self,
        scope: &Self::Item,
        selector: &str,
    ) -> Result<Option<Self::Item>, DriverError>;

    /// Attribute (or scalar DOM property) of an element.
    async fn read_attribute(
        &self,
        item: &Self::Item,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    /// Visible text of an element, including its descendants.
    async fn read_text(&self, item: &Self::Item) -> Result<String, DriverError>;

    /// Click an element. Fails with [`DriverError::NotInteractable`] when the
    /// pointer event would land on something else.
    async fn click(&self, item: &Self::Item) -> Result<(), DriverError>;

    /// Choose the `<option>` whose visible text is `visible_text`.
    async fn select_option(&self, item: &Self::Item, visible_text: &str)
    -> Result<(), DriverError>;

    /// Reload the current page.
    async fn refresh(&self) -> Result<(), DriverError>;

    /// Current `document.readyState`.
    async fn current_ready_state(&self) -> Result<String, DriverError>;

    /// Tear the page surface down.
    async fn shutdown(self) -> Result<(), DriverError>
    where
        Self: Sized;

    /// First element of the current page matching a CSS selector.
    async fn find(&self, selector: &str) -> Result<Option<Self::Item>, DriverError> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }

    /// Poll until `condition` holds, failing with [`DriverError::Timeout`]
    /// after `limit`. Driver errors while polling count as "not yet".
    async fn wait_for(&self, condition: &WaitCondition, limit: Duration) -> Result<(), DriverError> {
        let poll = async {
            loop {
                let satisfied = match condition {
                    WaitCondition::ReadyStateComplete => self
                        .current_ready_state()
                        .await
                        .map(|state| state == "complete")
                        .unwrap_or(false),
                    WaitCondition::Present(selector) => self
                        .find_all(selector)
                        .await
                        .map(|found| !found.is_empty())
                        .unwrap_or(false),
                };
                if satisfied {
                    return;
                }
                sleep(POLL_INTERVAL).await;
            }
        };

        timeout(limit, poll).await.map_err(|_| DriverError::Timeout {
            waited: limit,
            condition: condition.to_string(),
        })
    }
}

/// Interpret an attribute/property read of a checkbox's `checked` state.
///
/// Present-but-empty (`checked=""`) and any value other than `"false"` mean
/// checked.
pub fn is_checked(value: Option<&str>) -> bool {
    matches!(value, Some(v) if v != "false")
}
