//! Retrying interactions that a transient overlay intercepts.
//!
//! The site occasionally covers the page with a cookie-consent banner or a
//! promotional overlay. A click that lands on one fails with
//! [`DriverError::NotInteractable`]. [`with_obstruction_retry`] then tries to
//! dismiss a known overlay and, only if one was actually dismissed, runs the
//! action exactly once more.

use super::locators;
use crate::driver::PageDriver;
use crate::error::{DriverError, ScrapeError};
use std::future::Future;
use tracing::{debug, info, instrument, warn};

/// Close any known overlay currently on the page.
///
/// Returns whether something was dismissed. Safe to call repeatedly; with
/// nothing on screen it is a no-op.
#[instrument(level = "debug", skip_all)]
pub async fn dismiss_overlays<D: PageDriver>(driver: &D) -> Result<bool, DriverError> {
    let mut dismissed = false;

    for (overlay, control) in [
        (locators::COOKIE_BANNER, locators::COOKIE_ACCEPT),
        (locators::OVERLAY, locators::OVERLAY_CLOSE),
    ] {
        if driver.find(overlay).await?.is_none() {
            continue;
        }
        info!(overlay, "Overlay detected, attempting to close");
        match driver.find(control).await? {
            Some(button) => {
                driver.click(&button).await?;
                info!(overlay, "Overlay closed successfully");
                dismissed = true;
            }
            None => warn!(overlay, control, "Overlay has no close control"),
        }
    }

    if !dismissed {
        debug!("No overlay present");
    }
    Ok(dismissed)
}

/// Run `action`, dismissing an overlay and retrying once if it is obstructed.
///
/// - success: returned as is;
/// - obstructed, overlay dismissed: one more attempt;
/// - obstructed with no overlay to dismiss, or obstructed again after the
///   retry: [`ScrapeError::Obstructed`];
/// - any other failure: [`ScrapeError::Driver`].
///
/// The overlay may stay dismissed even when the action ultimately fails.
#[instrument(level = "info", skip(driver, action))]
pub async fn with_obstruction_retry<D, T, F, Fut>(
    driver: &D,
    label: &str,
    mut action: F,
) -> Result<T, ScrapeError>
where
    D: PageDriver,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DriverError>>,
{
    let mut attempted_dismissal = false;

    loop {
        let err = match action().await {
            Ok(value) => return Ok(value),
            Err(err @ DriverError::NotInteractable(_)) => err,
            Err(err) => return Err(err.into()),
        };

        if attempted_dismissal {
            warn!(error = %err, "Still obstructed after dismissing overlay");
            return Err(obstructed(label, err));
        }
        attempted_dismissal = true;

        match dismiss_overlays(driver).await {
            Ok(true) => info!("Overlay dismissed; retrying action"),
            Ok(false) => {
                warn!(error = %err, "Action not interactable and no overlay found");
                return Err(obstructed(label, err));
            }
            Err(dismiss_err) => {
                warn!(error = %err, dismiss_error = %dismiss_err, "Overlay dismissal failed");
                return Err(obstructed(label, err));
            }
        }
    }
}

fn obstructed(label: &str, source: DriverError) -> ScrapeError {
    ScrapeError::Obstructed {
        action: label.to_string(),
        source,
    }
}
