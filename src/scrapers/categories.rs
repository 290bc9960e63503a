//! Category filters: reading the site's catalog, resolving the caller's
//! category names against it, and ticking the matching checkboxes.

use super::locators;
use super::obstruction::with_obstruction_retry;
use crate::config::{CatalogMatch, Settings};
use crate::driver::{PageDriver, WaitCondition, is_checked};
use crate::error::{DriverError, ScrapeError};
use crate::models::{CategoryCatalog, CategorySelection};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Resolve requested category names to filter values.
///
/// Requested names are uppercased before lookup. With [`CatalogMatch::Exact`]
/// catalog keys are used as the site exposes them; with
/// [`CatalogMatch::Uppercase`] they are uppercased too. Names without an entry
/// are collected in `unmatched`. No resolved name means no filter.
///
/// Pure: the same inputs always give the same selection.
pub fn reconcile(
    catalog: &CategoryCatalog,
    requested: &[String],
    mode: CatalogMatch,
) -> CategorySelection {
    let lookup = |name: &str| -> Option<&String> {
        match mode {
            CatalogMatch::Exact => catalog.get(name),
            CatalogMatch::Uppercase => catalog
                .iter()
                .find(|(key, _)| key.to_uppercase() == name)
                .map(|(_, value)| value),
        }
    };

    let mut selection = CategorySelection::none();
    for name in requested {
        let normalized = name.trim().to_uppercase();
        if normalized.is_empty() {
            continue;
        }
        match lookup(&normalized) {
            Some(value) => selection.resolved_values.push(value.clone()),
            None => selection.unmatched.push(normalized),
        }
    }
    selection.matched = !selection.resolved_values.is_empty();
    selection
}

/// Open the filter panel: click the heading, then "see all" when present.
#[instrument(level = "info", skip_all)]
pub async fn open_panel<D: PageDriver>(driver: &D) -> Result<(), ScrapeError> {
    with_obstruction_retry(driver, "open category panel", || async {
        let toggle = driver
            .find(locators::FILTER_TOGGLE)
            .await?
            .ok_or_else(|| DriverError::NotFound(locators::FILTER_TOGGLE.into()))?;
        driver.click(&toggle).await?;
        match driver.find(locators::FILTER_SEE_ALL).await? {
            Some(see_all) => driver.click(&see_all).await?,
            None => debug!("No 'see all' button in filter panel"),
        }
        Ok::<(), DriverError>(())
    })
    .await?;
    info!("Successfully opened the categories panel");
    Ok(())
}

/// Read the catalog of category filters from the open panel.
#[instrument(level = "info", skip_all)]
pub async fn read_catalog<D: PageDriver>(driver: &D) -> Result<CategoryCatalog, ScrapeError> {
    let catalog = with_obstruction_retry(driver, "extract categories", || async {
        let mut catalog = CategoryCatalog::new();
        for item in driver.find_all(locators::FILTER_ITEMS).await? {
            let Some(label) = driver.find_in(&item, locators::FILTER_ITEM_LABEL).await? else {
                continue;
            };
            let Some(input) = driver.find_in(&item, locators::FILTER_ITEM_INPUT).await? else {
                continue;
            };
            let name = driver.read_text(&label).await?.trim().to_string();
            if let Some(value) = driver.read_attribute(&input, locators::ATTR_VALUE).await? {
                catalog.insert(name, value);
            }
        }
        Ok::<_, DriverError>(catalog)
    })
    .await?;

    if catalog.is_empty() {
        warn!("Not found categories in site");
    } else {
        info!(count = catalog.len(), categories = ?catalog.keys().collect::<Vec<_>>(), "Extracted categories");
    }
    Ok(catalog)
}

/// Tick each resolved filter value, skipping boxes already checked.
///
/// A settling delay precedes every toggle. A box that cannot be found or
/// clicked is logged and skipped; the others are still applied. Returns how
/// many boxes ended up toggled.
#[instrument(level = "info", skip_all, fields(count = values.len()))]
pub async fn toggle_checkboxes<D: PageDriver>(
    driver: &D,
    values: &[String],
    settings: &Settings,
) -> usize {
    let mut toggled = 0;
    for value in values {
        sleep(settings.delays.toggle_settle()).await;
        let selector = locators::category_checkbox(value);

        if let Err(e) = driver
            .wait_for(
                &WaitCondition::Present(selector.clone()),
                settings.timeouts.checkbox(),
            )
            .await
        {
            warn!(%value, error = %e, "Checkbox for category not found");
            continue;
        }

        let outcome = with_obstruction_retry(driver, "toggle category", || async {
            let checkbox = driver
                .find(&selector)
                .await?
                .ok_or_else(|| DriverError::NotFound(selector.clone()))?;
            let state = driver.read_attribute(&checkbox, locators::ATTR_CHECKED).await?;
            if is_checked(state.as_deref()) {
                return Ok(false);
            }
            driver.click(&checkbox).await?;
            Ok::<bool, DriverError>(true)
        })
        .await;

        match outcome {
            Ok(true) => {
                toggled += 1;
                info!(%value, "Successfully clicked the checkbox");
            }
            Ok(false) => warn!(%value, "Checkbox is already selected"),
            Err(e) => warn!(%value, error = %e, "Failed to toggle category checkbox"),
        }
    }
    toggled
}
