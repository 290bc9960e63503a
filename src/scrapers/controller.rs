//! The extraction run: sort, filter, then walk result pages newest-first
//! until the date window is left.
//!
//! ```text
//! open search ─▶ sort by newest ─▶ wait ready ─▶ [apply categories]
//!                                                      │
//!            ┌──────────────── next page ◀── in window │
//!            ▼                                    ▲    ▼
//!        fetch page ─▶ check last item ───────────┘
//!                              │ out of window
//!                              ▼
//!                      trim page, stop
//! ```
//!
//! Only [`ScrapeError::SortFailure`] and [`ScrapeError::NoArticlesFound`]
//! abort a run. Anything else that goes wrong while paging is logged and the
//! records gathered so far are returned.

use super::boundary::{cutoff_for, in_window, in_window_prefix};
use super::categories::{open_panel, read_catalog, reconcile, toggle_checkboxes};
use super::extract::{extract_record, published_at};
use super::locators;
use super::obstruction::{dismiss_overlays, with_obstruction_retry};
use crate::config::{MissingDatePolicy, Settings};
use crate::driver::{PageDriver, WaitCondition};
use crate::error::{DriverError, ScrapeError};
use crate::models::{ArticleRecord, SearchParams};
use crate::utils::search_url;
use chrono::{DateTime, Local};
use itertools::Itertools;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Drives one extraction run over an exclusively owned [`PageDriver`].
pub struct Controller<D: PageDriver> {
    driver: D,
    settings: Settings,
}

impl<D: PageDriver> Controller<D> {
    pub fn new(driver: D, settings: Settings) -> Self {
        Self { driver, settings }
    }

    #[cfg(test)]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Give the driver back, e.g. to shut it down.
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Extract every article of the search published within the last
    /// `window_months` calendar months, newest first.
    pub async fn run(&self, params: &SearchParams) -> Result<Vec<ArticleRecord>, ScrapeError> {
        let cutoff = cutoff_for(Local::now(), params.window_months());
        self.run_with_cutoff(params, cutoff).await
    }

    /// [`run`](Self::run) against an explicit cutoff.
    #[instrument(level = "info", skip_all, fields(phrase = %params.phrase(), cutoff = %cutoff.format("%Y-%m")))]
    pub async fn run_with_cutoff(
        &self,
        params: &SearchParams,
        cutoff: DateTime<Local>,
    ) -> Result<Vec<ArticleRecord>, ScrapeError> {
        self.open_search(params).await?;
        self.sort_by_newest().await?;

        if let Err(e) = self
            .driver
            .wait_for(
                &WaitCondition::ReadyStateComplete,
                self.settings.timeouts.ready_state(),
            )
            .await
        {
            warn!(error = %e, "Page did not report ready; continuing");
        }

        if !params.categories().is_empty() {
            if let Err(e) = self.apply_categories(params).await {
                warn!(error = %e, "Could not apply category filter; continuing without it");
            }
        }

        let mut records = Vec::new();
        match self.paginate(params, &cutoff, &mut records).await {
            Ok(()) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => error!(
                error = %e,
                collected = records.len(),
                "Extraction interrupted; returning partial results"
            ),
        }

        if self.settings.missing_date == MissingDatePolicy::Drop {
            let before = records.len();
            records.retain(|r| !r.date_is_fallback);
            if records.len() < before {
                info!(dropped = before - records.len(), "Dropped articles without a date");
            }
        }

        info!(count = records.len(), "Extraction finished");
        Ok(records)
    }

    /// Load the search page. Without it there is nothing to sort, so a
    /// failure here is a [`ScrapeError::SortFailure`].
    async fn open_search(&self, params: &SearchParams) -> Result<(), ScrapeError> {
        let opened = async {
            let url = search_url(&self.settings.site_url, params.phrase())
                .map_err(|e| DriverError::Browser(format!("invalid site url: {e}")))?;
            info!(%url, "Opening search page");
            self.driver.open_url(&url).await
        };
        opened.await.map_err(|e| {
            error!(error = %e, "Could not open the search page");
            ScrapeError::SortFailure(e)
        })
    }

    /// Select "Newest" in the sort control and reload.
    #[instrument(level = "info", skip_all)]
    async fn sort_by_newest(&self) -> Result<(), ScrapeError> {
        let select = async {
            let control = self
                .driver
                .find(locators::SORT_SELECT)
                .await?
                .ok_or_else(|| DriverError::NotFound(locators::SORT_SELECT.into()))?;
            self.driver
                .select_option(&control, locators::SORT_NEWEST)
                .await?;
            self.driver.refresh().await
        };
        if let Err(e) = select.await {
            error!(error = %e, "Could not sort results by newest");
            return Err(ScrapeError::SortFailure(e));
        }

        match self
            .driver
            .wait_for(
                &WaitCondition::Present(locators::SEARCH_RESULTS.into()),
                self.settings.timeouts.sort_refresh(),
            )
            .await
        {
            Ok(()) => info!("Page result sorted"),
            Err(e) => warn!(error = %e, "Results did not reappear after sorting"),
        }
        Ok(())
    }

    /// Open the filter panel, resolve the requested categories, tick them,
    /// and reload.
    #[instrument(level = "info", skip_all, fields(requested = params.categories().len()))]
    async fn apply_categories(&self, params: &SearchParams) -> Result<(), ScrapeError> {
        if let Err(e) = dismiss_overlays(&self.driver).await {
            debug!(error = %e, "Overlay check failed before opening categories");
        }
        open_panel(&self.driver).await?;
        let catalog = read_catalog(&self.driver).await?;

        let selection = reconcile(&catalog, params.categories(), self.settings.catalog_match);
        if !selection.unmatched.is_empty() {
            warn!(
                unmatched = %selection.unmatched.iter().join(", "),
                "Categories not found in site"
            );
        }
        if !selection.matched {
            warn!("No requested category matched; searching all categories");
            return Ok(());
        }

        let toggled =
            toggle_checkboxes(&self.driver, &selection.resolved_values, &self.settings).await;

        self.driver.refresh().await?;
        if let Err(e) = self
            .driver
            .wait_for(
                &WaitCondition::Present(locators::SEARCH_RESULTS.into()),
                self.settings.timeouts.categories_refresh(),
            )
            .await
        {
            warn!(error = %e, "Results did not reappear after filtering");
        }
        info!(
            toggled,
            resolved = selection.resolved_values.len(),
            "Applied category filter"
        );
        Ok(())
    }

    /// Walk pages until one leaves the window or there is no next page.
    async fn paginate(
        &self,
        params: &SearchParams,
        cutoff: &DateTime<Local>,
        records: &mut Vec<ArticleRecord>,
    ) -> Result<(), ScrapeError> {
        let mut page = 1usize;
        loop {
            let items = self.fetch_page(page).await?;
            let Some(last) = items.last() else {
                info!(page, "Empty results page; end of results");
                return Ok(());
            };

            let last_date = published_at(&self.driver, last)
                .await
                .unwrap_or_else(Local::now);
            if !in_window(&last_date, cutoff) {
                let keep = self.in_window_count(&items, cutoff).await;
                self.extract_into(&items[..keep], params.phrase(), records)
                    .await;
                info!(
                    page,
                    kept = keep,
                    total = items.len(),
                    collected = records.len(),
                    "Reached the end of the date window"
                );
                return Ok(());
            }

            self.extract_into(&items, params.phrase(), records).await;
            info!(page, items = items.len(), collected = records.len(), "Extracted page");

            if !self.next_page().await? {
                return Ok(());
            }
            page += 1;
        }
    }

    /// Result items of the current page: promos inside the results module
    /// that are not trending promos.
    #[instrument(level = "info", skip(self))]
    async fn fetch_page(&self, page: usize) -> Result<Vec<D::Item>, ScrapeError> {
        if let Err(e) = self
            .driver
            .wait_for(
                &WaitCondition::Present(locators::RESULT_ITEMS.into()),
                self.settings.timeouts.results(),
            )
            .await
        {
            debug!(error = %e, "No result items appeared");
        }

        let mut articles = Vec::new();
        for item in self.driver.find_all(locators::RESULT_ITEMS).await? {
            let is_promo = self.driver.find_in(&item, locators::PROMO).await?.is_some();
            let is_trending = self
                .driver
                .find_in(&item, locators::PROMO_TRENDING)
                .await?
                .is_some();
            if is_promo && !is_trending {
                articles.push(item);
            }
        }

        if articles.is_empty() && page == 1 {
            error!("No articles were found: stopping");
            return Err(ScrapeError::NoArticlesFound);
        }
        debug!(count = articles.len(), "Fetched result items");
        Ok(articles)
    }

    /// Length of the in-window prefix of a page whose last item is out of it.
    async fn in_window_count(&self, items: &[D::Item], cutoff: &DateTime<Local>) -> usize {
        let mut dates = Vec::with_capacity(items.len());
        for item in items {
            dates.push(
                published_at(&self.driver, item)
                    .await
                    .unwrap_or_else(Local::now),
            );
        }
        in_window_prefix(&dates, cutoff)
    }

    async fn extract_into(&self, items: &[D::Item], phrase: &str, records: &mut Vec<ArticleRecord>) {
        for item in items {
            records.push(extract_record(&self.driver, item, phrase).await);
        }
    }

    /// Click through to the next results page.
    ///
    /// Returns `false` at the end of results: no next link, a browser 404
    /// page, or a page that never finishes loading.
    #[instrument(level = "info", skip_all)]
    async fn next_page(&self) -> Result<bool, ScrapeError> {
        info!("Going to the next page");
        if let Err(e) = dismiss_overlays(&self.driver).await {
            debug!(error = %e, "Overlay check failed before paging");
        }

        let clicked = with_obstruction_retry(&self.driver, "go to next page", || async {
            match self.driver.find(locators::NEXT_PAGE_LINK).await? {
                Some(link) => {
                    self.driver.click(&link).await?;
                    Ok::<bool, DriverError>(true)
                }
                None => Ok(false),
            }
        })
        .await?;
        if !clicked {
            info!("No next page; end of results");
            return Ok(false);
        }

        match self
            .driver
            .wait_for(
                &WaitCondition::Present(locators::SEARCH_RESULTS.into()),
                self.settings.timeouts.navigation(),
            )
            .await
        {
            Ok(()) => {}
            Err(e @ DriverError::Timeout { .. }) => {
                if self.is_not_found_page().await {
                    warn!("Error 404 from site; the next page doesn't exist");
                } else {
                    warn!(error = %e, "Next page never loaded; treating as end of results");
                }
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        }

        sleep(self.settings.delays.page_settle()).await;
        info!("Next page has loaded successfully");
        Ok(true)
    }

    async fn is_not_found_page(&self) -> bool {
        let Ok(Some(code)) = self.driver.find(locators::ERROR_CODE).await else {
            return false;
        };
        matches!(self.driver.read_text(&code).await, Ok(text) if text.trim() == locators::HTTP_404)
    }
}
