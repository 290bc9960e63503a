//! Offline [`PageDriver`] over static HTML documents, for tests.
//!
//! Each "page" is a parsed `scraper` document shaped like the site's search
//! results. The driver simulates just enough behaviour to exercise the engine:
//!
//! - clicking `.Pagination-nextPage a` moves to the next document (or to a
//!   browser 404 page when the link carries `data-fixture-target="404"` or no
//!   document is left);
//! - a visible `.fancybox-overlay` or `#onetrust-consent-sdk` intercepts every
//!   click outside itself until its close/accept control is clicked (close
//!   controls are always clickable);
//! - an element marked `data-fixture-stuck` is never interactable;
//! - a driver with no pages fails to open any URL;
//! - checkbox clicks flip the `checked` state reported by `read_attribute`.
//!
//! Every interaction is recorded in [`FixtureDriver::actions`].

use super::PageDriver;
use crate::error::DriverError;
use chrono::{DateTime, Local};
use scraper::{ElementRef, Html, Selector};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;

const NOT_FOUND_PAGE: &str = r#"<html><body>
<div id="error-information-popup-container"><div class="error-code">HTTP ERROR 404</div></div>
</body></html>"#;

/// Something the engine did to the fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureAction {
    Open(String),
    Click(String),
    Select(String),
    Refresh,
}

/// Handle to one element of one fixture page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureItem {
    page: usize,
    /// Position in the document's node order.
    node: usize,
}

pub struct FixtureDriver {
    pages: Vec<Html>,
    not_found: Html,
    current: Cell<usize>,
    detached: RefCell<HashSet<(usize, usize)>>,
    toggled: RefCell<HashSet<(usize, usize)>>,
    actions: RefCell<Vec<FixtureAction>>,
}

impl FixtureDriver {
    pub fn new(pages: Vec<String>) -> Self {
        Self {
            pages: pages.iter().map(|p| Html::parse_document(p)).collect(),
            not_found: Html::parse_document(NOT_FOUND_PAGE),
            current: Cell::new(0),
            detached: RefCell::new(HashSet::new()),
            toggled: RefCell::new(HashSet::new()),
            actions: RefCell::new(Vec::new()),
        }
    }

    pub fn actions(&self) -> Vec<FixtureAction> {
        self.actions.borrow().clone()
    }

    /// Values of the checkboxes clicked, in click order.
    pub fn toggled_values(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                FixtureAction::Click(what) => what.strip_prefix("checkbox:").map(str::to_string),
                _ => None,
            })
            .collect()
    }

    pub fn current_page(&self) -> usize {
        self.current.get()
    }

    fn doc(&self, page: usize) -> &Html {
        self.pages.get(page).unwrap_or(&self.not_found)
    }

    fn element(&self, item: &FixtureItem) -> Result<ElementRef<'_>, DriverError> {
        if item.page != self.current.get() {
            return Err(DriverError::Browser("stale element reference".into()));
        }
        self.doc(item.page)
            .tree
            .root()
            .descendants()
            .nth(item.node)
            .and_then(ElementRef::wrap)
            .ok_or_else(|| DriverError::Browser("stale element reference".into()))
    }

    fn index_of(&self, page: usize, el: &ElementRef<'_>) -> usize {
        self.doc(page)
            .tree
            .root()
            .descendants()
            .position(|n| n.id() == el.id())
            .unwrap_or(usize::MAX)
    }

    fn is_visible(&self, page: usize, el: &ElementRef<'_>) -> bool {
        let detached = self.detached.borrow();
        if detached.is_empty() {
            return true;
        }
        if detached.contains(&(page, self.index_of(page, el))) {
            return false;
        }
        !el.ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| detached.contains(&(page, self.index_of(page, &a))))
    }

    fn has_class(el: &ElementRef<'_>, class: &str) -> bool {
        el.value().classes().any(|c| c == class)
    }

    fn is_overlay(el: &ElementRef<'_>) -> bool {
        Self::has_class(el, "fancybox-overlay") || el.value().id() == Some("onetrust-consent-sdk")
    }

    fn self_or_ancestor<'a>(
        el: &ElementRef<'a>,
        pred: impl Fn(&ElementRef<'a>) -> bool,
    ) -> Option<ElementRef<'a>> {
        if pred(el) {
            return Some(*el);
        }
        el.ancestors().filter_map(ElementRef::wrap).find(|a| pred(a))
    }

    fn visible_overlays(&self, page: usize) -> Vec<usize> {
        self.doc(page)
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| Self::is_overlay(el) && self.is_visible(page, el))
            .map(|el| self.index_of(page, &el))
            .collect()
    }

    fn record(&self, action: FixtureAction) {
        self.actions.borrow_mut().push(action);
    }
}

fn parse_selector(selector: &str) -> Result<Selector, DriverError> {
    Selector::parse(selector).map_err(|e| DriverError::Script(format!("bad selector: {e:?}")))
}

fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl PageDriver for FixtureDriver {
    type Item = FixtureItem;

    async fn open_url(&self, url: &str) -> Result<(), DriverError> {
        self.record(FixtureAction::Open(url.to_string()));
        if self.pages.is_empty() {
            return Err(DriverError::Browser("net::ERR_NAME_NOT_RESOLVED".into()));
        }
        self.current.set(0);
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<FixtureItem>, DriverError> {
        let selector = parse_selector(selector)?;
        let page = self.current.get();
        Ok(self
            .doc(page)
            .select(&selector)
            .filter(|el| self.is_visible(page, el))
            .map(|el| FixtureItem {
                page,
                node: self.index_of(page, &el),
            })
            .collect())
    }

    async fn find_in(
        &self,
        scope: &FixtureItem,
        selector: &str,
    ) -> Result<Option<FixtureItem>, DriverError> {
        let selector = parse_selector(selector)?;
        let el = self.element(scope)?;
        Ok(el
            .select(&selector)
            .find(|found| self.is_visible(scope.page, found))
            .map(|found| FixtureItem {
                page: scope.page,
                node: self.index_of(scope.page, &found),
            }))
    }

    async fn read_attribute(
        &self,
        item: &FixtureItem,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let el = self.element(item)?;
        if name == "checked" {
            let initially = el.value().attr("checked").is_some();
            let flipped = self.toggled.borrow().contains(&(item.page, item.node));
            return Ok(Some((initially != flipped).to_string()));
        }
        Ok(el.value().attr(name).map(str::to_string))
    }

    async fn read_text(&self, item: &FixtureItem) -> Result<String, DriverError> {
        Ok(element_text(&self.element(item)?))
    }

    async fn click(&self, item: &FixtureItem) -> Result<(), DriverError> {
        let page = item.page;
        let el = self.element(item)?;
        if !self.is_visible(page, &el) {
            return Err(DriverError::NotInteractable("element is not displayed".into()));
        }
        if Self::self_or_ancestor(&el, |e| e.value().attr("data-fixture-stuck").is_some()).is_some()
        {
            return Err(DriverError::NotInteractable("element has no hit area".into()));
        }

        // Dismiss controls sit on top of their overlay and are always reachable.
        let inside_overlay = Self::self_or_ancestor(&el, Self::is_overlay);
        let is_dismiss = Self::has_class(&el, "fancybox-close")
            || el.value().id() == Some("onetrust-accept-btn-handler");
        if is_dismiss {
            let target = inside_overlay.unwrap_or(el);
            let target = self.index_of(page, &target);
            self.detached.borrow_mut().insert((page, target));
            self.record(FixtureAction::Click("dismiss".into()));
            return Ok(());
        }

        let own_overlay = inside_overlay.map(|o| self.index_of(page, &o));
        let covering = self
            .visible_overlays(page)
            .into_iter()
            .any(|overlay| own_overlay != Some(overlay));
        if covering {
            return Err(DriverError::NotInteractable(
                "click intercepted by overlay".into(),
            ));
        }

        let in_pagination = Self::self_or_ancestor(&el, |e| {
            Self::has_class(e, "Pagination-nextPage")
        })
        .is_some();
        if in_pagination && el.value().name() == "a" {
            let next = match el.value().attr("data-fixture-target") {
                Some("404") => self.pages.len(),
                _ => page + 1,
            };
            self.current.set(next);
            self.record(FixtureAction::Click("next".into()));
            return Ok(());
        }

        if el.value().name() == "input" && el.value().attr("type") == Some("checkbox") {
            let key = (page, item.node);
            let mut toggled = self.toggled.borrow_mut();
            if !toggled.remove(&key) {
                toggled.insert(key);
            }
            let value = el.value().attr("value").unwrap_or_default();
            self.record(FixtureAction::Click(format!("checkbox:{value}")));
            return Ok(());
        }

        let label = el
            .value()
            .attr("class")
            .unwrap_or(el.value().name())
            .to_string();
        self.record(FixtureAction::Click(label));
        Ok(())
    }

    async fn select_option(&self, item: &FixtureItem, visible_text: &str) -> Result<(), DriverError> {
        let el = self.element(item)?;
        let option = parse_selector("option")?;
        if el.value().name() != "select"
            || !el.select(&option).any(|o| element_text(&o) == visible_text)
        {
            return Err(DriverError::NotFound(format!("option `{visible_text}`")));
        }
        self.record(FixtureAction::Select(visible_text.to_string()));
        Ok(())
    }

    async fn refresh(&self) -> Result<(), DriverError> {
        self.record(FixtureAction::Refresh);
        Ok(())
    }

    async fn current_ready_state(&self) -> Result<String, DriverError> {
        Ok("complete".to_string())
    }

    async fn shutdown(self) -> Result<(), DriverError> {
        Ok(())
    }
}

/// One result item of a fixture page.
#[derive(Debug, Clone, Default)]
pub struct Promo {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Raw `data-timestamp` value.
    pub timestamp: Option<String>,
    /// `(aria-label, img src)` of the media block.
    pub media: Option<(String, Option<String>)>,
    pub body: String,
    pub trending: bool,
}

impl Promo {
    /// A complete promo published at `published`.
    pub fn at(title: &str, published: DateTime<Local>) -> Self {
        Self {
            title: Some(title.to_string()),
            description: Some(format!("About {title}.")),
            timestamp: Some(published.timestamp_millis().to_string()),
            media: Some((
                format!("{title} photo"),
                Some(format!("https://img.example.com/{}.jpg", published.timestamp())),
            )),
            ..Self::default()
        }
    }

    pub fn html(&self) -> String {
        let media = match &self.media {
            Some((label, src)) => {
                let img = src
                    .as_ref()
                    .map(|s| format!(r#"<picture><img class="Image" src="{s}"></picture>"#))
                    .unwrap_or_default();
                format!(
                    r#"<div class="PagePromo-media"><a href="/article" aria-label="{label}">{img}</a></div>"#
                )
            }
            None => String::new(),
        };
        let title = self
            .title
            .as_ref()
            .map(|t| format!(r#"<h3 class="PagePromo-title"><a><span>{t}</span></a></h3>"#))
            .unwrap_or_default();
        let description = self
            .description
            .as_ref()
            .map(|d| format!(r#"<div class="PagePromo-description">{d}</div>"#))
            .unwrap_or_default();
        let timestamp = self
            .timestamp
            .as_ref()
            .map(|t| format!(r#"<bsp-timestamp data-timestamp="{t}"></bsp-timestamp>"#))
            .unwrap_or_default();
        let class = if self.trending {
            "PagePromo PagePromoTrending"
        } else {
            "PagePromo"
        };
        format!(
            r#"<div class="PageList-items-item"><div class="{class}">{media}<div class="PagePromo-content">{title}{description}<p>{body}</p>{timestamp}</div></div></div>"#,
            body = self.body
        )
    }
}

/// How a fixture page ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextLink {
    None,
    Next,
    NotFound,
    /// A next link that never accepts a click.
    Stuck,
}

/// Extra markup injected at the top of a fixture page.
pub const PROMO_OVERLAY: &str =
    r#"<div class="fancybox-overlay"><a class="fancybox-close">Close</a></div>"#;
pub const COOKIE_BANNER: &str = r#"<div id="onetrust-consent-sdk"><button id="onetrust-accept-btn-handler">Accept</button></div>"#;

/// A search results page with the filter panel, the sort control, `promos`,
/// and pagination.
pub fn results_page(promos: &[Promo], next: NextLink, extra: &str) -> String {
    let items: String = promos.iter().map(Promo::html).collect();
    let pagination = match next {
        NextLink::None => String::new(),
        NextLink::Next => {
            r#"<div class="Pagination-nextPage"><a href="?p=next">Next</a></div>"#.to_string()
        }
        NextLink::NotFound => {
            r#"<div class="Pagination-nextPage"><a href="?p=next" data-fixture-target="404">Next</a></div>"#
                .to_string()
        }
        NextLink::Stuck => {
            r#"<div class="Pagination-nextPage"><a href="?p=next" data-fixture-stuck>Next</a></div>"#
                .to_string()
        }
    };
    format!(
        r#"<html><body>{extra}
<div class="SearchFilter"><div class="SearchFilter-heading">Filter</div>
<button class="SearchFilter-seeAll-button">See All</button>
<ul class="SearchFilter-items">
<li class="SearchFilter-items-item"><label class="CheckboxInput-label"><input type="checkbox" value="00000188-stories"><span>STORIES</span></label></li>
<li class="SearchFilter-items-item"><label class="CheckboxInput-label"><input type="checkbox" value="00000188-sections"><span>SECTIONS</span></label></li>
<li class="SearchFilter-items-item"><label class="CheckboxInput-label"><input type="checkbox" value="00000188-videos"><span>Videos</span></label></li>
</ul></div>
<select class="Select-input"><option>Relevance</option><option>Newest</option><option>Oldest</option></select>
<div class="SearchResultsModule-results"><div class="PageList-items">{items}</div></div>
{pagination}
</body></html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn page_with(extra: &str) -> FixtureDriver {
        let promo = Promo::at("Budget vote", Local.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap());
        FixtureDriver::new(vec![results_page(&[promo], NextLink::Next, extra)])
    }

    #[tokio::test]
    async fn test_overlay_intercepts_until_closed() {
        let driver = page_with(PROMO_OVERLAY);
        let heading = driver.find(".SearchFilter-heading").await.unwrap().unwrap();
        assert!(matches!(
            driver.click(&heading).await,
            Err(DriverError::NotInteractable(_))
        ));

        let close = driver.find(".fancybox-close").await.unwrap().unwrap();
        driver.click(&close).await.unwrap();
        assert!(driver.find(".fancybox-overlay").await.unwrap().is_none());
        driver.click(&heading).await.unwrap();
    }

    #[tokio::test]
    async fn test_next_link_past_last_page_shows_404() {
        let driver = page_with("");
        let next = driver.find(".Pagination-nextPage a").await.unwrap().unwrap();
        driver.click(&next).await.unwrap();
        assert_eq!(driver.current_page(), 1);
        let code = driver
            .find("#error-information-popup-container .error-code")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(driver.read_text(&code).await.unwrap(), "HTTP ERROR 404");
    }

    #[tokio::test]
    async fn test_items_go_stale_after_navigation() {
        let driver = page_with("");
        let title = driver.find(".PagePromo-title").await.unwrap().unwrap();
        let next = driver.find(".Pagination-nextPage a").await.unwrap().unwrap();
        driver.click(&next).await.unwrap();
        assert!(driver.read_text(&title).await.is_err());
    }

    #[tokio::test]
    async fn test_checkbox_toggle_is_reported() {
        let driver = page_with("");
        let checkbox = driver
            .find(r#"input[type="checkbox"][value="00000188-stories"]"#)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            driver.read_attribute(&checkbox, "checked").await.unwrap().as_deref(),
            Some("false")
        );
        driver.click(&checkbox).await.unwrap();
        assert_eq!(
            driver.read_attribute(&checkbox, "checked").await.unwrap().as_deref(),
            Some("true")
        );
        assert_eq!(driver.toggled_values(), vec!["00000188-stories"]);
    }
}
