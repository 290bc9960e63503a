//! CSS selectors and fixed strings for the AP News search page.

/// Container the result items live in; its presence means results loaded.
pub const SEARCH_RESULTS: &str = ".SearchResultsModule-results";
/// Candidate result items; filtered further by [`PROMO`] / [`PROMO_TRENDING`].
pub const RESULT_ITEMS: &str = ".SearchResultsModule-results .PageList-items-item";
pub const PROMO: &str = ".PagePromo";
pub const PROMO_TRENDING: &str = ".PagePromoTrending";

pub const PROMO_TITLE: &str = ".PagePromo-title";
pub const PROMO_DESCRIPTION: &str = ".PagePromo-description";
pub const PROMO_MEDIA: &str = ".PagePromo-media";
pub const MEDIA_LINK: &str = "a";
pub const MEDIA_IMAGE: &str = "picture .Image";
pub const TIMESTAMP: &str = "bsp-timestamp";

pub const ATTR_TIMESTAMP: &str = "data-timestamp";
pub const ATTR_ARIA_LABEL: &str = "aria-label";
pub const ATTR_SRC: &str = "src";
pub const ATTR_VALUE: &str = "value";
pub const ATTR_CHECKED: &str = "checked";

pub const SORT_SELECT: &str = "select.Select-input";
pub const SORT_NEWEST: &str = "Newest";

pub const FILTER_TOGGLE: &str = ".SearchFilter-heading";
pub const FILTER_SEE_ALL: &str = "button.SearchFilter-seeAll-button";
pub const FILTER_ITEMS: &str = ".SearchFilter-items-item";
pub const FILTER_ITEM_LABEL: &str = ".CheckboxInput-label span";
pub const FILTER_ITEM_INPUT: &str = "input";

pub const NEXT_PAGE_LINK: &str = ".Pagination-nextPage a";

pub const OVERLAY: &str = ".fancybox-overlay";
pub const OVERLAY_CLOSE: &str = ".fancybox-close";
pub const COOKIE_BANNER: &str = "#onetrust-consent-sdk";
pub const COOKIE_ACCEPT: &str = "#onetrust-accept-btn-handler";

pub const ERROR_CODE: &str = "#error-information-popup-container .error-code";
pub const HTTP_404: &str = "HTTP ERROR 404";

/// Selector for the category checkbox carrying `value`.
pub fn category_checkbox(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!(r#"input[type="checkbox"][value="{escaped}"]"#)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_checkbox_selector() {
        assert_eq!(
            category_checkbox("00000188-stories"),
            r#"input[type="checkbox"][value="00000188-stories"]"#
        );
        assert_eq!(
            category_checkbox(r#"a"b"#),
            r#"input[type="checkbox"][value="a\"b"]"#
        );
    }
}
